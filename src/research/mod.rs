// file: src/research/mod.rs
// description: research agent pipeline exports
// reference: plan -> search -> synthesize

mod agent;
pub mod planner;
mod progress;
pub mod searcher;
pub mod synthesizer;

pub use agent::{ResearchAgent, ResearchRun};
pub use planner::QueryPlanner;
pub use progress::{RunStats, Stage, StageTracker};
pub use searcher::{QueryFailure, QuerySearcher, SearchOutcome};
pub use synthesizer::ReportSynthesizer;

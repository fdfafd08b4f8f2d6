// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod query_plan;
pub mod report;
pub mod search_result;

pub use query_plan::QueryPlan;
pub use report::{Report, Source};
pub use search_result::SearchResult;

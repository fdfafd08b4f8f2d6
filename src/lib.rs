// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod coding;
pub mod config;
pub mod context;
pub mod credentials;
pub mod error;
pub mod exporter;
pub mod gateway;
pub mod models;
pub mod options;
pub mod preflight;
pub mod prompts;
pub mod research;
pub mod search;
pub mod utils;

pub use coding::{CodeExecutor, CodingAgent, CodingOutcome, PythonRunResult, PythonRunner};
pub use config::{Config, SearchFailurePolicy};
pub use context::AppContext;
pub use credentials::{
    ApiKey, CredentialKind, CredentialResolver, CredentialSource, DotenvPrecedence, ProcessEnv,
};
pub use error::{AgentError, Result};
pub use exporter::{ExportFormat, ReportExporter};
pub use gateway::{ChatModel, OpenRouterClient};
pub use models::{QueryPlan, Report, SearchResult};
pub use options::{MarketData, OptionsDesk, YahooClient};
pub use research::{ResearchAgent, ResearchRun};
pub use search::{SearchProvider, TavilyClient};
pub use utils::{HealthCheck, HealthReport, HealthStatus, OperationTimer, Validator};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let config = Config::default_config();
        assert_eq!(config.research.on_search_failure, SearchFailurePolicy::Abort);
        assert_eq!(prompts::TASKS.len(), 3);
    }
}

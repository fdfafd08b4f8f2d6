// file: src/coding/mod.rs
// description: coding agent and its Python execution tool

mod agent;
pub mod extract;
mod policy;
mod runner;

pub use agent::{CodeExecutor, CodingAgent, CodingOutcome};
pub use policy::deny_reason;
pub use runner::{PythonRunResult, PythonRunner, SAFE_NOTE};

// file: src/utils/mod.rs
// description: utility functions module exports
// reference: internal module structure

pub mod logging;
#[cfg(test)]
pub(crate) mod stub_server;
pub mod telemetry;
pub mod validation;

pub use telemetry::{HealthCheck, HealthReport, HealthStatus, OperationTimer};
pub use validation::Validator;

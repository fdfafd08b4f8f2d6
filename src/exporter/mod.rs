// file: src/exporter/mod.rs
// description: exporters for research runs

pub mod report;

pub use report::{ExportFormat, ReportExporter};

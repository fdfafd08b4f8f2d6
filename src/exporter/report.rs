// file: src/exporter/report.rs
// description: writes research runs to JSON or Markdown files

use crate::error::Result;
use crate::research::ResearchRun;
use crate::utils::validation::Validator;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const SLUG_CHARS: usize = 48;
const ID_CHARS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    #[default]
    Markdown,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Markdown => "md",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::Markdown => write!(f, "markdown"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportExporter {
    output_dir: PathBuf,
}

impl ReportExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        Validator::validate_directory(&output_dir)?;
        fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Writes the run and returns the path of the new file.
    pub fn export(&self, run: &ResearchRun, format: ExportFormat) -> Result<PathBuf> {
        let report = &run.report;
        let id = report.id.simple().to_string();
        let file_name = format!(
            "{}-{}-{}.{}",
            Validator::slugify(&report.question, SLUG_CHARS),
            report.generated_at.format("%Y%m%d-%H%M%S"),
            &id[..ID_CHARS],
            format.extension()
        );
        let path = self.output_dir.join(file_name);

        let contents = match format {
            ExportFormat::Json => serde_json::to_string_pretty(run)?,
            ExportFormat::Markdown => report.to_markdown(),
        };
        fs::write(&path, contents)?;

        info!("Exported {} report to {}", format, path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{QueryPlan, Report, SearchResult, Source};
    use crate::research::{RunStats, SearchOutcome};
    use tempfile::tempdir;

    fn sample_run() -> ResearchRun {
        let plan = QueryPlan::new(
            "What is new in Rust 2024?",
            vec!["rust 2024 edition".to_string()],
            3,
        );
        let result = SearchResult::new(
            "rust 2024 edition",
            "Announcing Rust 1.85.0",
            "https://blog.rust-lang.org/2025/02/20/Rust-1.85.0.html",
            "The Rust 2024 edition is now stable.",
            0.93,
        );
        let search = SearchOutcome {
            results: vec![result],
            answers: vec![],
            failures: vec![],
            queries_run: 1,
        };
        let report = Report::new(
            &plan.question,
            plan.queries().to_vec(),
            "## Summary\nThe 2024 edition shipped with Rust 1.85 [1].".to_string(),
            vec![Source {
                index: 1,
                title: "Announcing Rust 1.85.0".to_string(),
                url: "https://blog.rust-lang.org/2025/02/20/Rust-1.85.0.html".to_string(),
            }],
            "test/model",
        );

        ResearchRun {
            plan,
            search,
            report,
            stats: RunStats::new(),
        }
    }

    #[test]
    fn test_exporter_creates_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("reports").join("today");
        let exporter = ReportExporter::new(&nested).unwrap();
        assert!(exporter.output_dir().is_dir());
    }

    #[test]
    fn test_exporter_rejects_file_path() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("taken");
        std::fs::write(&file, "x").unwrap();
        assert!(ReportExporter::new(&file).is_err());
    }

    #[test]
    fn test_export_markdown() {
        let dir = tempdir().unwrap();
        let exporter = ReportExporter::new(dir.path()).unwrap();

        let path = exporter.export(&sample_run(), ExportFormat::Markdown).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("what-is-new-in-rust-2024-"));
        assert!(name.ends_with(".md"));

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("## Sources"));
        assert!(text.contains("https://blog.rust-lang.org/2025/02/20/Rust-1.85.0.html"));
    }

    #[test]
    fn test_same_second_exports_do_not_collide() {
        let dir = tempdir().unwrap();
        let exporter = ReportExporter::new(dir.path()).unwrap();

        let first = sample_run();
        let mut second = sample_run();
        second.report.generated_at = first.report.generated_at;

        let a = exporter.export(&first, ExportFormat::Markdown).unwrap();
        let b = exporter.export(&second, ExportFormat::Markdown).unwrap();
        assert_ne!(a, b);
        assert!(a.exists() && b.exists());

        let name = a.file_name().unwrap().to_string_lossy().to_string();
        let id = first.report.id.simple().to_string();
        assert!(name.ends_with(&format!("-{}.md", &id[..ID_CHARS])));
    }

    #[test]
    fn test_export_json() {
        let dir = tempdir().unwrap();
        let exporter = ReportExporter::new(dir.path()).unwrap();

        let path = exporter.export(&sample_run(), ExportFormat::Json).unwrap();
        assert_eq!(path.extension().unwrap(), "json");

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["report"]["question"], "What is new in Rust 2024?");
        assert_eq!(value["plan"]["queries"][0], "rust 2024 edition");
        assert_eq!(value["search"]["queries_run"], 1);
    }
}

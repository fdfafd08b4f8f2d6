// file: src/models/report.rs
// description: synthesized research report and its numbered sources

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Source {
    pub index: usize,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub question: String,
    pub queries: Vec<String>,
    /// Markdown produced by the model
    pub body: String,
    pub sources: Vec<Source>,
    pub model: String,
    pub generated_at: DateTime<Utc>,
}

impl Report {
    pub fn new(
        question: &str,
        queries: Vec<String>,
        body: String,
        sources: Vec<Source>,
        model: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            question: question.to_string(),
            queries,
            body: body.trim().to_string(),
            sources,
            model: model.to_string(),
            generated_at: Utc::now(),
        }
    }

    pub fn to_markdown(&self) -> String {
        let mut out = format!("# Research report: {}\n\n", self.question);
        out.push_str(&self.body);
        out.push_str("\n\n## Sources\n\n");

        if self.sources.is_empty() {
            out.push_str("No sources were returned by the search stage.\n");
        }
        for source in &self.sources {
            out.push_str(&format!("[{}] {} - {}\n", source.index, source.title, source.url));
        }

        out.push_str(&format!(
            "\n---\nQueries: {}\nModel: {} | Generated: {}\n",
            self.queries.join("; "),
            self.model,
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        out
    }
}

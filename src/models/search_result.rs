// file: src/models/search_result.rs
// description: Web search hit with its originating query and relevance score
// reference: https://docs.tavily.com/documentation/api-reference/endpoint/search

use crate::utils::validation::Validator;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// Planned query that produced this hit
    pub query: String,

    /// Page title as reported by the search provider
    pub title: String,

    /// Source URL
    pub url: String,

    /// Extracted page content
    pub snippet: String,

    /// Provider relevance score (higher is more relevant, typically 0.0-1.0)
    pub score: f32,
}

impl SearchResult {
    pub fn new(
        query: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
        snippet: impl Into<String>,
        score: f32,
    ) -> Self {
        Self {
            query: query.into(),
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
            score,
        }
    }

    /// Title, falling back to the URL for untitled pages.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.url
        } else {
            &self.title
        }
    }

    /// Format as a summary string for display
    pub fn format_summary(&self, max_content_len: usize) -> String {
        format!(
            "Score: {:.4} | {} ({})\n{}\n",
            self.score,
            self.display_title(),
            self.url,
            Validator::truncate_text(&self.snippet, max_content_len)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_result_creation() {
        let result = SearchResult::new(
            "rust async runtimes",
            "Tokio",
            "https://tokio.rs",
            "An asynchronous runtime",
            0.95,
        );

        assert_eq!(result.score, 0.95);
        assert_eq!(result.query, "rust async runtimes");
        assert_eq!(result.display_title(), "Tokio");
    }

    #[test]
    fn test_untitled_result_uses_url() {
        let result = SearchResult::new("q", "  ", "https://example.com/a", "text", 0.1);
        assert_eq!(result.display_title(), "https://example.com/a");
    }

    #[test]
    fn test_format_summary() {
        let result = SearchResult::new(
            "q",
            "Readme",
            "https://github.com/example/repo",
            "This is a very long content that will be truncated",
            0.87,
        );

        let summary = result.format_summary(20);
        assert!(summary.contains("0.8700"));
        assert!(summary.contains("https://github.com/example/repo"));
        assert!(summary.contains("..."));
    }
}

// file: src/utils/validation.rs
// description: input validation helpers
// reference: input validation patterns

use crate::error::{AgentError, Result};
use std::path::Path;

pub struct Validator;

impl Validator {
    pub fn validate_question(question: &str) -> Result<()> {
        if question.trim().is_empty() {
            return Err(AgentError::Validation(
                "Question must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate_content_not_empty(content: &str) -> Result<()> {
        if content.trim().is_empty() {
            return Err(AgentError::Validation("Content is empty".to_string()));
        }
        Ok(())
    }

    pub fn validate_url(url: &str) -> Result<()> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(AgentError::Validation(format!(
                "Invalid URL format: {}",
                url
            )));
        }
        Ok(())
    }

    pub fn validate_directory(path: &Path) -> Result<()> {
        if path.exists() && !path.is_dir() {
            return Err(AgentError::Validation(format!(
                "Path is not a directory: {}",
                path.display()
            )));
        }
        Ok(())
    }

    /// Keeps the first `max_length` characters, appending "..." when cut.
    pub fn truncate_text(text: &str, max_length: usize) -> String {
        match text.char_indices().nth(max_length) {
            Some((cut, _)) => format!("{}...", &text[..cut]),
            None => text.to_string(),
        }
    }

    /// Lowercase, dash-separated file name stem.
    pub fn slugify(text: &str, max_length: usize) -> String {
        let slug = text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("-");

        let slug: String = slug.chars().take(max_length).collect();
        let slug = slug.trim_end_matches('-').to_string();

        if slug.is_empty() {
            "report".to_string()
        } else {
            slug
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_question() {
        assert!(Validator::validate_question("What is Rust?").is_ok());
        assert!(Validator::validate_question("").is_err());
        assert!(Validator::validate_question(" \n\t").is_err());
    }

    #[test]
    fn test_validate_content_not_empty() {
        assert!(Validator::validate_content_not_empty("content").is_ok());
        assert!(Validator::validate_content_not_empty("   ").is_err());
    }

    #[test]
    fn test_validate_url() {
        assert!(Validator::validate_url("https://openrouter.ai/api/v1").is_ok());
        assert!(Validator::validate_url("http://localhost:8080").is_ok());
        assert!(Validator::validate_url("openrouter.ai").is_err());
        assert!(Validator::validate_url("ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_directory() {
        let temp = TempDir::new().unwrap();
        assert!(Validator::validate_directory(temp.path()).is_ok());
        assert!(Validator::validate_directory(&temp.path().join("not-yet")).is_ok());

        let file = temp.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();
        assert!(Validator::validate_directory(&file).is_err());
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(Validator::truncate_text("short", 10), "short");
        assert_eq!(
            Validator::truncate_text("this is a very long text", 10),
            "this is a ..."
        );
        assert_eq!(Validator::truncate_text("héllo wörld", 4), "héll...");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(
            Validator::slugify("What's new in Rust 2024?", 40),
            "what-s-new-in-rust-2024"
        );
        assert_eq!(Validator::slugify("a b c d", 4), "a-b");
        assert_eq!(Validator::slugify("???", 10), "report");
    }
}

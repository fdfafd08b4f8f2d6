// file: src/models/query_plan.rs
// description: ordered, non-empty list of search queries derived from a question

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryPlan {
    pub question: String,
    queries: Vec<String>,
}

impl QueryPlan {
    /// Builds a plan from candidate queries.
    ///
    /// Candidates are trimmed, blanks dropped, duplicates removed
    /// case-insensitively (first occurrence kept) and the list is capped at
    /// `max_queries`. An empty result falls back to the question itself, so a
    /// plan always holds at least one query.
    pub fn new<I, S>(question: &str, candidates: I, max_queries: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut queries: Vec<String> = candidates
            .into_iter()
            .map(|q| q.as_ref().trim().to_string())
            .filter(|q| !q.is_empty())
            .filter(|q| seen.insert(q.to_lowercase()))
            .take(max_queries.max(1))
            .collect();

        if queries.is_empty() {
            queries.push(question.trim().to_string());
        }

        Self {
            question: question.trim().to_string(),
            queries,
        }
    }

    pub fn queries(&self) -> &[String] {
        &self.queries
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedupes_and_preserves_order() {
        let plan = QueryPlan::new(
            "q",
            ["Rust async", " rust ASYNC ", "tokio vs async-std", ""],
            5,
        );
        assert_eq!(plan.queries(), &["Rust async", "tokio vs async-std"]);
    }

    #[test]
    fn test_caps_at_max_queries() {
        let plan = QueryPlan::new("q", ["a", "b", "c", "d"], 2);
        assert_eq!(plan.queries(), &["a", "b"]);
    }

    #[test]
    fn test_empty_candidates_fall_back_to_question() {
        let plan = QueryPlan::new("  What is WebAssembly?  ", Vec::<String>::new(), 3);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.queries()[0], "What is WebAssembly?");
        assert!(!plan.is_empty());
    }
}

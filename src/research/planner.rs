// file: src/research/planner.rs
// description: plan stage, turning a question into ordered search queries

use crate::error::Result;
use crate::gateway::{ChatModel, ChatRequest};
use crate::models::QueryPlan;
use crate::prompts;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

lazy_static! {
    static ref LIST_MARKER: Regex =
        Regex::new(r"^\s*(?:[-*•]|\d+[.)]|#+)\s*").expect("LIST_MARKER regex is valid");
}

pub struct QueryPlanner<'a> {
    chat: &'a dyn ChatModel,
    max_queries: usize,
    temperature: Option<f32>,
}

impl<'a> QueryPlanner<'a> {
    pub fn new(chat: &'a dyn ChatModel, max_queries: usize) -> Self {
        Self {
            chat,
            max_queries,
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub async fn plan(&self, question: &str) -> Result<QueryPlan> {
        let mut request = ChatRequest::with_system(
            prompts::PLANNER_SYSTEM,
            prompts::planner_user(question, self.max_queries),
        );
        request.temperature = self.temperature;

        let reply = self.chat.complete(&request).await?;
        let candidates = parse_queries(&reply);
        if candidates.is_empty() {
            warn!("Planner reply had no usable queries, searching the question directly");
        }

        let plan = QueryPlan::new(question, candidates, self.max_queries);
        debug!("Planned {} queries: {:?}", plan.len(), plan.queries());
        Ok(plan)
    }
}

/// Reads queries from a model reply: a JSON array of strings if one is
/// present, otherwise one query per line with list markers and quotes removed.
pub fn parse_queries(reply: &str) -> Vec<String> {
    // First position where a string array deserializes; trailing text is ignored.
    for (start, _) in reply.match_indices('[') {
        if let Some(Ok(queries)) = serde_json::Deserializer::from_str(&reply[start..])
            .into_iter::<Vec<String>>()
            .next()
        {
            return queries;
        }
    }

    reply
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .map(|line| LIST_MARKER.replace(line, "").to_string())
        .map(|line| line.trim().trim_matches('"').trim_end_matches(',').trim().to_string())
        .filter(|line| !line.is_empty() && !line.ends_with(':'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    struct CannedChat(&'static str);

    #[async_trait]
    impl ChatModel for CannedChat {
        fn model(&self) -> &str {
            "canned"
        }

        async fn complete(&self, _request: &ChatRequest) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_parse_json_array() {
        let reply = "Sure! Here you go:\n```json\n[\"rust borrow checker\", \"rust lifetimes explained\"]\n```";
        assert_eq!(
            parse_queries(reply),
            vec!["rust borrow checker", "rust lifetimes explained"]
        );
    }

    #[test]
    fn test_parse_json_array_with_bracketed_prose_after() {
        let reply = "Here are the queries:\n[\"rust async runtimes\", \"tokio vs smol\"]\n\nThese cover [most] of the question.";
        assert_eq!(
            parse_queries(reply),
            vec!["rust async runtimes", "tokio vs smol"]
        );
    }

    #[test]
    fn test_parse_skips_bracketed_prose_before_array() {
        let reply = "[Note] two queries:\n[\"quic handshake\", \"http3 adoption\"]";
        assert_eq!(parse_queries(reply), vec!["quic handshake", "http3 adoption"]);
    }

    #[test]
    fn test_parse_numbered_lines() {
        let reply = "Queries:\n1. tokio runtime internals\n2) async rust cancellation\n- \"pin projection\"";
        assert_eq!(
            parse_queries(reply),
            vec![
                "tokio runtime internals",
                "async rust cancellation",
                "pin projection"
            ]
        );
    }

    #[test]
    fn test_parse_empty_reply() {
        assert!(parse_queries("  \n ").is_empty());
    }

    #[tokio::test]
    async fn test_plan_falls_back_to_question() {
        let chat = CannedChat("");
        let plan = QueryPlanner::new(&chat, 3).plan("What is QUIC?").await.unwrap();
        assert_eq!(plan.queries(), &["What is QUIC?"]);
    }

    #[tokio::test]
    async fn test_plan_respects_max_queries() {
        let chat = CannedChat(r#"["a", "b", "c", "d", "e"]"#);
        let plan = QueryPlanner::new(&chat, 2).plan("letters").await.unwrap();
        assert_eq!(plan.len(), 2);
    }
}

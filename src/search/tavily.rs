// file: src/search/tavily.rs
// description: Tavily web search client behind the SearchProvider trait
// reference: https://docs.tavily.com/documentation/api-reference/endpoint/search

use crate::config::{SearchConfig, SearchDepth};
use crate::credentials::ApiKey;
use crate::error::{AgentError, Result};
use crate::models::SearchResult;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const SERVICE: &str = "Tavily";

pub const AUTH_HINT: &str = "Check TAVILY_API_KEY (shell or .env) against https://app.tavily.com \
and regenerate it if it was revoked.";

/// Results returned by one search request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchBatch {
    pub query: String,
    pub answer: Option<String>,
    pub results: Vec<SearchResult>,
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, query: &str) -> Result<SearchBatch>;
}

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    max_results: usize,
    search_depth: SearchDepth,
    include_answer: bool,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    results: Vec<TavilyHit>,
}

#[derive(Debug, Deserialize)]
struct TavilyHit {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    score: f32,
}

#[derive(Debug)]
pub struct TavilyClient {
    client: Client,
    base_url: String,
    api_key: ApiKey,
    max_results: usize,
    search_depth: SearchDepth,
    include_answer: bool,
}

impl TavilyClient {
    pub fn new(config: &SearchConfig, api_key: ApiKey) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            max_results: config.max_results,
            search_depth: config.search_depth,
            include_answer: config.include_answer,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/search", self.base_url)
    }

    pub fn parse_response(query: &str, body: &str) -> Result<SearchBatch> {
        let parsed: TavilyResponse = serde_json::from_str(body)
            .map_err(|e| AgentError::malformed(SERVICE, format!("invalid JSON: {}", e)))?;

        let results = parsed
            .results
            .into_iter()
            .filter(|hit| !hit.url.trim().is_empty())
            .map(|hit| SearchResult::new(query, hit.title, hit.url, hit.content, hit.score))
            .collect();

        Ok(SearchBatch {
            query: query.to_string(),
            answer: parsed.answer.filter(|a| !a.trim().is_empty()),
            results,
        })
    }
}

#[async_trait]
impl SearchProvider for TavilyClient {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn search(&self, query: &str) -> Result<SearchBatch> {
        let request = TavilyRequest {
            query,
            max_results: self.max_results,
            search_depth: self.search_depth,
            include_answer: self.include_answer,
        };

        debug!("Searching {} for \"{}\"", SERVICE, query);

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose())
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::http(SERVICE, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AgentError::http(SERVICE, e))?;

        if !status.is_success() {
            return Err(AgentError::from_status(SERVICE, status, &text, AUTH_HINT));
        }

        let batch = Self::parse_response(query, &text)?;
        debug!("{} returned {} results for \"{}\"", SERVICE, batch.results.len(), query);
        Ok(batch)
    }
}

// file: src/gateway/client.rs
// description: OpenRouter chat completions client behind the ChatModel trait
// reference: https://openrouter.ai/docs/api-reference/chat-completion

use crate::config::GatewayConfig;
use crate::credentials::ApiKey;
use crate::error::{AgentError, Result};
use crate::gateway::types::{ChatRequest, CompletionBody, CompletionResponse};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use std::time::Duration;
use tracing::debug;

pub const SERVICE: &str = "OpenRouter";

pub const AUTH_HINT: &str = "Regenerate the key at https://openrouter.ai/keys and update .env. \
If .env already holds a fresh key, a stale shell value may be shadowing it: \
run `unset OPENROUTER_API_KEY OPENROUTER_MODEL` and retry.";

/// Anything that can answer a chat request with text.
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model(&self) -> &str;

    async fn complete(&self, request: &ChatRequest) -> Result<String>;
}

#[derive(Debug)]
pub struct OpenRouterClient {
    client: Client,
    base_url: String,
    api_key: ApiKey,
    model: String,
}

impl OpenRouterClient {
    pub fn new(config: &GatewayConfig, api_key: ApiKey) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "http-referer",
            HeaderValue::from_str(&config.referer)
                .map_err(|e| AgentError::Config(format!("Invalid gateway.referer: {}", e)))?,
        );
        headers.insert(
            "x-title",
            HeaderValue::from_str(&config.title)
                .map_err(|e| AgentError::Config(format!("Invalid gateway.title: {}", e)))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Extracts the first choice's text from a raw response body.
    pub fn parse_completion(body: &str) -> Result<String> {
        let parsed: CompletionResponse = serde_json::from_str(body)
            .map_err(|e| AgentError::malformed(SERVICE, format!("invalid JSON: {}", e)))?;

        if let Some(error) = parsed.error {
            let code = error.code.unwrap_or(500);
            return Err(AgentError::from_code(SERVICE, code, &error.message, AUTH_HINT));
        }

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| AgentError::malformed(SERVICE, "response contained no choices"))
    }
}

#[async_trait]
impl ChatModel for OpenRouterClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let body = CompletionBody {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
        };

        debug!(
            "Requesting completion from {} ({} messages)",
            self.model,
            request.messages.len()
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose())
            .json(&body)
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

        let content = Self::parse_completion(&text)?;
        debug!("Received completion of {} chars", content.len());
        Ok(content)
    }
}

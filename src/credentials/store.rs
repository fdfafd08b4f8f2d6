// file: src/credentials/store.rs
// description: secret store backends used as the fallback credential source
// reference: https://cloud.google.com/secret-manager/docs/reference/rest/v1/projects.secrets.versions/access

use crate::config::SecretsConfig;
use crate::credentials::{ApiKey, ProcessEnv};
use crate::error::{AgentError, Result};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";
pub const CREDENTIALS_FILE_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// A key/value service holding credentials outside the environment.
#[async_trait]
pub trait SecretStore: Send + Sync {
    fn name(&self) -> &str;

    /// Fetches the latest version of `secret`.
    async fn fetch(&self, secret: &str) -> Result<ApiKey>;
}

/// Where the secret manager bearer token comes from.
#[derive(Debug, Clone)]
pub enum AccessTokenSource {
    /// A token exported in the environment.
    Static(ApiKey),
    /// Application-default credentials via the gcloud CLI.
    Gcloud { credentials_file: Option<PathBuf> },
}

impl AccessTokenSource {
    pub fn from_env(env: &ProcessEnv) -> Self {
        match env.get(ACCESS_TOKEN_ENV) {
            Some(token) => AccessTokenSource::Static(ApiKey::new(token)),
            None => AccessTokenSource::Gcloud {
                credentials_file: env.get(CREDENTIALS_FILE_ENV).map(PathBuf::from),
            },
        }
    }

    async fn token(&self) -> Result<ApiKey> {
        match self {
            AccessTokenSource::Static(token) => Ok(token.clone()),
            AccessTokenSource::Gcloud { credentials_file } => {
                let mut cmd = Command::new("gcloud");
                cmd.args(["auth", "application-default", "print-access-token"])
                    .stdin(Stdio::null())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped());
                if let Some(path) = credentials_file {
                    cmd.env(CREDENTIALS_FILE_ENV, path);
                }

                let output = cmd.output().await.map_err(|e| {
                    AgentError::SecretStore(format!("Failed to run gcloud for an access token: {}", e))
                })?;

                if !output.status.success() {
                    return Err(AgentError::SecretStore(format!(
                        "gcloud could not print an access token: {}",
                        String::from_utf8_lossy(&output.stderr).trim()
                    )));
                }

                let token = ApiKey::new(String::from_utf8_lossy(&output.stdout));
                if token.is_empty() {
                    return Err(AgentError::SecretStore(
                        "gcloud returned an empty access token".to_string(),
                    ));
                }
                Ok(token)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct AccessSecretVersionResponse {
    payload: SecretPayload,
}

#[derive(Debug, Deserialize)]
struct SecretPayload {
    data: String,
}

/// Google Cloud Secret Manager over its REST API.
pub struct GcpSecretManager {
    client: Client,
    base_url: String,
    project_id: String,
    tokens: AccessTokenSource,
}

impl GcpSecretManager {
    pub fn new(base_url: &str, project_id: &str, tokens: AccessTokenSource) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id: project_id.to_string(),
            tokens,
        }
    }

    /// Returns a store when `secrets.project_id` is configured.
    pub fn from_config(config: &SecretsConfig, env: &ProcessEnv) -> Option<Self> {
        let project_id = config.project_id.as_deref()?.trim();
        if project_id.is_empty() {
            return None;
        }
        Some(Self::new(
            &config.manager_url,
            project_id,
            AccessTokenSource::from_env(env),
        ))
    }

    pub fn version_url(&self, secret: &str) -> String {
        format!(
            "{}/projects/{}/secrets/{}/versions/latest:access",
            self.base_url, self.project_id, secret
        )
    }

    pub fn decode_payload(data: &str) -> Result<ApiKey> {
        let bytes = STANDARD
            .decode(data.trim())
            .map_err(|e| AgentError::SecretStore(format!("Secret payload is not base64: {}", e)))?;
        let value = String::from_utf8(bytes)
            .map_err(|e| AgentError::SecretStore(format!("Secret payload is not UTF-8: {}", e)))?;
        Ok(ApiKey::new(value))
    }
}

#[async_trait]
impl SecretStore for GcpSecretManager {
    fn name(&self) -> &str {
        "Secret Manager"
    }

    async fn fetch(&self, secret: &str) -> Result<ApiKey> {
        let token = self.tokens.token().await?;
        let url = self.version_url(secret);
        debug!("Accessing secret '{}' in project '{}'", secret, self.project_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token.expose())
            .send()
            .await
            .map_err(|e| AgentError::SecretStore(format!("Failed to reach Secret Manager: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::SecretStore(format!(
                "Failed to access secret '{}' from project '{}' (HTTP {}): {}",
                secret,
                self.project_id,
                status.as_u16(),
                body.trim()
            )));
        }

        let parsed: AccessSecretVersionResponse = response.json().await.map_err(|e| {
            AgentError::SecretStore(format!("Failed to parse Secret Manager response: {}", e))
        })?;

        let key = Self::decode_payload(&parsed.payload.data)?;
        if key.is_empty() {
            return Err(AgentError::SecretStore(format!("Secret '{}' is empty", secret)));
        }
        Ok(key)
    }
}

/// Map-backed store for tests and offline demos.
#[derive(Debug, Default)]
pub struct InMemorySecretStore {
    secrets: HashMap<String, String>,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, name: &str, value: &str) -> Self {
        self.secrets.insert(name.to_string(), value.to_string());
        self
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn fetch(&self, secret: &str) -> Result<ApiKey> {
        self.secrets
            .get(secret)
            .map(ApiKey::new)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AgentError::SecretStore(format!("Secret '{}' not found", secret)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_version_url() {
        let store = GcpSecretManager::new(
            "https://secretmanager.googleapis.com/v1/",
            "finbot",
            AccessTokenSource::Static(ApiKey::new("token")),
        );
        assert_eq!(
            store.version_url("openrouter-api-key"),
            "https://secretmanager.googleapis.com/v1/projects/finbot/secrets/openrouter-api-key/versions/latest:access"
        );
    }

    #[test]
    fn test_decode_payload() {
        // "sk-or-v1-abc\n"
        let key = GcpSecretManager::decode_payload("c2stb3ItdjEtYWJjCg==").unwrap();
        assert_eq!(key.expose(), "sk-or-v1-abc");
        assert!(GcpSecretManager::decode_payload("not base64!").is_err());
    }

    #[test]
    fn test_store_disabled_without_project() {
        let config = Config::default_config();
        assert!(GcpSecretManager::from_config(&config.secrets, &ProcessEnv::default()).is_none());
    }

    #[test]
    fn test_token_source_prefers_env_token() {
        let env = ProcessEnv::from_vars([
            (ACCESS_TOKEN_ENV, "ya29.token"),
            (CREDENTIALS_FILE_ENV, "/keys/sa.json"),
        ]);
        assert!(matches!(AccessTokenSource::from_env(&env), AccessTokenSource::Static(_)));

        let env = ProcessEnv::from_vars([(CREDENTIALS_FILE_ENV, "/keys/sa.json")]);
        match AccessTokenSource::from_env(&env) {
            AccessTokenSource::Gcloud { credentials_file } => {
                assert_eq!(credentials_file, Some(PathBuf::from("/keys/sa.json")));
            }
            other => panic!("unexpected source: {other:?}"),
        }
    }

    #[test]
    fn test_static_token_needs_no_gcloud() {
        let source = AccessTokenSource::Static(ApiKey::new("ya29.static"));
        let token = tokio_test::block_on(source.token()).unwrap();
        assert_eq!(token.expose(), "ya29.static");
    }

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = InMemorySecretStore::new().with_secret("tavily", "tvly-123");
        assert_eq!(store.fetch("tavily").await.unwrap().expose(), "tvly-123");
        assert!(store.fetch("missing").await.is_err());
    }
}

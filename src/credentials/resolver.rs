// file: src/credentials/resolver.rs
// description: layered credential resolution (environment, then secret store)

use crate::config::SecretsConfig;
use crate::credentials::{ApiKey, ProcessEnv, SecretStore};
use crate::error::{AgentError, Result};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

pub const GATEWAY_KEY_ENV: &str = "OPENROUTER_API_KEY";
pub const SEARCH_KEY_ENV: &str = "TAVILY_API_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CredentialKind {
    ModelGateway,
    Search,
}

impl CredentialKind {
    pub const ALL: [CredentialKind; 2] = [CredentialKind::ModelGateway, CredentialKind::Search];

    pub fn env_var(&self) -> &'static str {
        match self {
            CredentialKind::ModelGateway => GATEWAY_KEY_ENV,
            CredentialKind::Search => SEARCH_KEY_ENV,
        }
    }

    pub fn secret_name<'a>(&self, config: &'a SecretsConfig) -> &'a str {
        match self {
            CredentialKind::ModelGateway => &config.gateway_secret,
            CredentialKind::Search => &config.search_secret,
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialKind::ModelGateway => f.write_str("model gateway key"),
            CredentialKind::Search => f.write_str("search key"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CredentialSource {
    Environment,
    SecretStore,
}

#[derive(Debug, Clone)]
pub struct ResolvedCredential {
    pub kind: CredentialKind,
    pub key: ApiKey,
    pub source: CredentialSource,
}

/// Resolves credentials from the captured environment and, when one is
/// configured, a secret store.
pub struct CredentialResolver {
    env: ProcessEnv,
    secrets: SecretsConfig,
    store: Option<Box<dyn SecretStore>>,
}

impl CredentialResolver {
    pub fn env_only(env: ProcessEnv, secrets: SecretsConfig) -> Self {
        Self {
            env,
            secrets,
            store: None,
        }
    }

    pub fn with_store(env: ProcessEnv, secrets: SecretsConfig, store: Box<dyn SecretStore>) -> Self {
        Self {
            env,
            secrets,
            store: Some(store),
        }
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    pub async fn resolve(&self, kind: CredentialKind) -> Result<ResolvedCredential> {
        let env_var = kind.env_var();
        let secret = kind.secret_name(&self.secrets);

        if let Some(value) = self.env.get(env_var) {
            debug!("Resolved {} from {}", kind, env_var);
            return Ok(ResolvedCredential {
                kind,
                key: ApiKey::new(value),
                source: CredentialSource::Environment,
            });
        }

        let detail = match &self.store {
            Some(store) => match store.fetch(secret).await {
                Ok(key) => {
                    info!("Resolved {} from {} secret '{}'", kind, store.name(), secret);
                    return Ok(ResolvedCredential {
                        kind,
                        key,
                        source: CredentialSource::SecretStore,
                    });
                }
                Err(e) => {
                    warn!("{} lookup of '{}' failed: {}", store.name(), secret, e);
                    format!(", and {} lookup failed: {}", store.name(), e)
                }
            },
            None => ", and no secret store is configured".to_string(),
        };

        Err(AgentError::MissingCredential {
            env_var: env_var.to_string(),
            secret: secret.to_string(),
            detail,
        })
    }

    /// Resolves every kind up front; fails on the first one with no value.
    pub async fn resolve_all(&self, kinds: &[CredentialKind]) -> Result<Vec<ResolvedCredential>> {
        let mut resolved = Vec::with_capacity(kinds.len());
        for kind in kinds {
            resolved.push(self.resolve(*kind).await?);
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::credentials::InMemorySecretStore;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn secrets() -> SecretsConfig {
        Config::default_config().secrets
    }

    struct CountingStore {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SecretStore for CountingStore {
        fn name(&self) -> &str {
            "counting"
        }

        async fn fetch(&self, secret: &str) -> Result<ApiKey> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(AgentError::SecretStore(format!("unreachable: {secret}")))
        }
    }

    #[tokio::test]
    async fn test_environment_takes_precedence() {
        let env = ProcessEnv::from_vars([(GATEWAY_KEY_ENV, "sk-or-env")]);
        let store = InMemorySecretStore::new().with_secret("openrouter-api-key", "sk-or-store");
        let resolver = CredentialResolver::with_store(env, secrets(), Box::new(store));

        let resolved = resolver.resolve(CredentialKind::ModelGateway).await.unwrap();
        assert_eq!(resolved.key.expose(), "sk-or-env");
        assert_eq!(resolved.source, CredentialSource::Environment);
    }

    #[tokio::test]
    async fn test_falls_back_to_secret_store() {
        let store = InMemorySecretStore::new().with_secret("tavily", "tvly-store");
        let resolver =
            CredentialResolver::with_store(ProcessEnv::default(), secrets(), Box::new(store));

        let resolved = resolver.resolve(CredentialKind::Search).await.unwrap();
        assert_eq!(resolved.key.expose(), "tvly-store");
        assert_eq!(resolved.source, CredentialSource::SecretStore);
    }

    #[tokio::test]
    async fn test_missing_everywhere_is_config_error() {
        let resolver = CredentialResolver::env_only(ProcessEnv::default(), secrets());
        let err = resolver.resolve(CredentialKind::ModelGateway).await.unwrap_err();

        match err {
            AgentError::MissingCredential { env_var, secret, detail } => {
                assert_eq!(env_var, GATEWAY_KEY_ENV);
                assert_eq!(secret, "openrouter-api-key");
                assert!(detail.contains("no secret store"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_message_names_secret_without_store() {
        let resolver = CredentialResolver::env_only(ProcessEnv::default(), secrets());
        let message = resolver
            .resolve(CredentialKind::Search)
            .await
            .unwrap_err()
            .to_string();

        assert!(message.contains("TAVILY_API_KEY"));
        assert!(message.contains("secret 'tavily'"));
        assert!(message.ends_with("no secret store is configured"));
    }

    #[tokio::test]
    async fn test_store_failure_is_reported_once_per_secret() {
        let calls = Arc::new(AtomicUsize::new(0));
        let store = CountingStore {
            calls: Arc::clone(&calls),
        };
        let resolver =
            CredentialResolver::with_store(ProcessEnv::default(), secrets(), Box::new(store));

        let err = resolver.resolve(CredentialKind::Search).await.unwrap_err();
        assert!(err.to_string().contains("unreachable: tavily"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resolve_all_stops_at_first_missing() {
        let env = ProcessEnv::from_vars([(SEARCH_KEY_ENV, "tvly-env")]);
        let resolver = CredentialResolver::env_only(env, secrets());

        let err = resolver.resolve_all(&CredentialKind::ALL).await.unwrap_err();
        assert!(matches!(err, AgentError::MissingCredential { .. }));

        let resolved = resolver.resolve_all(&[CredentialKind::Search]).await.unwrap();
        assert_eq!(resolved.len(), 1);
    }
}

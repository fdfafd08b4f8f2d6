// file: src/context.rs
// description: start-up state shared by every command
// reference: environment -> configuration -> credentials -> clients

use crate::config::Config;
use crate::credentials::{
    CredentialKind, CredentialResolver, DotenvPrecedence, GcpSecretManager, ProcessEnv,
    ResolvedCredential,
};
use crate::error::{AgentError, Result};
use crate::gateway::OpenRouterClient;
use crate::options::YahooClient;
use crate::search::TavilyClient;
use std::path::Path;
use tracing::{info, warn};

/// Configuration plus the captured environment, read once at start-up.
pub struct AppContext {
    pub config: Config,
    pub env: ProcessEnv,
    resolver: CredentialResolver,
}

impl AppContext {
    pub fn new(config: Config, env: ProcessEnv) -> Self {
        let resolver = match GcpSecretManager::from_config(&config.secrets, &env) {
            Some(store) => {
                info!("Secret Manager fallback enabled");
                CredentialResolver::with_store(env.clone(), config.secrets.clone(), Box::new(store))
            }
            None => CredentialResolver::env_only(env.clone(), config.secrets.clone()),
        };

        Self {
            config,
            env,
            resolver,
        }
    }

    /// Captures the environment, layers `.env` and loads configuration.
    /// A config path that does not exist falls back to the built-in defaults.
    pub fn bootstrap(
        config_path: Option<&Path>,
        dotenv_path: Option<&Path>,
        precedence: DotenvPrecedence,
    ) -> Result<Self> {
        let env = ProcessEnv::capture(dotenv_path, precedence)?;

        let config_path = match config_path {
            Some(path) if !path.exists() => {
                warn!(
                    "Config file {} not found, using default configuration",
                    path.display()
                );
                None
            }
            other => other,
        };

        let config = Config::load(config_path, &env)?;
        Ok(Self::new(config, env))
    }

    pub fn resolver(&self) -> &CredentialResolver {
        &self.resolver
    }

    pub async fn chat_model(&self) -> Result<OpenRouterClient> {
        let credential = self.resolver.resolve(CredentialKind::ModelGateway).await?;
        OpenRouterClient::new(&self.config.gateway, credential.key)
    }

    pub async fn search_provider(&self) -> Result<TavilyClient> {
        let credential = self.resolver.resolve(CredentialKind::Search).await?;
        TavilyClient::new(&self.config.search, credential.key)
    }

    /// Market data needs no credentials.
    pub fn market_data(&self) -> Result<YahooClient> {
        YahooClient::new(&self.config.options)
    }

    /// Both research clients. Every key is resolved before either client
    /// exists, so a missing key fails the run before any request is sent.
    pub async fn research_clients(&self) -> Result<(OpenRouterClient, TavilyClient)> {
        let resolved = self
            .resolver
            .resolve_all(&[CredentialKind::ModelGateway, CredentialKind::Search])
            .await?;

        let [gateway, search]: [ResolvedCredential; 2] = resolved
            .try_into()
            .map_err(|_| AgentError::Config("expected two resolved credentials".to_string()))?;

        Ok((
            OpenRouterClient::new(&self.config.gateway, gateway.key)?,
            TavilyClient::new(&self.config.search, search.key)?,
        ))
    }
}

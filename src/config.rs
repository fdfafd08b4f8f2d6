// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::credentials::ProcessEnv;
use crate::error::{AgentError, Result};
use crate::utils::validation::Validator;
use config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

pub const ENV_PREFIX: &str = "WORKSHOP_AGENT";
pub const MODEL_ENV: &str = "OPENROUTER_MODEL";
pub const PROJECT_ENV: &str = "GOOGLE_CLOUD_PROJECT";
pub const DEFAULT_MODEL: &str = "arcee-ai/trinity-large-preview:free";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub search: SearchConfig,
    pub secrets: SecretsConfig,
    pub research: ResearchConfig,
    pub coding: CodingConfig,
    pub options: OptionsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    pub base_url: String,
    pub model: String,
    pub referer: String,
    pub title: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    pub base_url: String,
    pub max_results: usize,
    pub search_depth: SearchDepth,
    pub include_answer: bool,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    Basic,
    Advanced,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SecretsConfig {
    #[serde(default)]
    pub project_id: Option<String>,
    pub manager_url: String,
    pub gateway_secret: String,
    pub search_secret: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResearchConfig {
    pub max_queries: usize,
    pub on_search_failure: SearchFailurePolicy,
    pub snippet_chars: usize,
}

/// What the search stage does when one planned query fails.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchFailurePolicy {
    #[default]
    Abort,
    Skip,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CodingConfig {
    pub python: String,
    pub timeout_secs: u64,
    pub max_attempts: u32,
}

/// Yahoo Finance market data plus the liquidity floor used by the plan builders.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OptionsConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub min_open_interest: u64,
    pub min_volume: u64,
    pub covered_call_otm_pct: f64,
}

impl SecretsConfig {
    pub fn store_enabled(&self) -> bool {
        self.project_id
            .as_deref()
            .is_some_and(|p| !p.trim().is_empty())
    }
}

impl Config {
    /// Builds the configuration from embedded defaults, an optional TOML file
    /// and the captured environment, in increasing priority.
    pub fn load(path: Option<&Path>, env: &ProcessEnv) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        builder = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(env.to_map())),
            )
            .set_override_option("gateway.model", env.get(MODEL_ENV).map(str::to_string))
            .map_err(|e| AgentError::Config(e.to_string()))?
            .set_override_option(
                "secrets.project_id",
                env.get(PROJECT_ENV).map(str::to_string),
            )
            .map_err(|e| AgentError::Config(e.to_string()))?;

        let settings = builder
            .build()
            .map_err(|e| AgentError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| AgentError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            gateway: GatewayConfig {
                base_url: "https://openrouter.ai/api/v1".to_string(),
                model: DEFAULT_MODEL.to_string(),
                referer: "http://localhost:8888".to_string(),
                title: "Dallas Agent Workshop".to_string(),
                temperature: 0.2,
                timeout_secs: 120,
            },
            search: SearchConfig {
                base_url: "https://api.tavily.com".to_string(),
                max_results: 5,
                search_depth: SearchDepth::Basic,
                include_answer: true,
                timeout_secs: 30,
            },
            secrets: SecretsConfig {
                project_id: None,
                manager_url: "https://secretmanager.googleapis.com/v1".to_string(),
                gateway_secret: "openrouter-api-key".to_string(),
                search_secret: "tavily".to_string(),
            },
            research: ResearchConfig {
                max_queries: 4,
                on_search_failure: SearchFailurePolicy::Abort,
                snippet_chars: 600,
            },
            coding: CodingConfig {
                python: "python3".to_string(),
                timeout_secs: 3,
                max_attempts: 3,
            },
            options: OptionsConfig {
                base_url: "https://query1.finance.yahoo.com".to_string(),
                user_agent: "Mozilla/5.0 (compatible; workshop_agent)".to_string(),
                timeout_secs: 20,
                min_open_interest: 100,
                min_volume: 1,
                covered_call_otm_pct: 5.0,
            },
        }
    }

    fn validate(&self) -> Result<()> {
        Validator::validate_url(&self.gateway.base_url)?;
        Validator::validate_url(&self.search.base_url)?;
        Validator::validate_url(&self.secrets.manager_url)?;
        Validator::validate_url(&self.options.base_url)?;

        if self.gateway.model.trim().is_empty() {
            return Err(AgentError::Config("gateway.model must not be empty".to_string()));
        }

        if !(0.0..=2.0).contains(&self.gateway.temperature) {
            return Err(AgentError::Config(
                "gateway.temperature must be between 0 and 2".to_string(),
            ));
        }

        if self.search.max_results == 0 {
            return Err(AgentError::Config(
                "search.max_results must be greater than 0".to_string(),
            ));
        }

        if self.research.max_queries == 0 {
            return Err(AgentError::Config(
                "research.max_queries must be greater than 0".to_string(),
            ));
        }

        if self.coding.max_attempts == 0 || self.coding.timeout_secs == 0 {
            return Err(AgentError::Config(
                "coding.max_attempts and coding.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if !(0.0..100.0).contains(&self.options.covered_call_otm_pct) {
            return Err(AgentError::Config(
                "options.covered_call_otm_pct must be between 0 and 100".to_string(),
            ));
        }

        Ok(())
    }
}

// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AgentError>;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No value for {env_var} (secret '{secret}'): not set in the environment or .env{detail}")]
    MissingCredential {
        env_var: String,
        secret: String,
        detail: String,
    },

    #[error("{service} rejected the credentials (HTTP {status}). {hint}")]
    Authentication {
        service: String,
        status: u16,
        hint: String,
    },

    #[error("{service} request failed: {message}")]
    Http { service: String, message: String },

    #[error("{service} returned HTTP {status}: {message}")]
    Api {
        service: String,
        status: u16,
        message: String,
    },

    #[error("Unexpected response from {service}: {message}")]
    MalformedResponse { service: String, message: String },

    #[error("Search failed for query \"{query}\": {source}")]
    SearchFailed {
        query: String,
        #[source]
        source: Box<AgentError>,
    },

    #[error("Market data error: {0}")]
    MarketData(String),

    #[error("Secret store error: {0}")]
    SecretStore(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AgentError {
    /// Maps a non-success HTTP status to the matching error variant.
    pub fn from_status(service: &str, status: StatusCode, body: &str, hint: &str) -> Self {
        Self::from_code(service, status.as_u16(), body, hint)
    }

    pub fn from_code(service: &str, status: u16, body: &str, hint: &str) -> Self {
        if status == 401 || status == 403 {
            AgentError::Authentication {
                service: service.to_string(),
                status,
                hint: hint.to_string(),
            }
        } else {
            AgentError::Api {
                service: service.to_string(),
                status,
                message: body.trim().to_string(),
            }
        }
    }

    pub fn http(service: &str, err: reqwest::Error) -> Self {
        AgentError::Http {
            service: service.to_string(),
            message: err.to_string(),
        }
    }

    pub fn malformed(service: &str, message: impl Into<String>) -> Self {
        AgentError::MalformedResponse {
            service: service.to_string(),
            message: message.into(),
        }
    }

    pub fn is_auth(&self) -> bool {
        match self {
            AgentError::Authentication { .. } => true,
            AgentError::SearchFailed { source, .. } => source.is_auth(),
            _ => false,
        }
    }

    /// Troubleshooting hint shown to the user, when one applies.
    pub fn hint(&self) -> Option<&str> {
        match self {
            AgentError::Authentication { hint, .. } => Some(hint),
            AgentError::SearchFailed { source, .. } => source.hint(),
            _ => None,
        }
    }

    /// Finds the first hint carried anywhere in a context chain.
    pub fn hint_in(err: &anyhow::Error) -> Option<&str> {
        err.chain()
            .filter_map(|cause| cause.downcast_ref::<AgentError>())
            .find_map(AgentError::hint)
    }
}

impl From<serde_json::Error> for AgentError {
    fn from(err: serde_json::Error) -> Self {
        AgentError::Serialization(err.to_string())
    }
}

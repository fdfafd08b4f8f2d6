// file: src/credentials/mod.rs
// description: credential and environment module exports

pub mod environment;
pub mod resolver;
pub mod secret;
pub mod store;

pub use environment::{DotenvPrecedence, ProcessEnv};
pub use resolver::{
    CredentialKind, CredentialResolver, CredentialSource, GATEWAY_KEY_ENV, ResolvedCredential,
    SEARCH_KEY_ENV,
};
pub use secret::ApiKey;
pub use store::{AccessTokenSource, GcpSecretManager, InMemorySecretStore, SecretStore};

// file: src/gateway/mod.rs
// description: model gateway module exports

pub mod client;
pub mod types;

pub use client::{ChatModel, OpenRouterClient};
pub use types::{ChatMessage, ChatRequest, Role};

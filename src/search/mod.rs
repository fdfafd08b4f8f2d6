// file: src/search/mod.rs
// description: web search module exports

pub mod tavily;

pub use tavily::{SearchBatch, SearchProvider, TavilyClient};

//! Generic client for OpenAI-compatible chat completion APIs.

mod client;
mod conversions;
mod dto;
mod url;

pub use client::OpenAICompatibleClient;
pub use dto::{
    ChatChoice, ChatMessage, ChatRequest, ChatRequestBuilder, ChatResponse, ChatUsage, ModelEntry,
    ModelList,
};
pub use url::{completions_url, models_url};

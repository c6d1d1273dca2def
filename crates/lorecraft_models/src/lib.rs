//! Generation backends for the Lorecraft engine.
//!
//! Provides the bundled OpenAI-compatible HTTP client used for custom
//! endpoints, and source selection between that client and a host-provided
//! driver.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod openai_compat;
mod source;

pub use openai_compat::{
    ChatMessage, ChatRequest, ChatResponse, ModelList, OpenAICompatibleClient,
};
pub use source::{AiSource, SourceSettings, build_driver};

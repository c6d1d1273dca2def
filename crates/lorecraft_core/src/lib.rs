//! Core data types for the Lorecraft world-book generation engine.
//!
//! This crate provides the foundation data types used across all Lorecraft
//! interfaces: conversation messages, generation requests, and the typed
//! lorebook records the pipeline produces.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod character;
mod input;
mod lore;
mod message;
mod output;
mod request;
mod role;

pub use character::CharacterCard;
pub use input::Input;
pub use lore::{LoreBook, LoreEntry};
pub use message::Message;
pub use output::Output;
pub use request::{GenerateRequest, GenerateRequestBuilder, GenerateResponse};
pub use role::Role;

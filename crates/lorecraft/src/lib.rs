//! Lorecraft - Automated World-Book Generation
//!
//! Lorecraft turns a one-line theme into a complete lorebook: a planner
//! model call decomposes the theme into per-stage instructions, four fixed
//! content stages generate entries that build on everything written so far,
//! and a companion "director" character is bound to the finished book.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use lorecraft::{
//!     GenerationRequest, OpenAICompatibleClient, Orchestrator,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OpenAICompatibleClient::new(
//!         "https://api.example.com",
//!         Some(std::env::var("API_KEY")?),
//!         "my-model".to_string(),
//!     );
//!
//!     let orchestrator = Orchestrator::builder()
//!         .driver(Arc::new(client))
//!         .lorebooks(my_lorebook_host())
//!         .characters(my_character_host())
//!         .build()?;
//!
//!     let report = orchestrator
//!         .run(GenerationRequest::new("Shattered Realms", "floating islands"))
//!         .await?;
//!     println!("Created {} entries", report.total_entries());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! Lorecraft is organized as a workspace with focused crates:
//!
//! - `lorecraft_core` - Core data types (messages, requests, lore records)
//! - `lorecraft_interface` - Driver and host trait definitions
//! - `lorecraft_error` - Error types
//! - `lorecraft_models` - OpenAI-compatible client and source selection
//! - `lorecraft_generator` - The generation pipeline itself
//!
//! This crate (`lorecraft`) re-exports everything for convenience.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub use lorecraft_core::*;
pub use lorecraft_error::*;
pub use lorecraft_generator::*;
pub use lorecraft_interface::*;
pub use lorecraft_models::*;

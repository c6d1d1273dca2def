//! Error types for the Lorecraft world-book generation engine.
//!
//! This crate provides the foundation error types used throughout the
//! Lorecraft workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use lorecraft_error::{LorecraftResult, HttpError};
//!
//! fn fetch_data() -> LorecraftResult<String> {
//!     Err(HttpError::new("Connection refused"))?
//! }
//!
//! match fetch_data() {
//!     Ok(data) => println!("Got: {}", data),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod extraction;
mod generation;
mod host;
mod http;
mod json;
mod source;

pub use config::ConfigError;
pub use error::{LorecraftError, LorecraftErrorKind, LorecraftResult};
pub use extraction::{ExtractionError, ExtractionErrorKind};
pub use generation::{GenerationError, GenerationErrorKind};
pub use host::{HostError, HostErrorKind};
pub use http::HttpError;
pub use json::JsonError;
pub use source::{RetryableError, SourceError, SourceErrorKind};

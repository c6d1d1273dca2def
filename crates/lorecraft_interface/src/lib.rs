//! Trait definitions for the Lorecraft world-book generation engine.
//!
//! This crate provides the generation driver trait, the host traits the
//! embedding application implements, and the progress/report types the
//! orchestrator publishes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod host;
mod progress;
mod report;
mod traits;

pub use host::{CharacterHost, LorebookHost};
pub use progress::{GenerationPhase, ProgressEvent, Severity, StageKind};
pub use report::{RunReport, TaskReport};
pub use traits::LorecraftDriver;

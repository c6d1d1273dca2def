//! Progress reporting types.
//!
//! The orchestrator publishes `ProgressEvent`s on a broadcast channel
//! instead of mutating shared state, so any number of observers can follow
//! a run without coupling to the pipeline internals.

use serde::{Deserialize, Serialize};

/// The four fixed generation stages, in execution order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
pub enum StageKind {
    /// Stage one: the foundational facts of the world
    #[strum(serialize = "Foundation")]
    Foundation,
    /// Stage two: plot outline entries building on the foundation
    #[strum(serialize = "Plot Outline")]
    PlotOutline,
    /// Stage three: detail entries fleshing out the world
    #[strum(serialize = "Detail")]
    Detail,
    /// Stage four: game-mechanics entries
    #[strum(serialize = "Mechanics")]
    Mechanics,
}

impl StageKind {
    /// One-based position of the stage in the pipeline.
    pub fn ordinal(&self) -> u8 {
        match self {
            StageKind::Foundation => 1,
            StageKind::PlotOutline => 2,
            StageKind::Detail => 3,
            StageKind::Mechanics => 4,
        }
    }
}

/// The phase a generation run is currently in.
///
/// `AwaitingManualRetry` is an explicit phase: the run is suspended after
/// exhausting automatic retries and will only continue when resumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GenerationPhase {
    /// No run in progress
    Idle,
    /// Breaking the core theme into per-stage instructions
    Decomposing,
    /// Executing tasks for a stage
    Stage(StageKind),
    /// Generating and binding the companion character card
    CharacterBinding,
    /// Suspended, waiting for a manual resume
    AwaitingManualRetry,
    /// Run completed successfully
    Finished,
    /// Run stopped on an unrecoverable error
    Failed,
}

impl GenerationPhase {
    /// Whether this phase terminates a run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, GenerationPhase::Finished | GenerationPhase::Failed)
    }
}

/// Severity of a progress event.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    strum::Display,
)]
pub enum Severity {
    /// Informational update
    Info,
    /// A step completed successfully
    Success,
    /// Something went wrong but the run continues
    Warning,
    /// The run has stopped
    Error,
}

/// A single progress update from a generation run.
///
/// Events carry a monotonically increasing sequence number so observers
/// joining late (or replaying a log) can order them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct ProgressEvent {
    /// Monotonically increasing sequence number within a run
    sequence: u64,
    /// The phase the run was in when the event was emitted
    phase: GenerationPhase,
    /// Human-readable message
    message: String,
    /// Event severity
    severity: Severity,
}

impl ProgressEvent {
    /// Create a new progress event.
    pub fn new(
        sequence: u64,
        phase: GenerationPhase,
        message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            sequence,
            phase,
            message: message.into(),
            severity,
        }
    }
}

//! Execution report types.
//!
//! Reports summarize a finished run for callers that want more than the
//! live progress stream.

use crate::StageKind;
use serde::{Deserialize, Serialize};

/// Outcome of a single generation task within a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct TaskReport {
    /// The stage this task belonged to
    stage: StageKind,
    /// One-based task index within the stage
    index: u32,
    /// Total tasks planned for the stage
    total: u32,
    /// Attempts consumed across all retry rounds
    attempts: u32,
    /// Number of entries persisted from this task
    entries_created: usize,
}

impl TaskReport {
    /// Create a new task report.
    pub fn new(
        stage: StageKind,
        index: u32,
        total: u32,
        attempts: u32,
        entries_created: usize,
    ) -> Self {
        Self {
            stage,
            index,
            total,
            attempts,
            entries_created,
        }
    }
}

/// Summary of a completed generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct RunReport {
    /// Name of the generated lorebook
    book_name: String,
    /// Per-task outcomes in execution order
    tasks: Vec<TaskReport>,
    /// Whether the companion character card was created and bound
    character_bound: bool,
}

impl RunReport {
    /// Create a new run report.
    pub fn new(book_name: impl Into<String>, tasks: Vec<TaskReport>, character_bound: bool) -> Self {
        Self {
            book_name: book_name.into(),
            tasks,
            character_bound,
        }
    }

    /// Total entries persisted across all tasks.
    pub fn total_entries(&self) -> usize {
        self.tasks.iter().map(|t| t.entries_created).sum()
    }
}

//! Stage pipeline definitions.
//!
//! The pipeline always runs the same four stages in order. What varies per
//! run is the instruction list the decomposer produced for each stage and
//! how many tasks the user asked each stage to perform.

use crate::template::{PromptTemplate, templates};
use lorecraft_error::{GenerationError, GenerationErrorKind, LorecraftResult};
use lorecraft_interface::StageKind;
use serde::{Deserialize, Serialize};

/// Per-stage instruction lists produced by theme decomposition.
///
/// The `stageN_instruction` aliases accept the field names older planner
/// prompts emitted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StagePlan {
    /// Foundation stage instructions
    #[serde(default, alias = "stage1_instruction")]
    pub foundation: Vec<String>,
    /// Plot outline stage instructions
    #[serde(default, alias = "stage2_instruction")]
    pub plot_outline: Vec<String>,
    /// Detail stage instructions
    #[serde(default, alias = "stage3_instruction")]
    pub detail: Vec<String>,
    /// Mechanics stage instructions
    #[serde(default, alias = "stage4_instruction")]
    pub mechanics: Vec<String>,
}

impl StagePlan {
    /// Validate the plan.
    ///
    /// Only the foundation list is required: a world with no foundation is
    /// unusable, while later stages may legitimately be empty (they are
    /// then skipped).
    ///
    /// # Errors
    ///
    /// Returns `BadPlan` if the foundation instruction list is empty.
    pub fn validate(&self) -> LorecraftResult<()> {
        if self.foundation.is_empty() {
            return Err(GenerationError::new(GenerationErrorKind::BadPlan(
                "decomposer returned no foundation instructions".to_string(),
            ))
            .into());
        }
        Ok(())
    }

    /// Instructions for a given stage.
    pub fn instructions(&self, kind: StageKind) -> &[String] {
        match kind {
            StageKind::Foundation => &self.foundation,
            StageKind::PlotOutline => &self.plot_outline,
            StageKind::Detail => &self.detail,
            StageKind::Mechanics => &self.mechanics,
        }
    }
}

/// How many generation tasks each stage runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCounts {
    /// Foundation task count
    pub foundation: u32,
    /// Plot outline task count
    pub plot_outline: u32,
    /// Detail task count
    pub detail: u32,
    /// Mechanics task count
    pub mechanics: u32,
}

impl Default for StageCounts {
    fn default() -> Self {
        Self {
            foundation: 1,
            plot_outline: 1,
            detail: 1,
            mechanics: 1,
        }
    }
}

impl StageCounts {
    /// Count for a given stage.
    pub fn count(&self, kind: StageKind) -> u32 {
        match kind {
            StageKind::Foundation => self.foundation,
            StageKind::PlotOutline => self.plot_outline,
            StageKind::Detail => self.detail,
            StageKind::Mechanics => self.mechanics,
        }
    }
}

/// A single generation task within a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTask {
    /// The stage this task belongs to
    pub stage: StageKind,
    /// One-based index within the stage
    pub index: u32,
    /// Total tasks planned for the stage
    pub count: u32,
    /// The creative brief for this task
    pub instruction: String,
}

impl GenerationTask {
    /// Display name used in progress messages and retry prompts.
    pub fn display_name(&self) -> String {
        format!("Stage {} ({}/{})", self.stage, self.index, self.count)
    }
}

/// A runnable stage: its kind, template, and planned tasks.
#[derive(Debug, Clone)]
pub struct Stage {
    kind: StageKind,
    count: u32,
    instructions: Vec<String>,
}

impl Stage {
    /// Build the four pipeline stages from a validated plan and counts.
    pub fn pipeline(plan: &StagePlan, counts: &StageCounts) -> Vec<Stage> {
        [
            StageKind::Foundation,
            StageKind::PlotOutline,
            StageKind::Detail,
            StageKind::Mechanics,
        ]
        .into_iter()
        .map(|kind| Stage {
            kind,
            count: counts.count(kind),
            instructions: plan.instructions(kind).to_vec(),
        })
        .collect()
    }

    /// The stage kind.
    pub fn kind(&self) -> StageKind {
        self.kind
    }

    /// Whether this stage should be skipped entirely.
    ///
    /// A stage with no instructions produces no tasks, regardless of the
    /// requested count.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// The prompt template for this stage, preamble included.
    pub fn template(&self) -> PromptTemplate {
        let text = match self.kind {
            StageKind::Foundation => templates::FOUNDATION,
            StageKind::PlotOutline => templates::PLOT_OUTLINE,
            StageKind::Detail => templates::DETAIL,
            StageKind::Mechanics => templates::MECHANICS,
        };
        PromptTemplate::with_preamble(text)
    }

    /// The tasks this stage will run, in order.
    ///
    /// When the plan supplied fewer instructions than the requested count,
    /// the last instruction is reused for the remaining tasks.
    pub fn tasks(&self) -> Vec<GenerationTask> {
        if self.is_empty() {
            return Vec::new();
        }

        (0..self.count)
            .map(|i| {
                let instruction = self
                    .instructions
                    .get(i as usize)
                    .or_else(|| self.instructions.last())
                    .cloned()
                    .unwrap_or_default();
                GenerationTask {
                    stage: self.kind,
                    index: i + 1,
                    count: self.count,
                    instruction,
                }
            })
            .collect()
    }
}

//! Automated world-book generation pipeline.
//!
//! This crate drives the full generation run: theme decomposition, the four
//! fixed content stages, retry handling with manual escalation, credit
//! gating, and best-effort character binding. Hosts supply storage and
//! generation backends through the `lorecraft_interface` traits.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod character;
mod credits;
mod extraction;
mod orchestrator;
mod retry;
mod sanitize;
mod stages;
mod state;
mod template;

pub use character::{DEFAULT_CHARACTER_PROMPT, bind_character};
pub use credits::{CreditGate, CreditLedger, INITIAL_GRANT};
pub use extraction::{extract_json, heal_content_newlines, parse_entries, parse_json};
pub use orchestrator::{GenerationRequest, Orchestrator, OrchestratorBuilder, RunState};
pub use retry::{ManualGate, RetryContext, RetryEvent, RetryExecutor, RetryPolicy};
pub use sanitize::sanitize_entry;
pub use stages::{GenerationTask, Stage, StageCounts, StagePlan};
pub use state::{StateScope, StateStore, StoreData};
pub use template::{PromptTemplate, TemplateParams, templates};

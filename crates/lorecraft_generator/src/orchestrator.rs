//! The generation run orchestrator.
//!
//! A run is a single automated pass: decompose the theme into per-stage
//! instructions, execute the four content stages in order, then bind a
//! companion character. Observers follow the run through a broadcast event
//! stream and a watch channel carrying the current phase, and a suspended
//! run is controlled through the executor's manual gate.

use crate::character::bind_character;
use crate::extraction::{parse_entries, parse_json};
use crate::retry::{ManualGate, RetryEvent, RetryExecutor, RetryPolicy};
use crate::stages::{Stage, StageCounts, StagePlan};
use crate::state::{StateScope, StateStore};
use crate::template::{PromptTemplate, TemplateParams, templates};
use lorecraft_core::GenerateRequest;
use lorecraft_error::{ConfigError, GenerationError, GenerationErrorKind, LorecraftResult};
use lorecraft_interface::{
    CharacterHost, GenerationPhase, LorebookHost, LorecraftDriver, ProgressEvent, RunReport,
    Severity, TaskReport,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::{broadcast, watch};
use tracing::{info, warn};

const EVENT_CAPACITY: usize = 256;
const DEFAULT_MAX_TOKENS: u32 = 60_000;
const LAST_BOOK_KEY: &str = "last_book_name";

/// Parameters for one generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Name of the lorebook to create and fill
    pub book_name: String,
    /// The core theme the world is built around
    pub core_theme: String,
    /// How many tasks each stage runs
    pub stage_counts: StageCounts,
    /// Optional brief for the companion character
    pub character_prompt: Option<String>,
}

impl GenerationRequest {
    /// A request with default stage counts and no character brief.
    pub fn new(book_name: impl Into<String>, core_theme: impl Into<String>) -> Self {
        Self {
            book_name: book_name.into(),
            core_theme: core_theme.into(),
            stage_counts: StageCounts::default(),
            character_prompt: None,
        }
    }

    fn validate(&self) -> LorecraftResult<()> {
        if self.book_name.trim().is_empty() {
            return Err(GenerationError::new(GenerationErrorKind::EmptyBookName).into());
        }
        if self.core_theme.trim().is_empty() {
            return Err(GenerationError::new(GenerationErrorKind::EmptyTheme).into());
        }
        Ok(())
    }
}

/// Observer handle for a running orchestrator.
///
/// Clones are cheap and share the underlying channels, so a control surface
/// can hold one while a logger holds another.
#[derive(Debug, Clone)]
pub struct RunState {
    phase: watch::Receiver<GenerationPhase>,
    gate: ManualGate,
}

impl RunState {
    /// The current phase.
    pub fn phase(&self) -> GenerationPhase {
        *self.phase.borrow()
    }

    /// Resume a run suspended in `AwaitingManualRetry`.
    pub fn resume(&self) {
        self.gate.resume();
    }

    /// Abort the run. Takes effect at the next suspension point.
    pub fn abort(&self) {
        self.gate.abort();
    }

    /// Wait until the run reaches a terminal phase and return it.
    pub async fn wait_until_terminal(&mut self) -> GenerationPhase {
        loop {
            let current = *self.phase.borrow_and_update();
            if current.is_terminal() {
                return current;
            }
            if self.phase.changed().await.is_err() {
                return *self.phase.borrow();
            }
        }
    }
}

/// Builder for [`Orchestrator`].
#[derive(Default)]
pub struct OrchestratorBuilder {
    driver: Option<Arc<dyn LorecraftDriver>>,
    lorebooks: Option<Arc<dyn LorebookHost>>,
    characters: Option<Arc<dyn CharacterHost>>,
    policy: Option<RetryPolicy>,
    store: Option<StateStore>,
    max_tokens: Option<u32>,
}

impl OrchestratorBuilder {
    /// The generation driver, already wrapped in whatever gating the
    /// caller wants (see `CreditGate`).
    pub fn driver(mut self, driver: Arc<dyn LorecraftDriver>) -> Self {
        self.driver = Some(driver);
        self
    }

    /// The lorebook storage host.
    pub fn lorebooks(mut self, host: Arc<dyn LorebookHost>) -> Self {
        self.lorebooks = Some(host);
        self
    }

    /// The character creation host.
    pub fn characters(mut self, host: Arc<dyn CharacterHost>) -> Self {
        self.characters = Some(host);
        self
    }

    /// Retry policy for pipeline tasks. Defaults to ten attempts with a
    /// two second delay.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// State store for run memory. Without one, nothing is remembered
    /// between runs.
    pub fn state_store(mut self, store: StateStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Token budget per model call.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Build the orchestrator.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the driver or either host is
    /// missing.
    pub fn build(self) -> LorecraftResult<Orchestrator> {
        let driver = self
            .driver
            .ok_or_else(|| ConfigError::new("Orchestrator requires a driver"))?;
        let lorebooks = self
            .lorebooks
            .ok_or_else(|| ConfigError::new("Orchestrator requires a lorebook host"))?;
        let characters = self
            .characters
            .ok_or_else(|| ConfigError::new("Orchestrator requires a character host"))?;

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (phase, _) = watch::channel(GenerationPhase::Idle);

        Ok(Orchestrator {
            driver,
            lorebooks,
            characters,
            retry: RetryExecutor::new(self.policy.unwrap_or_default(), ManualGate::new()),
            store: self.store,
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            events,
            phase,
            sequence: AtomicU64::new(0),
            running: AtomicBool::new(false),
        })
    }
}

/// Drives complete generation runs.
pub struct Orchestrator {
    driver: Arc<dyn LorecraftDriver>,
    lorebooks: Arc<dyn LorebookHost>,
    characters: Arc<dyn CharacterHost>,
    retry: RetryExecutor,
    store: Option<StateStore>,
    max_tokens: u32,
    events: broadcast::Sender<ProgressEvent>,
    phase: watch::Sender<GenerationPhase>,
    sequence: AtomicU64,
    running: AtomicBool,
}

impl Orchestrator {
    /// Start building an orchestrator.
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::default()
    }

    /// Subscribe to the progress event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.events.subscribe()
    }

    /// An observer handle for phase watching and run control.
    pub fn state(&self) -> RunState {
        RunState {
            phase: self.phase.subscribe(),
            gate: self.retry.gate().clone(),
        }
    }

    fn emit(&self, phase: GenerationPhase, severity: Severity, message: impl Into<String>) {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        // Send fails only when no one is listening, which is fine.
        let _ = self
            .events
            .send(ProgressEvent::new(sequence, phase, message, severity));
    }

    fn set_phase(&self, phase: GenerationPhase) {
        // send_replace stores the value even with no receivers, so a
        // handle created after a transition still reads the current phase.
        self.phase.send_replace(phase);
    }

    fn retry_observer(&self, active_phase: GenerationPhase) -> impl FnMut(RetryEvent) + '_ {
        move |event| match event {
            RetryEvent::AttemptFailed(ctx) => {
                self.emit(
                    active_phase,
                    Severity::Warning,
                    format!(
                        "{} failed (attempt {}/{}): {}",
                        ctx.task_name, ctx.attempt, ctx.max_attempts, ctx.last_error
                    ),
                );
            }
            RetryEvent::AwaitingManual(ctx) => {
                self.set_phase(GenerationPhase::AwaitingManualRetry);
                self.emit(
                    GenerationPhase::AwaitingManualRetry,
                    Severity::Warning,
                    format!(
                        "{} exhausted {} automatic attempts, waiting for manual resume",
                        ctx.task_name, ctx.max_attempts
                    ),
                );
            }
            RetryEvent::Resumed { task_name } => {
                self.set_phase(active_phase);
                self.emit(
                    active_phase,
                    Severity::Info,
                    format!("Resuming {}", task_name),
                );
            }
        }
    }

    /// Run the full generation pipeline.
    ///
    /// Validation happens before any side effect: an empty book name or
    /// theme fails without touching the host. Only one run may be active
    /// at a time.
    ///
    /// # Errors
    ///
    /// Fails on invalid input, `AlreadyRunning`, an abort, or a host
    /// storage failure. Character binding failures do not fail the run.
    #[tracing::instrument(skip(self, request), fields(book = %request.book_name))]
    pub async fn run(&self, request: GenerationRequest) -> LorecraftResult<RunReport> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(GenerationError::new(GenerationErrorKind::AlreadyRunning).into());
        }

        let result = self.execute(&request).await;
        self.running.store(false, Ordering::SeqCst);

        if let Err(e) = &result {
            self.set_phase(GenerationPhase::Failed);
            self.emit(
                GenerationPhase::Failed,
                Severity::Error,
                format!("Generation run failed: {}", e),
            );
        }

        result
    }

    async fn execute(&self, request: &GenerationRequest) -> LorecraftResult<RunReport> {
        request.validate()?;

        self.sequence.store(0, Ordering::SeqCst);
        let book_name = request.book_name.trim();

        self.set_phase(GenerationPhase::Decomposing);
        self.emit(
            GenerationPhase::Decomposing,
            Severity::Info,
            format!("Starting generation run for '{}'", book_name),
        );

        self.lorebooks.create_lorebook(book_name).await?;
        self.remember_last_book(book_name);

        let plan = self.decompose(request).await?;

        let mut reports = Vec::new();
        for stage in Stage::pipeline(&plan, &request.stage_counts) {
            if stage.is_empty() {
                self.emit(
                    GenerationPhase::Stage(stage.kind()),
                    Severity::Info,
                    format!("Stage {} has no instructions, skipping", stage.kind()),
                );
                continue;
            }

            let phase = GenerationPhase::Stage(stage.kind());
            self.set_phase(phase);
            self.emit(
                phase,
                Severity::Info,
                format!("Starting stage {}", stage.kind()),
            );

            let template = stage.template();
            for task in stage.tasks() {
                let report = self
                    .run_task(book_name, phase, &template, &task)
                    .await?;
                reports.push(report);
            }
        }

        let character_bound = self.bind(book_name, request).await;

        self.set_phase(GenerationPhase::Finished);
        let report = RunReport::new(book_name, reports, character_bound);
        self.emit(
            GenerationPhase::Finished,
            Severity::Success,
            format!(
                "Generation run finished: {} entries in '{}'",
                report.total_entries(),
                book_name
            ),
        );
        info!(
            entries = report.total_entries(),
            character_bound, "Generation run finished"
        );

        Ok(report)
    }

    async fn decompose(&self, request: &GenerationRequest) -> LorecraftResult<StagePlan> {
        let counts = &request.stage_counts;
        let prompt = PromptTemplate::new(templates::DECOMPOSER).render(
            &TemplateParams::new().core_theme(request.core_theme.trim()).stage_counts(
                counts.foundation,
                counts.plot_outline,
                counts.detail,
                counts.mechanics,
            ),
        )?;

        let (plan, _) = self
            .retry
            .run(
                "Theme decomposition",
                self.retry_observer(GenerationPhase::Decomposing),
                || {
                    let driver = self.driver.clone();
                    let prompt = prompt.clone();
                    let max_tokens = self.max_tokens;
                    async move {
                        let response = driver
                            .generate(&GenerateRequest::from_prompt(prompt, max_tokens))
                            .await?;
                        let plan: StagePlan = parse_json(&response.text())?;
                        plan.validate()?;
                        Ok(plan)
                    }
                },
            )
            .await?;

        self.emit(
            GenerationPhase::Decomposing,
            Severity::Success,
            "Theme decomposed into stage instructions",
        );
        Ok(plan)
    }

    async fn run_task(
        &self,
        book_name: &str,
        phase: GenerationPhase,
        template: &PromptTemplate,
        task: &crate::stages::GenerationTask,
    ) -> LorecraftResult<TaskReport> {
        let name = task.display_name();
        self.emit(phase, Severity::Info, format!("Starting {}", name));

        // Entries are fetched inside the retry boundary so a retried task
        // sees everything persisted since its last attempt.
        let (entries, attempts) = self
            .retry
            .run(&name, self.retry_observer(phase), || {
                let lorebooks = self.lorebooks.clone();
                let driver = self.driver.clone();
                let template = template.clone();
                let book_name = book_name.to_string();
                let instruction = task.instruction.clone();
                let max_tokens = self.max_tokens;
                async move {
                    let current = lorebooks.entries(&book_name).await?;
                    let prompt = template.render(
                        &TemplateParams::new()
                            .book_name(&book_name)
                            .instruction(&instruction)
                            .entries(&current)
                            .with_defaults(),
                    )?;
                    let response = driver
                        .generate(&GenerateRequest::from_prompt(prompt, max_tokens))
                        .await?;
                    parse_entries(&response.text())
                }
            })
            .await?;

        // Persistence stays outside the retry boundary: once entries are
        // parsed the task cannot be re-run, only the storage call can fail
        // the run.
        for entry in &entries {
            self.lorebooks.create_entry(book_name, entry).await?;
        }

        self.emit(
            phase,
            Severity::Success,
            format!("{} created {} entries", name, entries.len()),
        );

        Ok(TaskReport::new(
            task.stage,
            task.index,
            task.count,
            attempts,
            entries.len(),
        ))
    }

    async fn bind(&self, book_name: &str, request: &GenerationRequest) -> bool {
        self.set_phase(GenerationPhase::CharacterBinding);
        self.emit(
            GenerationPhase::CharacterBinding,
            Severity::Info,
            "Creating companion character",
        );

        match bind_character(
            self.driver.as_ref(),
            self.lorebooks.as_ref(),
            self.characters.as_ref(),
            book_name,
            request.character_prompt.as_deref(),
            self.max_tokens,
        )
        .await
        {
            Ok(id) => {
                self.emit(
                    GenerationPhase::CharacterBinding,
                    Severity::Success,
                    format!("Created character '{}'", id),
                );
                true
            }
            Err(e) => {
                warn!(error = %e, "Character binding failed, lorebook is still complete");
                self.emit(
                    GenerationPhase::CharacterBinding,
                    Severity::Warning,
                    format!("Character creation failed: {}. The lorebook is complete.", e),
                );
                false
            }
        }
    }

    fn remember_last_book(&self, book_name: &str) {
        let Some(store) = &self.store else {
            return;
        };
        let result = store.load(&StateScope::RunMemory).and_then(|mut data| {
            data.set(LAST_BOOK_KEY, book_name);
            store.save(&StateScope::RunMemory, &data)
        });
        if let Err(e) = result {
            warn!(error = %e, "Failed to remember last book name");
        }
    }

    /// The most recently generated book name, if remembered.
    pub fn last_book_name(&self) -> Option<String> {
        let store = self.store.as_ref()?;
        store
            .load(&StateScope::RunMemory)
            .ok()?
            .get(LAST_BOOK_KEY)
            .map(str::to_string)
    }
}

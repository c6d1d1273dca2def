//! End-to-end pipeline tests against scripted drivers and in-memory hosts.

use async_trait::async_trait;
use lorecraft_core::{CharacterCard, GenerateRequest, GenerateResponse, LoreEntry, Output};
use lorecraft_error::{GenerationError, GenerationErrorKind, LorecraftResult};
use lorecraft_generator::{
    CreditGate, CreditLedger, GenerationRequest, INITIAL_GRANT, Orchestrator, RetryPolicy,
    StageCounts, StateStore,
};
use lorecraft_interface::{
    CharacterHost, GenerationPhase, LorebookHost, LorecraftDriver, Severity,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const PLAN: &str = r#"{
    "foundation": ["Describe the geography and history."],
    "plot_outline": ["Outline the central conflict."],
    "detail": [],
    "mechanics": ["Define the corruption mechanic."]
}"#;

const ENTRIES: &str = r#"[
    {"keys": ["Ironhold"], "comment": "Ironhold", "content": "A fortress city on the rim."},
    {"keys": ["The Rift"], "comment": "The Rift", "content": "The wound in the world."}
]"#;

const CARD: &str = r#"{
    "name": "The Archivist",
    "description": "Keeper and narrator of the realms.",
    "first_mes": "Welcome, traveler."
}"#;

/// Answers by prompt kind: the planner prompt gets a plan, the character
/// prompt gets a card, everything else gets an entry array.
struct ScriptedDriver {
    calls: AtomicU32,
    /// Calls to fail before succeeding, per-call counter shared across kinds
    fail_first: u32,
    character_reply: String,
}

impl ScriptedDriver {
    fn new() -> Self {
        Self {
            calls: AtomicU32::new(0),
            fail_first: 0,
            character_reply: CARD.to_string(),
        }
    }

    fn failing_first(fail_first: u32) -> Self {
        Self {
            fail_first,
            ..Self::new()
        }
    }

    fn with_character_reply(reply: &str) -> Self {
        Self {
            character_reply: reply.to_string(),
            ..Self::new()
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LorecraftDriver for ScriptedDriver {
    async fn generate(&self, request: &GenerateRequest) -> LorecraftResult<GenerateResponse> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.fail_first {
            return Err(
                GenerationError::new(GenerationErrorKind::BadPlan("scripted failure".to_string()))
                    .into(),
            );
        }

        let prompt = request.messages[0]
            .content
            .iter()
            .filter_map(|i| i.as_text())
            .collect::<String>();

        let reply = if prompt.contains("master planner") {
            PLAN.to_string()
        } else if prompt.contains("director") {
            self.character_reply.clone()
        } else {
            ENTRIES.to_string()
        };

        Ok(GenerateResponse {
            outputs: vec![Output::Text(reply)],
        })
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-1"
    }
}

#[derive(Default)]
struct MemoryHost {
    books: Mutex<HashMap<String, Vec<LoreEntry>>>,
    characters: Mutex<Vec<CharacterCard>>,
}

impl MemoryHost {
    fn entry_count(&self, name: &str) -> usize {
        self.books
            .lock()
            .unwrap()
            .get(name)
            .map(|e| e.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl LorebookHost for MemoryHost {
    async fn list_lorebooks(&self) -> LorecraftResult<Vec<String>> {
        Ok(self.books.lock().unwrap().keys().cloned().collect())
    }

    async fn create_lorebook(&self, name: &str) -> LorecraftResult<()> {
        self.books
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default();
        Ok(())
    }

    async fn entries(&self, name: &str) -> LorecraftResult<Vec<LoreEntry>> {
        Ok(self
            .books
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_entry(&self, name: &str, entry: &LoreEntry) -> LorecraftResult<()> {
        self.books
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default()
            .push(entry.clone());
        Ok(())
    }

    async fn delete_lorebook(&self, name: &str) -> LorecraftResult<()> {
        self.books.lock().unwrap().remove(name);
        Ok(())
    }
}

#[async_trait]
impl CharacterHost for MemoryHost {
    async fn create_character(&self, card: &CharacterCard) -> LorecraftResult<String> {
        self.characters.lock().unwrap().push(card.clone());
        Ok(format!("{}.png", card.name))
    }
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 2,
        delay: Duration::from_millis(1),
    }
}

fn build(driver: Arc<dyn LorecraftDriver>, host: Arc<MemoryHost>) -> Orchestrator {
    Orchestrator::builder()
        .driver(driver)
        .lorebooks(host.clone())
        .characters(host)
        .retry_policy(fast_policy())
        .build()
        .unwrap()
}

#[tokio::test]
async fn full_run_persists_entries_and_binds_character() {
    let driver = Arc::new(ScriptedDriver::new());
    let host = Arc::new(MemoryHost::default());
    let orchestrator = build(driver.clone(), host.clone());

    let mut events = orchestrator.subscribe();
    let report = orchestrator
        .run(GenerationRequest::new("Shattered Realms", "floating islands"))
        .await
        .unwrap();

    // Three non-empty stages at one task each, two entries per task.
    assert_eq!(report.tasks().len(), 3);
    assert_eq!(report.total_entries(), 6);
    assert!(report.character_bound());
    assert_eq!(host.entry_count("Shattered Realms"), 6);

    // Character card is bound to the book, not the model's invented name.
    let characters = host.characters.lock().unwrap();
    assert_eq!(characters.len(), 1);
    assert_eq!(characters[0].name, "Shattered Realms");
    assert_eq!(characters[0].world, "Shattered Realms");
    assert_eq!(characters[0].first_mes, "Welcome, traveler.");

    // One planner call, three stage calls, one character call.
    assert_eq!(driver.calls(), 5);

    // The event stream carries ordered sequence numbers and ends in success.
    let mut last_seq = 0;
    let mut saw_success = false;
    while let Ok(event) = events.try_recv() {
        assert!(*event.sequence() > last_seq);
        last_seq = *event.sequence();
        if *event.severity() == Severity::Success && *event.phase() == GenerationPhase::Finished {
            saw_success = true;
        }
    }
    assert!(saw_success);
}

#[tokio::test]
async fn empty_stage_is_skipped() {
    let driver = Arc::new(ScriptedDriver::new());
    let host = Arc::new(MemoryHost::default());
    let orchestrator = build(driver, host);

    let report = orchestrator
        .run(GenerationRequest::new("Realms", "a theme"))
        .await
        .unwrap();

    // The plan has no detail instructions, so no detail task ran.
    assert!(
        report
            .tasks()
            .iter()
            .all(|t| *t.stage() != lorecraft_interface::StageKind::Detail)
    );
}

#[tokio::test]
async fn stage_counts_multiply_tasks() {
    let driver = Arc::new(ScriptedDriver::new());
    let host = Arc::new(MemoryHost::default());
    let orchestrator = build(driver, host.clone());

    let mut request = GenerationRequest::new("Realms", "a theme");
    request.stage_counts = StageCounts {
        foundation: 3,
        ..StageCounts::default()
    };
    let report = orchestrator.run(request).await.unwrap();

    // 3 foundation tasks + 1 plot outline + 1 mechanics.
    assert_eq!(report.tasks().len(), 5);
    assert_eq!(host.entry_count("Realms"), 10);
}

#[tokio::test]
async fn exhausted_retries_suspend_and_resume_completes_the_run() {
    // Fail the first three calls: the planner round of two is exhausted,
    // the run suspends, and the resumed round fails once more before
    // succeeding.
    let driver = Arc::new(ScriptedDriver::failing_first(3));
    let host = Arc::new(MemoryHost::default());
    let orchestrator = Arc::new(build(driver, host.clone()));

    let mut state = orchestrator.state();
    let handle = tokio::spawn({
        let orchestrator = orchestrator.clone();
        async move {
            orchestrator
                .run(GenerationRequest::new("Realms", "a theme"))
                .await
        }
    });

    // Wait for the suspension, then resume.
    loop {
        tokio::time::sleep(Duration::from_millis(5)).await;
        if state.phase() == GenerationPhase::AwaitingManualRetry {
            break;
        }
    }
    state.resume();

    let report = handle.await.unwrap().unwrap();
    assert_eq!(report.total_entries(), 6);
    assert_eq!(state.wait_until_terminal().await, GenerationPhase::Finished);
}

#[tokio::test]
async fn abort_fails_a_suspended_run() {
    let driver = Arc::new(ScriptedDriver::failing_first(u32::MAX));
    let host = Arc::new(MemoryHost::default());
    let orchestrator = Arc::new(build(driver, host));

    let mut state = orchestrator.state();
    let handle = tokio::spawn({
        let orchestrator = orchestrator.clone();
        async move {
            orchestrator
                .run(GenerationRequest::new("Realms", "a theme"))
                .await
        }
    });

    loop {
        tokio::time::sleep(Duration::from_millis(5)).await;
        if state.phase() == GenerationPhase::AwaitingManualRetry {
            break;
        }
    }
    state.abort();

    assert!(handle.await.unwrap().is_err());
    assert_eq!(state.wait_until_terminal().await, GenerationPhase::Failed);
}

#[tokio::test]
async fn second_run_is_rejected_while_one_is_active() {
    let driver = Arc::new(ScriptedDriver::failing_first(u32::MAX));
    let host = Arc::new(MemoryHost::default());
    let orchestrator = Arc::new(build(driver, host));

    let state = orchestrator.state();
    let handle = tokio::spawn({
        let orchestrator = orchestrator.clone();
        async move {
            orchestrator
                .run(GenerationRequest::new("Realms", "a theme"))
                .await
        }
    });

    loop {
        tokio::time::sleep(Duration::from_millis(5)).await;
        if state.phase() == GenerationPhase::AwaitingManualRetry {
            break;
        }
    }

    let second = orchestrator
        .run(GenerationRequest::new("Other", "theme"))
        .await;
    assert!(second.is_err());

    state.abort();
    let _ = handle.await.unwrap();
}

#[tokio::test]
async fn character_binding_failure_does_not_fail_the_run() {
    let driver = Arc::new(ScriptedDriver::with_character_reply(
        "I refuse to produce JSON today.",
    ));
    let host = Arc::new(MemoryHost::default());
    let orchestrator = build(driver, host.clone());

    let report = orchestrator
        .run(GenerationRequest::new("Realms", "a theme"))
        .await
        .unwrap();

    assert!(!report.character_bound());
    assert_eq!(report.total_entries(), 6);
    assert!(host.characters.lock().unwrap().is_empty());
}

#[tokio::test]
async fn credit_gate_charges_per_call_and_refunds_failures() {
    let dir = std::env::temp_dir().join("lorecraft_pipeline_credits_test");
    std::fs::remove_dir_all(&dir).ok();
    let ledger = CreditLedger::open(StateStore::new(&dir).unwrap()).unwrap();

    // One failing call gets refunded; the five successful calls are paid.
    let driver = Arc::new(CreditGate::new(ScriptedDriver::failing_first(1), ledger.clone()));
    let host = Arc::new(MemoryHost::default());
    let orchestrator = build(driver, host);

    orchestrator
        .run(GenerationRequest::new("Realms", "a theme"))
        .await
        .unwrap();

    assert_eq!(ledger.balance(), INITIAL_GRANT - 5);
    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn run_remembers_last_book_name() {
    let dir = std::env::temp_dir().join("lorecraft_pipeline_memory_test");
    std::fs::remove_dir_all(&dir).ok();

    let driver = Arc::new(ScriptedDriver::new());
    let host = Arc::new(MemoryHost::default());
    let orchestrator = Orchestrator::builder()
        .driver(driver)
        .lorebooks(host.clone())
        .characters(host)
        .retry_policy(fast_policy())
        .state_store(StateStore::new(&dir).unwrap())
        .build()
        .unwrap();

    orchestrator
        .run(GenerationRequest::new("Shattered Realms", "a theme"))
        .await
        .unwrap();

    assert_eq!(
        orchestrator.last_book_name().as_deref(),
        Some("Shattered Realms")
    );
    std::fs::remove_dir_all(&dir).ok();
}

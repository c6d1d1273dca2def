//! Task retry with manual escalation.
//!
//! Every remote task in the pipeline runs under the same policy: a round
//! of automatic attempts with a fixed delay between them, and when a round
//! is exhausted the run suspends until someone resumes it. Resuming starts
//! a fresh round with the counter reset, so a task is never abandoned
//! automatically.

use lorecraft_error::{GenerationError, GenerationErrorKind, LorecraftResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{info, warn};

/// Retry policy for pipeline tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per round before escalating to manual retry
    pub max_attempts: u32,
    /// Fixed delay between attempts within a round
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            delay: Duration::from_secs(2),
        }
    }
}

/// Where a task currently stands in its retry lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryContext {
    /// Task display name
    pub task_name: String,
    /// Attempt number within the current round (1-based)
    pub attempt: u32,
    /// Attempts allowed per round
    pub max_attempts: u32,
    /// Message of the most recent failure
    pub last_error: String,
}

/// Events the executor reports while running a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryEvent {
    /// An attempt failed; another automatic attempt follows
    AttemptFailed(RetryContext),
    /// The round is exhausted; the run is suspended until resumed
    AwaitingManual(RetryContext),
    /// A manual resume arrived; a fresh round begins
    Resumed {
        /// Task display name
        task_name: String,
    },
}

#[derive(Debug, Default)]
struct GateInner {
    notify: Notify,
    aborted: AtomicBool,
}

/// Handle used to resume or abort a suspended run.
///
/// Clones share state, so the handle can be given to a UI or control
/// surface while the orchestrator holds its own copy.
#[derive(Debug, Clone, Default)]
pub struct ManualGate {
    inner: Arc<GateInner>,
}

impl ManualGate {
    /// Create a new gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume a suspended task for another round of attempts.
    ///
    /// A resume issued while nothing is suspended is banked and consumed
    /// by the next suspension.
    pub fn resume(&self) {
        self.inner.notify.notify_one();
    }

    /// Abort the run. A suspended task fails with `Aborted` instead of
    /// waiting forever.
    pub fn abort(&self) {
        self.inner.aborted.store(true, Ordering::SeqCst);
        self.inner.notify.notify_one();
    }

    /// Whether the gate has been aborted.
    pub fn is_aborted(&self) -> bool {
        self.inner.aborted.load(Ordering::SeqCst)
    }

    async fn wait(&self) -> LorecraftResult<()> {
        if self.is_aborted() {
            return Err(GenerationError::new(GenerationErrorKind::Aborted).into());
        }
        self.inner.notify.notified().await;
        if self.is_aborted() {
            return Err(GenerationError::new(GenerationErrorKind::Aborted).into());
        }
        Ok(())
    }
}

/// Runs pipeline tasks under the retry policy.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    gate: ManualGate,
}

impl RetryExecutor {
    /// Create an executor with the given policy and gate.
    pub fn new(policy: RetryPolicy, gate: ManualGate) -> Self {
        Self { policy, gate }
    }

    /// The gate for this executor.
    pub fn gate(&self) -> &ManualGate {
        &self.gate
    }

    /// Run an operation until it succeeds.
    ///
    /// Returns the operation's value and the total number of attempts
    /// consumed across all rounds.
    ///
    /// # Errors
    ///
    /// The only error path is `Aborted`: without an abort, exhausted
    /// rounds suspend on the gate indefinitely.
    #[tracing::instrument(skip(self, observer, operation), fields(task = %task_name))]
    pub async fn run<T, F, Fut>(
        &self,
        task_name: &str,
        mut observer: impl FnMut(RetryEvent),
        mut operation: F,
    ) -> LorecraftResult<(T, u32)>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = LorecraftResult<T>>,
    {
        let mut total_attempts = 0u32;

        loop {
            let mut last_error = String::new();

            for attempt in 1..=self.policy.max_attempts {
                total_attempts += 1;
                match operation().await {
                    Ok(value) => {
                        if total_attempts > 1 {
                            info!(attempts = total_attempts, "Task succeeded after retries");
                        }
                        return Ok((value, total_attempts));
                    }
                    Err(e) => {
                        last_error = e.to_string();
                        warn!(
                            attempt,
                            max_attempts = self.policy.max_attempts,
                            error = %last_error,
                            "Task attempt failed"
                        );
                        observer(RetryEvent::AttemptFailed(RetryContext {
                            task_name: task_name.to_string(),
                            attempt,
                            max_attempts: self.policy.max_attempts,
                            last_error: last_error.clone(),
                        }));
                        if attempt < self.policy.max_attempts {
                            tokio::time::sleep(self.policy.delay).await;
                        }
                    }
                }
            }

            warn!(
                max_attempts = self.policy.max_attempts,
                "Automatic retries exhausted, awaiting manual resume"
            );
            observer(RetryEvent::AwaitingManual(RetryContext {
                task_name: task_name.to_string(),
                attempt: self.policy.max_attempts,
                max_attempts: self.policy.max_attempts,
                last_error: last_error.clone(),
            }));

            self.gate.wait().await?;

            info!("Manual resume received, starting a fresh round");
            observer(RetryEvent::Resumed {
                task_name: task_name.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicU32;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            delay: Duration::from_millis(1),
        }
    }

    fn failing_times(failures: u32) -> impl FnMut() -> std::pin::Pin<Box<dyn Future<Output = LorecraftResult<u32>> + Send>> {
        let calls = Arc::new(AtomicU32::new(0));
        move || {
            let calls = calls.clone();
            Box::pin(async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n <= failures {
                    Err(GenerationError::new(GenerationErrorKind::BadPlan(format!(
                        "failure {}",
                        n
                    )))
                    .into())
                } else {
                    Ok(n)
                }
            })
        }
    }

    #[tokio::test]
    async fn succeeds_first_try() {
        let executor = RetryExecutor::new(fast_policy(10), ManualGate::new());
        let (value, attempts) = executor
            .run("test", |_| {}, failing_times(0))
            .await
            .unwrap();
        assert_eq!(value, 1);
        assert_eq!(attempts, 1);
    }

    #[tokio::test]
    async fn retries_until_success_within_round() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let observed = events.clone();
        let executor = RetryExecutor::new(fast_policy(10), ManualGate::new());
        let (_, attempts) = executor
            .run(
                "test",
                move |e| observed.lock().unwrap().push(e),
                failing_times(3),
            )
            .await
            .unwrap();
        assert_eq!(attempts, 4);
        let events = events.lock().unwrap();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], RetryEvent::AttemptFailed(_)));
    }

    #[tokio::test]
    async fn exhausted_round_suspends_until_resume() {
        let gate = ManualGate::new();
        let executor = RetryExecutor::new(fast_policy(3), gate.clone());
        let events = Arc::new(Mutex::new(Vec::new()));
        let observed = events.clone();

        // Fails 5 times: round of 3, suspend, then 2 more failures in the
        // next round before succeeding on its 6th call.
        let handle = tokio::spawn({
            let executor = executor.clone();
            async move {
                executor
                    .run(
                        "test",
                        move |e| observed.lock().unwrap().push(e),
                        failing_times(5),
                    )
                    .await
            }
        });

        // Wait until the task is suspended.
        loop {
            tokio::time::sleep(Duration::from_millis(5)).await;
            let snapshot = events.lock().unwrap();
            if snapshot
                .iter()
                .any(|e| matches!(e, RetryEvent::AwaitingManual(_)))
            {
                break;
            }
        }

        gate.resume();
        let (value, attempts) = handle.await.unwrap().unwrap();
        assert_eq!(value, 6);
        assert_eq!(attempts, 6);

        let events = events.lock().unwrap();
        assert!(events.iter().any(|e| matches!(e, RetryEvent::Resumed { .. })));
        // Counter reset: the post-resume failures report attempts 1 and 2.
        let post_resume: Vec<u32> = events
            .iter()
            .skip_while(|e| !matches!(e, RetryEvent::Resumed { .. }))
            .filter_map(|e| match e {
                RetryEvent::AttemptFailed(ctx) => Some(ctx.attempt),
                _ => None,
            })
            .collect();
        assert_eq!(post_resume, vec![1, 2]);
    }

    #[tokio::test]
    async fn abort_resolves_suspension_with_error() {
        let gate = ManualGate::new();
        let executor = RetryExecutor::new(fast_policy(2), gate.clone());

        let handle = tokio::spawn({
            let executor = executor.clone();
            async move { executor.run("test", |_| {}, failing_times(u32::MAX)).await }
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        gate.abort();
        let result = handle.await.unwrap();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn banked_resume_is_consumed() {
        let gate = ManualGate::new();
        gate.resume();
        let executor = RetryExecutor::new(fast_policy(2), gate);
        // Fails the first round of 2, consumes the banked resume, then
        // succeeds on the third call.
        let (value, attempts) = executor
            .run("test", |_| {}, failing_times(2))
            .await
            .unwrap();
        assert_eq!(value, 3);
        assert_eq!(attempts, 3);
    }
}

//! Generation credits.
//!
//! Each model call costs one credit, consumed before the request is sent.
//! A failed call refunds exactly one credit so retries do not drain the
//! balance. New ledgers start with a grant of 100 credits. The balance is
//! persisted through the state store, so it survives restarts.

use crate::state::{StateScope, StateStore, StoreData};
use async_trait::async_trait;
use lorecraft_core::{GenerateRequest, GenerateResponse};
use lorecraft_error::{GenerationError, GenerationErrorKind, LorecraftResult};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Credits granted to a fresh ledger.
pub const INITIAL_GRANT: i64 = 100;

const BALANCE_KEY: &str = "balance";

#[derive(Debug)]
struct LedgerInner {
    store: StateStore,
    balance: i64,
}

impl LedgerInner {
    fn persist(&self) -> LorecraftResult<()> {
        let mut data = StoreData::new();
        data.set(BALANCE_KEY, self.balance.to_string());
        self.store.save(&StateScope::Credits, &data)
    }
}

/// Persistent credit ledger.
///
/// Clones share the same balance.
#[derive(Debug, Clone)]
pub struct CreditLedger {
    inner: Arc<Mutex<LedgerInner>>,
}

impl CreditLedger {
    /// Opens the ledger backed by the given store, granting the initial
    /// balance when no ledger exists yet.
    pub fn open(store: StateStore) -> LorecraftResult<Self> {
        let data = store.load(&StateScope::Credits)?;
        let balance = match data.get(BALANCE_KEY).and_then(|s| s.parse::<i64>().ok()) {
            Some(balance) => balance,
            None => {
                info!(grant = INITIAL_GRANT, "Granting initial credits");
                INITIAL_GRANT
            }
        };

        let inner = LedgerInner { store, balance };
        inner.persist()?;
        Ok(Self {
            inner: Arc::new(Mutex::new(inner)),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LedgerInner> {
        // A poisoned ledger mutex means a panic mid-update; the balance
        // itself is a plain integer, so continuing is safe.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Current balance.
    pub fn balance(&self) -> i64 {
        self.lock().balance
    }

    /// Consumes one credit.
    ///
    /// # Errors
    ///
    /// Returns `CreditsExhausted` when the balance is zero, leaving the
    /// balance untouched.
    pub fn consume(&self) -> LorecraftResult<()> {
        let mut inner = self.lock();
        if inner.balance <= 0 {
            warn!("Credit balance exhausted");
            return Err(GenerationError::new(GenerationErrorKind::CreditsExhausted).into());
        }
        inner.balance -= 1;
        inner.persist()?;
        debug!(balance = inner.balance, "Consumed one credit");
        Ok(())
    }

    /// Refunds one credit after a failed call.
    pub fn refund(&self) -> LorecraftResult<()> {
        let mut inner = self.lock();
        inner.balance += 1;
        inner.persist()?;
        debug!(balance = inner.balance, "Refunded one credit");
        Ok(())
    }

    /// Adds credits to the balance.
    pub fn grant(&self, amount: i64) -> LorecraftResult<()> {
        let mut inner = self.lock();
        inner.balance += amount;
        inner.persist()?;
        info!(amount, balance = inner.balance, "Granted credits");
        Ok(())
    }
}

/// Driver wrapper that charges the ledger per call.
///
/// A credit is consumed before the request goes out. If the underlying
/// driver fails, exactly one credit is refunded, regardless of how many
/// transport-level retries the driver performed internally.
#[derive(Debug, Clone)]
pub struct CreditGate<D> {
    driver: D,
    ledger: CreditLedger,
}

impl<D> CreditGate<D> {
    /// Wraps a driver with the given ledger.
    pub fn new(driver: D, ledger: CreditLedger) -> Self {
        Self { driver, ledger }
    }

    /// The ledger behind the gate.
    pub fn ledger(&self) -> &CreditLedger {
        &self.ledger
    }
}

#[async_trait]
impl<D> lorecraft_interface::LorecraftDriver for CreditGate<D>
where
    D: lorecraft_interface::LorecraftDriver,
{
    async fn generate(&self, request: &GenerateRequest) -> LorecraftResult<GenerateResponse> {
        self.ledger.consume()?;
        match self.driver.generate(request).await {
            Ok(response) => Ok(response),
            Err(e) => {
                self.ledger.refund()?;
                Err(e)
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        self.driver.provider_name()
    }

    fn model_name(&self) -> &str {
        self.driver.model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lorecraft_core::Output;
    use lorecraft_interface::LorecraftDriver;
    use std::env;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    #[derive(Default)]
    struct FlakyDriver {
        fail: AtomicBool,
        calls: AtomicU32,
    }

    #[async_trait]
    impl LorecraftDriver for FlakyDriver {
        async fn generate(&self, _: &GenerateRequest) -> LorecraftResult<GenerateResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                Err(GenerationError::new(GenerationErrorKind::BadPlan("boom".to_string())).into())
            } else {
                Ok(GenerateResponse {
                    outputs: vec![Output::Text("ok".to_string())],
                })
            }
        }

        fn provider_name(&self) -> &'static str {
            "flaky"
        }

        fn model_name(&self) -> &str {
            "flaky-1"
        }
    }

    fn temp_ledger(name: &str) -> (CreditLedger, std::path::PathBuf) {
        let dir = env::temp_dir().join(name);
        std::fs::remove_dir_all(&dir).ok();
        let store = StateStore::new(&dir).unwrap();
        (CreditLedger::open(store).unwrap(), dir)
    }

    #[test]
    fn fresh_ledger_gets_initial_grant() {
        let (ledger, dir) = temp_ledger("lorecraft_credits_grant_test");
        assert_eq!(ledger.balance(), INITIAL_GRANT);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn balance_persists_across_opens() {
        let dir = env::temp_dir().join("lorecraft_credits_persist_test");
        std::fs::remove_dir_all(&dir).ok();

        let store = StateStore::new(&dir).unwrap();
        let ledger = CreditLedger::open(store).unwrap();
        ledger.consume().unwrap();
        ledger.consume().unwrap();
        drop(ledger);

        let store = StateStore::new(&dir).unwrap();
        let reopened = CreditLedger::open(store).unwrap();
        assert_eq!(reopened.balance(), INITIAL_GRANT - 2);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn consume_fails_at_zero_without_going_negative() {
        let (ledger, dir) = temp_ledger("lorecraft_credits_zero_test");
        for _ in 0..INITIAL_GRANT {
            ledger.consume().unwrap();
        }
        assert_eq!(ledger.balance(), 0);
        assert!(ledger.consume().is_err());
        assert_eq!(ledger.balance(), 0);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn gate_refunds_one_credit_on_failure() {
        let (ledger, dir) = temp_ledger("lorecraft_credits_refund_test");
        let gate = CreditGate::new(
            FlakyDriver {
                fail: AtomicBool::new(true),
                ..FlakyDriver::default()
            },
            ledger.clone(),
        );

        let request = GenerateRequest::from_prompt("hello", 100);
        assert!(gate.generate(&request).await.is_err());
        assert_eq!(ledger.balance(), INITIAL_GRANT);

        gate.driver.fail.store(false, Ordering::SeqCst);
        gate.generate(&request).await.unwrap();
        assert_eq!(ledger.balance(), INITIAL_GRANT - 1);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn gate_refuses_at_zero_without_calling_driver() {
        let (ledger, dir) = temp_ledger("lorecraft_credits_preflight_test");
        for _ in 0..INITIAL_GRANT {
            ledger.consume().unwrap();
        }

        let gate = CreditGate::new(FlakyDriver::default(), ledger.clone());
        let request = GenerateRequest::from_prompt("hello", 100);
        assert!(gate.generate(&request).await.is_err());

        // The pre-flight check blocks the call entirely.
        assert_eq!(gate.driver.calls.load(Ordering::SeqCst), 0);
        assert_eq!(ledger.balance(), 0);

        std::fs::remove_dir_all(&dir).ok();
    }
}

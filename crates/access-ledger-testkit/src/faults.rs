//! Fault injection for ledger writes.
//!
//! [`FlakyLedger`] wraps a real ledger and fails the writes a shared
//! [`FaultPlan`] selects. Reads always pass through.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;

use access_ledger_core::RichQuery;
use access_ledger_store::{KeyModification, Ledger, Result, StoreError};

#[derive(Debug)]
struct FaultRule {
    /// `None` matches every key.
    key: Option<String>,
    skip: usize,
    times: usize,
}

#[derive(Debug, Default)]
struct PlanState {
    rules: Vec<FaultRule>,
    attempted: u64,
    injected: u64,
}

/// Which writes to fail. Shared between a test and its [`FlakyLedger`].
#[derive(Debug, Default)]
pub struct FaultPlan {
    state: Mutex<PlanState>,
}

impl FaultPlan {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail the next `times` writes to `key`.
    pub fn fail_puts_to(&self, key: &str, times: usize) {
        self.fail_puts_to_after(key, 0, times);
    }

    /// Let `skip` writes to `key` through, then fail the following `times`.
    pub fn fail_puts_to_after(&self, key: &str, skip: usize, times: usize) {
        self.lock().rules.push(FaultRule {
            key: Some(key.to_owned()),
            skip,
            times,
        });
    }

    /// Fail the next `times` writes to any key.
    pub fn fail_next_puts(&self, times: usize) {
        self.lock().rules.push(FaultRule {
            key: None,
            skip: 0,
            times,
        });
    }

    /// Drop every pending rule.
    pub fn clear(&self) {
        self.lock().rules.clear();
    }

    /// Writes attempted through the wrapper, failed or not.
    pub fn attempted_puts(&self) -> u64 {
        self.lock().attempted
    }

    /// Writes failed on purpose.
    pub fn injected_failures(&self) -> u64 {
        self.lock().injected
    }

    fn should_fail(&self, key: &str) -> bool {
        let mut state = self.lock();
        state.attempted += 1;

        let mut fail = false;
        for rule in state
            .rules
            .iter_mut()
            .filter(|rule| rule.key.as_deref().map_or(true, |k| k == key))
        {
            if rule.skip > 0 {
                rule.skip -= 1;
            } else if rule.times > 0 && !fail {
                rule.times -= 1;
                fail = true;
            }
        }
        state.rules.retain(|rule| rule.times > 0);

        if fail {
            state.injected += 1;
        }
        fail
    }

    // Poisoning is ignored: a panic cannot leave a rule half-updated.
    fn lock(&self) -> MutexGuard<'_, PlanState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A ledger whose writes fail on demand.
pub struct FlakyLedger<L: Ledger> {
    inner: L,
    plan: Arc<FaultPlan>,
}

impl<L: Ledger> FlakyLedger<L> {
    pub fn new(inner: L) -> Self {
        Self::with_plan(inner, FaultPlan::new())
    }

    pub fn with_plan(inner: L, plan: Arc<FaultPlan>) -> Self {
        Self { inner, plan }
    }

    pub fn plan(&self) -> &Arc<FaultPlan> {
        &self.plan
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }
}

#[async_trait]
impl<L: Ledger> Ledger for FlakyLedger<L> {
    async fn get_state(&self, key: &str) -> Result<Option<Bytes>> {
        self.inner.get_state(key).await
    }

    async fn put_state(&self, key: &str, value: Bytes) -> Result<()> {
        if self.plan.should_fail(key) {
            return Err(StoreError::Unavailable(format!(
                "injected failure writing {}",
                key
            )));
        }
        self.inner.put_state(key, value).await
    }

    async fn range_query(&self, query: &RichQuery) -> Result<Vec<(String, Bytes)>> {
        self.inner.range_query(query).await
    }

    async fn history_of(&self, key: &str) -> Result<Vec<KeyModification>> {
        self.inner.history_of(key).await
    }
}

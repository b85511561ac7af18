//! Optimistic commit pipeline shared by every write operation.
//!
//! ```text
//! read store version v
//!   ↓
//! plan: read registry/ledger, run pure decision logic → WriteBatch
//!   ↓
//! commit(batch, Exact(v))
//!   ↓ version conflict?
//! re-plan from fresh reads (bounded), else surface a conflict
//! ```
//!
//! Planning closures must read only after the version is taken, so any write
//! that lands between planning and committing is caught by the version check.

use tracing::{debug, warn};

use stockwise_core::{DomainError, ExpectedVersion};

use crate::error::{ServiceError, ServiceResult};
use crate::store::{StockStore, StoreError, WriteBatch};

/// Output of a planning step: what to commit and what to hand back on success.
pub struct Plan<T> {
    pub batch: WriteBatch,
    pub output: T,
}

impl<T> Plan<T> {
    pub fn new(batch: WriteBatch, output: T) -> Self {
        Self { batch, output }
    }
}

/// Runs plan-then-commit with bounded retries on version conflicts.
#[derive(Debug, Clone)]
pub struct Dispatcher<S> {
    store: S,
    max_retries: u32,
}

impl<S> Dispatcher<S> {
    pub fn new(store: S, max_retries: u32) -> Self {
        Self { store, max_retries }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: StockStore> Dispatcher<S> {
    /// Plan and commit `operation`, re-planning after each version conflict.
    ///
    /// Domain errors from planning are returned immediately. Retries run
    /// `max_retries` times after the first attempt; after that the conflict
    /// is reported as `DomainError::Conflict`.
    pub fn dispatch<T>(
        &self,
        operation: &'static str,
        mut plan: impl FnMut(&S) -> ServiceResult<Plan<T>>,
    ) -> ServiceResult<T> {
        let attempts = self.max_retries.saturating_add(1);
        let mut last_conflict = String::new();

        for attempt in 1..=attempts {
            let version = self.store.version()?;
            let Plan { batch, output } = plan(&self.store)?;
            let ops = batch.len();

            match self.store.commit(batch, ExpectedVersion::Exact(version)) {
                Ok(committed) => {
                    debug!(operation, ops, version = committed, attempt, "batch committed");
                    return Ok(output);
                }
                Err(StoreError::Concurrency(msg)) => {
                    warn!(operation, attempt, error = %msg, "version conflict; re-planning");
                    last_conflict = msg;
                }
                Err(other) => return Err(ServiceError::from(other)),
            }
        }

        Err(DomainError::conflict(format!(
            "{operation}: concurrent updates kept conflicting after {attempts} attempts ({last_conflict})"
        ))
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    use stockwise_core::EntryId;
    use stockwise_inventory::{LedgerEntry, MovementRecord, RegistrySnapshot, StockKey};

    /// Store whose first `conflicts` commits fail with a version conflict.
    struct Flaky {
        conflicts: u32,
        commits: AtomicU32,
    }

    impl StockStore for Flaky {
        fn version(&self) -> Result<u64, StoreError> {
            Ok(0)
        }

        fn commit(&self, _batch: WriteBatch, _expected: ExpectedVersion) -> Result<u64, StoreError> {
            let n = self.commits.fetch_add(1, Ordering::SeqCst);
            if n < self.conflicts {
                Err(StoreError::Concurrency("raced".to_string()))
            } else {
                Ok(1)
            }
        }

        fn registry(&self) -> Result<RegistrySnapshot, StoreError> {
            Ok(RegistrySnapshot::default())
        }

        fn balance(&self, _key: &StockKey) -> Result<i64, StoreError> {
            Ok(0)
        }

        fn balances(&self) -> Result<BTreeMap<StockKey, i64>, StoreError> {
            Ok(BTreeMap::new())
        }

        fn entry(&self, _id: &EntryId) -> Result<Option<LedgerEntry>, StoreError> {
            Ok(None)
        }

        fn entries(&self) -> Result<Vec<LedgerEntry>, StoreError> {
            Ok(vec![])
        }

        fn records(&self) -> Result<Vec<MovementRecord>, StoreError> {
            Ok(vec![])
        }
    }

    fn flaky(conflicts: u32) -> Flaky {
        Flaky {
            conflicts,
            commits: AtomicU32::new(0),
        }
    }

    #[test]
    fn conflicts_are_retried_until_success() {
        let dispatcher = Dispatcher::new(flaky(2), 3);
        let mut planned = 0;
        let out = dispatcher
            .dispatch("test", |_| {
                planned += 1;
                Ok(Plan::new(WriteBatch::new(), planned))
            })
            .unwrap();
        assert_eq!(out, 3);
    }

    #[test]
    fn exhausted_retries_surface_as_conflict() {
        let dispatcher = Dispatcher::new(flaky(10), 2);
        let err = dispatcher
            .dispatch("test", |_| Ok(Plan::new(WriteBatch::new(), ())))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Conflict(_))));
        assert_eq!(dispatcher.store().commits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn planning_errors_are_not_retried() {
        let dispatcher = Dispatcher::new(flaky(0), 3);
        let mut planned = 0;
        let err = dispatcher
            .dispatch::<()>("test", |_| {
                planned += 1;
                Err(DomainError::validation("nope").into())
            })
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Validation(_))));
        assert_eq!(planned, 1);
    }
}

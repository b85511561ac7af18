//! Transactional stock store boundary.
//!
//! Registry entities, ledger rows and movement records live behind one
//! versioned store so that a movement and everything it touches commit as a
//! single unit.

pub mod in_memory;
pub mod r#trait;

use std::collections::HashMap;

use stockwise_core::EntryId;
use stockwise_inventory::{LedgerEntry, LedgerView, StockKey};

pub use in_memory::InMemoryStockStore;
pub use r#trait::{StockStore, StoreError, WriteBatch, WriteOp};

/// Ledger reads prefetched from a store for one decision.
///
/// The decision functions are pure and cannot fail on IO, so the service
/// loads exactly the balances and rows they will consult up front.
#[derive(Debug, Default)]
pub struct PrefetchedLedger {
    balances: HashMap<StockKey, i64>,
    entries: HashMap<EntryId, LedgerEntry>,
}

impl PrefetchedLedger {
    pub fn load<S: StockStore + ?Sized>(
        store: &S,
        keys: &[StockKey],
        entry_ids: &[EntryId],
    ) -> Result<Self, StoreError> {
        let mut view = Self::default();
        for key in keys {
            if !view.balances.contains_key(key) {
                view.balances.insert(*key, store.balance(key)?);
            }
        }
        for id in entry_ids {
            if let Some(entry) = store.entry(id)? {
                view.entries.insert(*id, entry);
            }
        }
        Ok(view)
    }
}

impl LedgerView for PrefetchedLedger {
    fn balance(&self, key: &StockKey) -> i64 {
        self.balances.get(key).copied().unwrap_or(0)
    }

    fn entry(&self, id: &EntryId) -> Option<LedgerEntry> {
        self.entries.get(id).cloned()
    }
}

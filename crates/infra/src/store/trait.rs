use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use stockwise_core::{EntryId, ExpectedVersion, ItemId, LocationId, WarehouseId};
use stockwise_inventory::movement::Decision;
use stockwise_inventory::{Item, LedgerEntry, Location, MovementRecord, RegistrySnapshot, StockKey, Warehouse};

/// One mutation inside a [`WriteBatch`].
///
/// Registry writes are upserts keyed by id. Ledger writes are append-only; the
/// only in-place change a ledger row ever sees is the one-way demo `returned`
/// flip, expressed as its own compare-and-set operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    PutItem(Item),
    DeleteItem(ItemId),
    PutWarehouse(Warehouse),
    DeleteWarehouse(WarehouseId),
    PutLocation(Location),
    DeleteLocation(LocationId),
    AppendEntry(LedgerEntry),
    /// Flip `returned` from false to true on a demo `OUT` row; fails if already set.
    MarkDemoReturned(EntryId),
    PutRecord(MovementRecord),
}

/// A group of writes committed atomically: every op applies or none does.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: WriteOp) {
        self.ops.push(op);
    }

    pub fn with(mut self, op: WriteOp) -> Self {
        self.ops.push(op);
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

impl FromIterator<WriteOp> for WriteBatch {
    fn from_iter<T: IntoIterator<Item = WriteOp>>(iter: T) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}

impl From<&Decision> for WriteBatch {
    /// The demo flip goes first so a concurrent second return fails before
    /// anything is appended.
    fn from(decision: &Decision) -> Self {
        let mut batch = WriteBatch::new();
        if let Some(id) = decision.close_demo {
            batch.push(WriteOp::MarkDemoReturned(id));
        }
        batch.ops.extend(decision.entries.iter().cloned().map(WriteOp::AppendEntry));
        batch.ops.extend(decision.records.iter().cloned().map(WriteOp::PutRecord));
        batch
    }
}

/// Stock store operation error.
///
/// These are infrastructure errors, as opposed to the domain's own
/// validation and invariant failures.
///
/// - **Concurrency**: the batch was prepared against a stale version
/// - **Constraint**: a store-enforced rule rejected an op (uniqueness,
///   referential integrity, the demo compare-and-set)
/// - **InvalidWrite**: malformed op (bad ledger sign, unknown target id)
/// - **Unavailable**: the backend cannot serve the request (poisoned lock, IO)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("constraint violated: {0}")]
    Constraint(String),

    #[error("invalid write: {0}")]
    InvalidWrite(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence boundary for registry entities, the ledger and movement records.
///
/// ## Versioning
///
/// The store carries one global version, incremented by every successful
/// commit. Callers read the version, make their decision from reads taken
/// after it, and commit with `ExpectedVersion::Exact(version)`; any write in
/// between turns the commit into `StoreError::Concurrency`.
///
/// ## Commit semantics
///
/// `commit()` must:
/// - check the expected version before applying anything
/// - validate and apply ops in order
/// - on the first failing op, undo everything already applied in the batch
/// - keep per-triple balances in step with appended entries
///
/// Readers never observe a partially applied batch.
pub trait StockStore: Send + Sync {
    /// Current commit version (0 for an empty store).
    fn version(&self) -> Result<u64, StoreError>;

    /// Atomically apply a batch; returns the new version.
    fn commit(&self, batch: WriteBatch, expected: ExpectedVersion) -> Result<u64, StoreError>;

    fn registry(&self) -> Result<RegistrySnapshot, StoreError>;

    /// Materialized balance of one triple (0 if never touched).
    fn balance(&self, key: &StockKey) -> Result<i64, StoreError>;

    /// Every triple ever touched, including those that net to zero.
    fn balances(&self) -> Result<BTreeMap<StockKey, i64>, StoreError>;

    fn entry(&self, id: &EntryId) -> Result<Option<LedgerEntry>, StoreError>;

    /// Ledger rows in append order.
    fn entries(&self) -> Result<Vec<LedgerEntry>, StoreError>;

    /// Movement records in commit order.
    fn records(&self) -> Result<Vec<MovementRecord>, StoreError>;
}

impl<S> StockStore for Arc<S>
where
    S: StockStore + ?Sized,
{
    fn version(&self) -> Result<u64, StoreError> {
        (**self).version()
    }

    fn commit(&self, batch: WriteBatch, expected: ExpectedVersion) -> Result<u64, StoreError> {
        (**self).commit(batch, expected)
    }

    fn registry(&self) -> Result<RegistrySnapshot, StoreError> {
        (**self).registry()
    }

    fn balance(&self, key: &StockKey) -> Result<i64, StoreError> {
        (**self).balance(key)
    }

    fn balances(&self) -> Result<BTreeMap<StockKey, i64>, StoreError> {
        (**self).balances()
    }

    fn entry(&self, id: &EntryId) -> Result<Option<LedgerEntry>, StoreError> {
        (**self).entry(id)
    }

    fn entries(&self) -> Result<Vec<LedgerEntry>, StoreError> {
        (**self).entries()
    }

    fn records(&self) -> Result<Vec<MovementRecord>, StoreError> {
        (**self).records()
    }
}

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use stockwise_core::{Entity, EntryId, ExpectedVersion, ItemId, LocationId, WarehouseId};
use stockwise_inventory::location::rack_key;
use stockwise_inventory::{DemoStatus, Item, LedgerEntry, Location, MovementRecord, RegistrySnapshot, StockKey, Warehouse};

use super::r#trait::{StockStore, StoreError, WriteBatch, WriteOp};

#[derive(Debug, Default)]
struct State {
    version: u64,
    items: BTreeMap<ItemId, Item>,
    warehouses: BTreeMap<WarehouseId, Warehouse>,
    locations: BTreeMap<LocationId, Location>,
    entries: Vec<LedgerEntry>,
    entry_index: HashMap<EntryId, usize>,
    balances: BTreeMap<StockKey, i64>,
    records: Vec<MovementRecord>,
}

/// Reverses one applied op.
#[derive(Debug)]
enum Undo {
    Item(ItemId, Option<Item>),
    Warehouse(WarehouseId, Option<Warehouse>),
    Location(LocationId, Option<Location>),
    /// Pop the last entry; drop its balance key if this entry created it.
    Entry { key: StockKey, created_key: bool },
    Returned(usize),
    Record,
}

/// In-memory stock store.
///
/// Commits run under the write lock, so they are serialized; readers take the
/// read lock and always see whole batches.
#[derive(Debug, Default)]
pub struct InMemoryStockStore {
    state: RwLock<State>,
}

impl InMemoryStockStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }
}

impl State {
    fn entry_references(&self, pred: impl Fn(&StockKey) -> bool) -> bool {
        self.balances.keys().any(pred)
    }

    fn apply(&mut self, op: WriteOp) -> Result<Undo, StoreError> {
        match op {
            WriteOp::PutItem(item) => {
                if let Some(other) = self.items.values().find(|i| i.id != item.id && i.same_identity(&item)) {
                    return Err(StoreError::Constraint(format!(
                        "item with model number \"{}\" from \"{}\" already exists ({})",
                        item.model_no, item.company_name, other.id
                    )));
                }
                let (id, prev) = put(&mut self.items, item);
                Ok(Undo::Item(id, prev))
            }
            WriteOp::DeleteItem(id) => {
                if !self.items.contains_key(&id) {
                    return Err(StoreError::InvalidWrite(format!("unknown item {id}")));
                }
                if self.entry_references(|k| k.item_id == id) {
                    return Err(StoreError::Constraint(format!("item {id} is referenced by the ledger")));
                }
                let prev = self.items.remove(&id);
                Ok(Undo::Item(id, prev))
            }
            WriteOp::PutWarehouse(warehouse) => {
                let (id, prev) = put(&mut self.warehouses, warehouse);
                Ok(Undo::Warehouse(id, prev))
            }
            WriteOp::DeleteWarehouse(id) => {
                if !self.warehouses.contains_key(&id) {
                    return Err(StoreError::InvalidWrite(format!("unknown warehouse {id}")));
                }
                if self.entry_references(|k| k.warehouse_id == id) {
                    return Err(StoreError::Constraint(format!(
                        "warehouse {id} is referenced by the ledger"
                    )));
                }
                if self.locations.values().any(|l| l.warehouse_id == id) {
                    return Err(StoreError::Constraint(format!("warehouse {id} still has racks")));
                }
                let prev = self.warehouses.remove(&id);
                Ok(Undo::Warehouse(id, prev))
            }
            WriteOp::PutLocation(location) => {
                if !self.warehouses.contains_key(&location.warehouse_id) {
                    return Err(StoreError::Constraint(format!(
                        "rack \"{}\" targets unknown warehouse {}",
                        location.name, location.warehouse_id
                    )));
                }
                let key = rack_key(&location.name);
                let clash = self.locations.values().any(|l| {
                    l.id != location.id && l.warehouse_id == location.warehouse_id && rack_key(&l.name) == key
                });
                if clash {
                    return Err(StoreError::Constraint(format!(
                        "rack \"{}\" already exists in warehouse {}",
                        location.name, location.warehouse_id
                    )));
                }
                let (id, prev) = put(&mut self.locations, location);
                Ok(Undo::Location(id, prev))
            }
            WriteOp::DeleteLocation(id) => {
                if !self.locations.contains_key(&id) {
                    return Err(StoreError::InvalidWrite(format!("unknown location {id}")));
                }
                if self.entry_references(|k| k.location_id == Some(id)) {
                    return Err(StoreError::Constraint(format!(
                        "location {id} is referenced by the ledger"
                    )));
                }
                let prev = self.locations.remove(&id);
                Ok(Undo::Location(id, prev))
            }
            WriteOp::AppendEntry(entry) => {
                entry
                    .validate()
                    .map_err(|e| StoreError::InvalidWrite(e.to_string()))?;
                if self.entry_index.contains_key(&entry.id) {
                    return Err(StoreError::InvalidWrite(format!("duplicate ledger entry {}", entry.id)));
                }
                self.check_refs(&entry.key())?;

                let key = entry.key();
                let created_key = !self.balances.contains_key(&key);
                *self.balances.entry(key).or_insert(0) += entry.quantity;
                self.entry_index.insert(entry.id, self.entries.len());
                self.entries.push(entry);
                Ok(Undo::Entry { key, created_key })
            }
            WriteOp::MarkDemoReturned(id) => {
                let idx = *self
                    .entry_index
                    .get(&id)
                    .ok_or_else(|| StoreError::InvalidWrite(format!("unknown ledger entry {id}")))?;
                let row = &mut self.entries[idx];
                match row.demo_status() {
                    Some(DemoStatus::Pending) => {}
                    Some(DemoStatus::Returned) => {
                        return Err(StoreError::Constraint(format!("demo entry {id} is already returned")));
                    }
                    None => return Err(StoreError::Constraint(format!("entry {id} is not a demo stock-out"))),
                }
                row.returned = Some(true);
                Ok(Undo::Returned(idx))
            }
            WriteOp::PutRecord(record) => {
                self.records.push(record);
                Ok(Undo::Record)
            }
        }
    }

    fn check_refs(&self, key: &StockKey) -> Result<(), StoreError> {
        if !self.items.contains_key(&key.item_id) {
            return Err(StoreError::Constraint(format!("unknown item {}", key.item_id)));
        }
        if !self.warehouses.contains_key(&key.warehouse_id) {
            return Err(StoreError::Constraint(format!("unknown warehouse {}", key.warehouse_id)));
        }
        if let Some(location_id) = key.location_id {
            match self.locations.get(&location_id) {
                Some(l) if l.warehouse_id == key.warehouse_id => {}
                Some(_) => {
                    return Err(StoreError::Constraint(format!(
                        "location {location_id} is not in warehouse {}",
                        key.warehouse_id
                    )));
                }
                None => return Err(StoreError::Constraint(format!("unknown location {location_id}"))),
            }
        }
        Ok(())
    }

    fn undo(&mut self, undo: Undo) {
        match undo {
            Undo::Item(id, prev) => restore(&mut self.items, id, prev),
            Undo::Warehouse(id, prev) => restore(&mut self.warehouses, id, prev),
            Undo::Location(id, prev) => restore(&mut self.locations, id, prev),
            Undo::Entry { key, created_key } => {
                if let Some(entry) = self.entries.pop() {
                    self.entry_index.remove(&entry.id);
                    if created_key {
                        self.balances.remove(&key);
                    } else if let Some(balance) = self.balances.get_mut(&key) {
                        *balance -= entry.quantity;
                    }
                }
            }
            Undo::Returned(idx) => {
                if let Some(row) = self.entries.get_mut(idx) {
                    row.returned = Some(false);
                }
            }
            Undo::Record => {
                self.records.pop();
            }
        }
    }
}

/// Insert or replace a row under its own id, returning the previous row.
fn put<E: Entity>(map: &mut BTreeMap<E::Id, E>, row: E) -> (E::Id, Option<E>) {
    let id = row.id().clone();
    let prev = map.insert(id.clone(), row);
    (id, prev)
}

fn restore<K: Ord, V>(map: &mut BTreeMap<K, V>, id: K, prev: Option<V>) {
    match prev {
        Some(value) => {
            map.insert(id, value);
        }
        None => {
            map.remove(&id);
        }
    }
}

impl StockStore for InMemoryStockStore {
    fn version(&self) -> Result<u64, StoreError> {
        Ok(self.read()?.version)
    }

    fn commit(&self, batch: WriteBatch, expected: ExpectedVersion) -> Result<u64, StoreError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        if !expected.matches(state.version) {
            return Err(StoreError::Concurrency(format!(
                "expected {expected:?}, found {}",
                state.version
            )));
        }
        if batch.is_empty() {
            return Ok(state.version);
        }

        let mut applied = Vec::with_capacity(batch.len());
        for (idx, op) in batch.into_ops().into_iter().enumerate() {
            match state.apply(op) {
                Ok(undo) => applied.push(undo),
                Err(err) => {
                    for undo in applied.into_iter().rev() {
                        state.undo(undo);
                    }
                    tracing::debug!(op_index = idx, error = %err, "batch rolled back");
                    return Err(err);
                }
            }
        }

        state.version += 1;
        Ok(state.version)
    }

    fn registry(&self) -> Result<RegistrySnapshot, StoreError> {
        let state = self.read()?;
        Ok(RegistrySnapshot {
            items: state.items.clone(),
            warehouses: state.warehouses.clone(),
            locations: state.locations.clone(),
        })
    }

    fn balance(&self, key: &StockKey) -> Result<i64, StoreError> {
        Ok(self.read()?.balances.get(key).copied().unwrap_or(0))
    }

    fn balances(&self) -> Result<BTreeMap<StockKey, i64>, StoreError> {
        Ok(self.read()?.balances.clone())
    }

    fn entry(&self, id: &EntryId) -> Result<Option<LedgerEntry>, StoreError> {
        let state = self.read()?;
        Ok(state.entry_index.get(id).map(|&idx| state.entries[idx].clone()))
    }

    fn entries(&self) -> Result<Vec<LedgerEntry>, StoreError> {
        Ok(self.read()?.entries.clone())
    }

    fn records(&self) -> Result<Vec<MovementRecord>, StoreError> {
        Ok(self.read()?.records.clone())
    }
}

//! Shared test fixtures: a small registry and an in-memory ledger view.

use stockwise_core::{EntryId, ItemId, LocationId, WarehouseId};

use crate::item::NewItem;
use crate::ledger::{LedgerEntry, StockKey};
use crate::location::Location;
use crate::movement::{Decision, LedgerView};
use crate::registry::RegistrySnapshot;
use crate::warehouse::Warehouse;

pub(crate) struct Fixture {
    pub snapshot: RegistrySnapshot,
    pub item: ItemId,
    pub main: WarehouseId,
    pub north: WarehouseId,
    /// "Rack No-1" in `main`.
    pub main_rack: LocationId,
    /// "Rack No-1" in `north`.
    pub north_rack: LocationId,
}

impl Fixture {
    pub fn key(&self, warehouse: WarehouseId, location: Option<LocationId>) -> StockKey {
        StockKey::new(self.item, warehouse, location)
    }
}

pub(crate) fn fixture() -> Fixture {
    let item = NewItem {
        name: "Probe".to_string(),
        model_no: "P-1".to_string(),
        company_name: "Acme".to_string(),
        ..NewItem::default()
    }
    .into_item(ItemId::new())
    .unwrap();
    let main = Warehouse {
        id: WarehouseId::new(),
        name: "Main".to_string(),
        location: "Pune".to_string(),
    };
    let north = Warehouse {
        id: WarehouseId::new(),
        name: "North".to_string(),
        location: "Delhi".to_string(),
    };
    let main_rack = Location {
        id: LocationId::new(),
        name: "Rack No-1".to_string(),
        warehouse_id: main.id,
        description: "Rack No-1 for Main".to_string(),
    };
    let north_rack = Location {
        id: LocationId::new(),
        name: "Rack No-1".to_string(),
        warehouse_id: north.id,
        description: "Rack No-1 for North".to_string(),
    };

    Fixture {
        item: item.id,
        main: main.id,
        north: north.id,
        main_rack: main_rack.id,
        north_rack: north_rack.id,
        snapshot: RegistrySnapshot::from_parts(vec![item], vec![main, north], vec![main_rack, north_rack]),
    }
}

/// Ledger that applies decisions the way the store would, minus concurrency.
#[derive(Debug, Default)]
pub(crate) struct MemLedger {
    pub entries: Vec<LedgerEntry>,
}

impl MemLedger {
    pub fn apply(&mut self, decision: &Decision) {
        if let Some(id) = decision.close_demo {
            let row = self.entries.iter_mut().find(|e| e.id == id).unwrap();
            row.returned = Some(true);
        }
        self.entries.extend(decision.entries.iter().cloned());
    }
}

impl LedgerView for MemLedger {
    fn balance(&self, key: &StockKey) -> i64 {
        self.entries
            .iter()
            .filter(|e| e.key() == *key)
            .map(|e| e.quantity)
            .sum()
    }

    fn entry(&self, id: &EntryId) -> Option<LedgerEntry> {
        self.entries.iter().find(|e| e.id == *id).cloned()
    }
}

//! Point-in-time view of the entity registry.

use std::collections::BTreeMap;

use stockwise_core::{DomainError, DomainResult, Entity, ItemId, LocationId, WarehouseId};

use crate::item::Item;
use crate::ledger::StockKey;
use crate::location::Location;
use crate::warehouse::Warehouse;

/// Name lookups used to enrich ledger-derived rows for display.
pub trait Catalog {
    fn item(&self, id: &ItemId) -> Option<&Item>;
    fn warehouse(&self, id: &WarehouseId) -> Option<&Warehouse>;
    fn location(&self, id: &LocationId) -> Option<&Location>;
}

/// Full snapshot of items, warehouses and locations.
///
/// Taken once per operation; movement decisions and name resolution run
/// against it rather than re-reading the store per row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrySnapshot {
    pub items: BTreeMap<ItemId, Item>,
    pub warehouses: BTreeMap<WarehouseId, Warehouse>,
    pub locations: BTreeMap<LocationId, Location>,
}

impl RegistrySnapshot {
    pub fn from_parts(items: Vec<Item>, warehouses: Vec<Warehouse>, locations: Vec<Location>) -> Self {
        Self {
            items: by_id(items),
            warehouses: by_id(warehouses),
            locations: by_id(locations),
        }
    }

    /// The rack with this name (case-insensitive) in one warehouse, if any.
    pub fn rack_in_warehouse(&self, warehouse_id: WarehouseId, name: &str) -> Option<&Location> {
        self.locations
            .values()
            .find(|l| l.warehouse_id == warehouse_id && l.has_name(name))
    }

    /// Every rack row sharing this name across all warehouses.
    pub fn locations_named(&self, name: &str) -> Vec<&Location> {
        self.locations.values().filter(|l| l.has_name(name)).collect()
    }

    /// Ensure every part of a triple exists and the rack belongs to the warehouse.
    pub fn ensure_key(&self, key: &StockKey) -> DomainResult<()> {
        if !self.items.contains_key(&key.item_id) {
            return Err(DomainError::not_found(format!("item {}", key.item_id)));
        }
        if !self.warehouses.contains_key(&key.warehouse_id) {
            return Err(DomainError::not_found(format!("warehouse {}", key.warehouse_id)));
        }
        if let Some(location_id) = key.location_id {
            let location = self
                .locations
                .get(&location_id)
                .ok_or_else(|| DomainError::not_found(format!("location {location_id}")))?;
            if location.warehouse_id != key.warehouse_id {
                return Err(DomainError::validation(format!(
                    "location {location_id} does not belong to warehouse {}",
                    key.warehouse_id
                )));
            }
        }
        Ok(())
    }
}

impl Catalog for RegistrySnapshot {
    fn item(&self, id: &ItemId) -> Option<&Item> {
        self.items.get(id)
    }

    fn warehouse(&self, id: &WarehouseId) -> Option<&Warehouse> {
        self.warehouses.get(id)
    }

    fn location(&self, id: &LocationId) -> Option<&Location> {
        self.locations.get(id)
    }
}

fn by_id<E: Entity>(rows: Vec<E>) -> BTreeMap<E::Id, E> {
    rows.into_iter().map(|row| (row.id().clone(), row)).collect()
}

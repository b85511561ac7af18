//! Id-or-name entity references, resolved once per batch.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use stockwise_core::{ItemId, LocationId, WarehouseId};

use crate::registry::RegistrySnapshot;

/// A reference to a registry entity: either its id or its exact display name.
///
/// On the wire this is a plain string; strings that parse as an id are ids,
/// everything else is a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityRef<I> {
    Id(I),
    Name(String),
}

impl<I> EntityRef<I> {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }
}

impl<I> From<I> for EntityRef<I> {
    fn from(id: I) -> Self {
        Self::Id(id)
    }
}

/// Why a reference could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unresolved {
    UnknownId(String),
    UnknownName(String),
    AmbiguousName(String),
}

impl core::fmt::Display for Unresolved {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Unresolved::UnknownId(id) => write!(f, "unknown id {id}"),
            Unresolved::UnknownName(name) => write!(f, "unknown name \"{name}\""),
            Unresolved::AmbiguousName(name) => write!(f, "name \"{name}\" matches more than one entity"),
        }
    }
}

/// Name → id maps built from one registry snapshot.
///
/// Names are trimmed and matched exactly (case-sensitive). Rack names are
/// scoped to the warehouse they are resolved against, since one rack name
/// exists once per warehouse.
#[derive(Debug)]
pub struct Resolver<'a> {
    snapshot: &'a RegistrySnapshot,
    items: HashMap<&'a str, Vec<ItemId>>,
    warehouses: HashMap<&'a str, Vec<WarehouseId>>,
    locations: HashMap<(WarehouseId, String), LocationId>,
}

impl<'a> Resolver<'a> {
    pub fn new(snapshot: &'a RegistrySnapshot) -> Self {
        let mut items: HashMap<&str, Vec<ItemId>> = HashMap::new();
        for item in snapshot.items.values() {
            items.entry(item.name.trim()).or_default().push(item.id);
        }

        let mut warehouses: HashMap<&str, Vec<WarehouseId>> = HashMap::new();
        for wh in snapshot.warehouses.values() {
            warehouses.entry(wh.name.trim()).or_default().push(wh.id);
        }

        let locations = snapshot
            .locations
            .values()
            .map(|l| ((l.warehouse_id, l.name.trim().to_string()), l.id))
            .collect();

        Self {
            snapshot,
            items,
            warehouses,
            locations,
        }
    }

    pub fn item(&self, reference: &EntityRef<ItemId>) -> Result<ItemId, Unresolved> {
        match reference {
            EntityRef::Id(id) if self.snapshot.items.contains_key(id) => Ok(*id),
            EntityRef::Id(id) => Err(Unresolved::UnknownId(id.to_string())),
            EntityRef::Name(name) => unique(&self.items, name),
        }
    }

    pub fn warehouse(&self, reference: &EntityRef<WarehouseId>) -> Result<WarehouseId, Unresolved> {
        match reference {
            EntityRef::Id(id) if self.snapshot.warehouses.contains_key(id) => Ok(*id),
            EntityRef::Id(id) => Err(Unresolved::UnknownId(id.to_string())),
            EntityRef::Name(name) => unique(&self.warehouses, name),
        }
    }

    /// Resolve a rack inside a specific warehouse.
    pub fn location(
        &self,
        warehouse_id: WarehouseId,
        reference: &EntityRef<LocationId>,
    ) -> Result<LocationId, Unresolved> {
        match reference {
            EntityRef::Id(id) => match self.snapshot.locations.get(id) {
                Some(loc) if loc.warehouse_id == warehouse_id => Ok(*id),
                _ => Err(Unresolved::UnknownId(id.to_string())),
            },
            EntityRef::Name(name) => self
                .locations
                .get(&(warehouse_id, name.trim().to_string()))
                .copied()
                .ok_or_else(|| Unresolved::UnknownName(name.trim().to_string())),
        }
    }
}

fn unique<I: Copy>(map: &HashMap<&str, Vec<I>>, name: &str) -> Result<I, Unresolved> {
    let name = name.trim();
    match map.get(name).map(Vec::as_slice) {
        Some([only]) => Ok(*only),
        Some([_, _, ..]) => Err(Unresolved::AmbiguousName(name.to_string())),
        _ => Err(Unresolved::UnknownName(name.to_string())),
    }
}

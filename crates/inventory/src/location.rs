//! Rack-level locations.
//!
//! A logical rack ("Rack No-1") is a *name*; it exists as one `Location` row per
//! warehouse. Creating, renaming or deleting by name fans out across every
//! warehouse, and each fan-out is planned here as one set of rows so the store
//! can commit it as a single unit.

use serde::{Deserialize, Serialize};

use stockwise_core::{DomainError, DomainResult, Entity, LocationId, WarehouseId};

use crate::registry::RegistrySnapshot;

/// One physical rack row inside one warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub warehouse_id: WarehouseId,
    pub description: String,
}

impl Entity for Location {
    type Id = LocationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Location {
    /// Case-insensitive rack name comparison (the uniqueness rule within a warehouse).
    pub fn has_name(&self, name: &str) -> bool {
        rack_key(&self.name) == rack_key(name)
    }
}

/// Normalized rack name used for uniqueness checks.
pub fn rack_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Request to create a rack name. The rack is replicated to every warehouse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLocation {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Fan-out edit of every rack row sharing a name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameRack {
    pub new_name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Plan the rows needed to replicate a rack name into every warehouse lacking it.
///
/// Warehouses that already carry the name (case-insensitive) are skipped.
pub fn plan_replication(snapshot: &RegistrySnapshot, request: &NewLocation) -> DomainResult<Vec<Location>> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("location name is required"));
    }
    if snapshot.warehouses.is_empty() {
        return Err(DomainError::validation("no warehouses exist to hold the rack"));
    }

    let description = request
        .description
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();

    let created: Vec<Location> = snapshot
        .warehouses
        .keys()
        .filter(|wh| snapshot.rack_in_warehouse(**wh, name).is_none())
        .map(|wh| Location {
            id: LocationId::new(),
            name: name.to_string(),
            warehouse_id: *wh,
            description: description.clone(),
        })
        .collect();

    if created.is_empty() {
        return Err(DomainError::conflict("location already exists in all warehouses"));
    }
    Ok(created)
}

/// Plan the rows needed so that every standard rack exists in every warehouse.
///
/// Returns an empty plan when the registry is already complete.
pub fn plan_standard_racks(snapshot: &RegistrySnapshot, names: &[String]) -> Vec<Location> {
    let mut planned = Vec::new();
    for (wh_id, warehouse) in &snapshot.warehouses {
        for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
            let exists = snapshot.rack_in_warehouse(*wh_id, name).is_some()
                || planned
                    .iter()
                    .any(|l: &Location| l.warehouse_id == *wh_id && l.has_name(name));
            if !exists {
                planned.push(Location {
                    id: LocationId::new(),
                    name: name.to_string(),
                    warehouse_id: *wh_id,
                    description: format!("{name} for {}", warehouse.name),
                });
            }
        }
    }
    planned
}

/// Plan a fan-out rename: the updated version of every row named `name`.
pub fn plan_rename(snapshot: &RegistrySnapshot, name: &str, request: &RenameRack) -> DomainResult<Vec<Location>> {
    let new_name = request.new_name.trim();
    if new_name.is_empty() {
        return Err(DomainError::validation("new name is required"));
    }

    let affected = snapshot.locations_named(name);
    if affected.is_empty() {
        return Err(DomainError::not_found(format!("no locations named \"{}\"", name.trim())));
    }

    let mut updated = Vec::with_capacity(affected.len());
    for loc in affected {
        if let Some(other) = snapshot.rack_in_warehouse(loc.warehouse_id, new_name) {
            if other.id != loc.id {
                return Err(DomainError::conflict(format!(
                    "rack \"{new_name}\" already exists in warehouse {}",
                    loc.warehouse_id
                )));
            }
        }

        let mut next = loc.clone();
        next.name = new_name.to_string();
        if let Some(description) = &request.description {
            next.description = description.trim().to_string();
        }
        updated.push(next);
    }
    Ok(updated)
}

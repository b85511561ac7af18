use serde::{Deserialize, Serialize};

use stockwise_core::{DomainError, DomainResult, Entity, WarehouseId};

/// A physical warehouse. Names are not required to be unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warehouse {
    pub id: WarehouseId,
    pub name: String,
    /// Free-form address or city.
    pub location: String,
}

impl Entity for Warehouse {
    type Id = WarehouseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWarehouse {
    pub name: String,
    pub location: String,
}

impl NewWarehouse {
    pub fn into_warehouse(self, id: WarehouseId) -> DomainResult<Warehouse> {
        normalize(Warehouse {
            id,
            name: self.name,
            location: self.location,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehousePatch {
    pub name: Option<String>,
    pub location: Option<String>,
}

impl Warehouse {
    pub fn patched(&self, patch: &WarehousePatch) -> DomainResult<Warehouse> {
        let mut next = self.clone();
        if let Some(name) = &patch.name {
            next.name = name.clone();
        }
        if let Some(location) = &patch.location {
            next.location = location.clone();
        }
        normalize(next)
    }
}

fn normalize(mut warehouse: Warehouse) -> DomainResult<Warehouse> {
    warehouse.name = warehouse.name.trim().to_string();
    warehouse.location = warehouse.location.trim().to_string();
    if warehouse.name.is_empty() {
        return Err(DomainError::validation("warehouse name cannot be empty"));
    }
    if warehouse.location.is_empty() {
        return Err(DomainError::validation("warehouse location cannot be empty"));
    }
    Ok(warehouse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_and_location_are_required() {
        let err = NewWarehouse {
            name: "Main".to_string(),
            location: " ".to_string(),
        }
        .into_warehouse(WarehouseId::new())
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn patch_trims_values() {
        let wh = NewWarehouse {
            name: "Main".to_string(),
            location: "Pune".to_string(),
        }
        .into_warehouse(WarehouseId::new())
        .unwrap();
        let next = wh
            .patched(&WarehousePatch {
                name: Some(" North ".to_string()),
                location: None,
            })
            .unwrap();
        assert_eq!(next.name, "North");
        assert_eq!(next.location, "Pune");
    }
}

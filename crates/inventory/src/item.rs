use serde::{Deserialize, Serialize};

use stockwise_core::{DomainError, DomainResult, Entity, ItemId};

/// Low-stock threshold applied when an item does not carry its own.
pub const DEFAULT_MIN_STOCK_ALERT: i64 = 5;

/// Catalogue item.
///
/// `(model_no, company_name)` is the identity key; it is unique across the
/// registry. Descriptive fields are mutable, the id never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub model_no: String,
    pub company_name: String,
    pub min_stock_alert: Option<i64>,
    pub unit: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Item {
    /// Identity key used for the uniqueness constraint.
    pub fn identity_key(&self) -> (&str, &str) {
        (self.model_no.as_str(), self.company_name.as_str())
    }

    pub fn same_identity(&self, other: &Item) -> bool {
        self.identity_key() == other.identity_key()
    }

    /// Threshold below which an (item, warehouse) total counts as low stock.
    pub fn effective_min_stock_alert(&self, default: i64) -> i64 {
        self.min_stock_alert.unwrap_or(default)
    }

    /// Apply a partial update, re-validating the result.
    pub fn patched(&self, patch: &ItemPatch) -> DomainResult<Item> {
        let mut next = self.clone();
        if let Some(name) = &patch.name {
            next.name = name.clone();
        }
        if let Some(model_no) = &patch.model_no {
            next.model_no = model_no.clone();
        }
        if let Some(company_name) = &patch.company_name {
            next.company_name = company_name.clone();
        }
        if let Some(min) = patch.min_stock_alert {
            next.min_stock_alert = Some(min);
        }
        if let Some(unit) = &patch.unit {
            next.unit = Some(unit.clone());
        }
        if let Some(category) = &patch.category {
            next.category = Some(category.clone());
        }
        if let Some(description) = &patch.description {
            next.description = Some(description.clone());
        }
        normalize(next)
    }
}

/// Registration payload for a new item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub name: String,
    pub model_no: String,
    pub company_name: String,
    #[serde(default)]
    pub min_stock_alert: Option<i64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewItem {
    pub fn into_item(self, id: ItemId) -> DomainResult<Item> {
        normalize(Item {
            id,
            name: self.name,
            model_no: self.model_no,
            company_name: self.company_name,
            min_stock_alert: self.min_stock_alert,
            unit: self.unit,
            category: self.category,
            description: self.description,
        })
    }
}

/// Partial update of an item's descriptive fields (and, rarely, its identity key).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    pub name: Option<String>,
    pub model_no: Option<String>,
    pub company_name: Option<String>,
    pub min_stock_alert: Option<i64>,
    pub unit: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
}

fn normalize(mut item: Item) -> DomainResult<Item> {
    item.name = item.name.trim().to_string();
    item.model_no = item.model_no.trim().to_string();
    item.company_name = item.company_name.trim().to_string();
    item.unit = trimmed_opt(item.unit);
    item.category = trimmed_opt(item.category);
    item.description = trimmed_opt(item.description);

    if item.name.is_empty() {
        return Err(DomainError::validation("item name cannot be empty"));
    }
    if item.model_no.is_empty() {
        return Err(DomainError::validation("model number cannot be empty"));
    }
    if item.company_name.is_empty() {
        return Err(DomainError::validation("company name cannot be empty"));
    }
    if matches!(item.min_stock_alert, Some(min) if min < 0) {
        return Err(DomainError::validation("minimum stock alert cannot be negative"));
    }
    Ok(item)
}

fn trimmed_opt(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

//! Query-string DTOs and id parsing.
//!
//! Ids arrive as strings so a malformed one maps to our `invalid_id` error
//! body rather than the extractor's plain-text rejection.

use std::str::FromStr;

use axum::response::Response;
use serde::{Deserialize, Serialize};

use stockwise_core::{DomainError, ItemId, LocationId, WarehouseId};
use stockwise_inventory::{StockFilter, StockKey};

use crate::app::errors;

/// Parse a path or query id, mapping failure to a 400 response.
pub fn parse_id<T>(raw: &str) -> Result<T, Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse().map_err(errors::domain_error_to_response)
}

fn optional_id<T>(raw: Option<&str>) -> Result<Option<T>, DomainError>
where
    T: FromStr<Err = DomainError>,
{
    match raw.map(str::trim) {
        None | Some("") | Some("null") => Ok(None),
        Some(v) => v.parse().map(Some),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StockQuery {
    pub item: Option<String>,
    pub warehouse: Option<String>,
}

impl StockQuery {
    pub fn filter(&self) -> Result<StockFilter, DomainError> {
        Ok(StockFilter {
            item: optional_id::<ItemId>(self.item.as_deref())?,
            warehouse: optional_id::<WarehouseId>(self.warehouse.as_deref())?,
        })
    }
}

/// One (item, warehouse, rack) triple; an absent or `null` location means
/// unracked stock.
#[derive(Debug, Default, Deserialize)]
pub struct TripleQuery {
    pub item: Option<String>,
    pub warehouse: Option<String>,
    pub location: Option<String>,
}

impl TripleQuery {
    pub fn key(&self) -> Result<StockKey, DomainError> {
        let item = optional_id::<ItemId>(self.item.as_deref())?;
        let warehouse = optional_id::<WarehouseId>(self.warehouse.as_deref())?;
        let location = optional_id::<LocationId>(self.location.as_deref())?;
        match (item, warehouse) {
            (Some(item), Some(warehouse)) => Ok(StockKey::new(item, warehouse, location)),
            _ => Err(DomainError::validation("item and warehouse are required")),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QuantityResponse {
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: usize,
}

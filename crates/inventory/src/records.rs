//! Denormalized movement records.
//!
//! Each movement operation writes one record per business document next to its
//! ledger rows. Records are for listings only; quantities are always derived
//! from the ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockwise_core::{EntryId, ItemId, LocationId, RecordId, TransferNo, WarehouseId};

use crate::ledger::Action;

/// Purposes accepted by a stock-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutPurpose {
    Sale,
    Demo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockInRecord {
    pub id: RecordId,
    pub entry_id: EntryId,
    pub item_id: ItemId,
    pub warehouse_id: WarehouseId,
    pub location_id: Option<LocationId>,
    pub quantity: i64,
    pub date: DateTime<Utc>,
    pub remarks: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockOutRecord {
    pub id: RecordId,
    pub entry_id: EntryId,
    pub item_id: ItemId,
    pub warehouse_id: WarehouseId,
    pub location_id: Option<LocationId>,
    /// Magnitude taken out (positive).
    pub quantity: i64,
    pub purpose: OutPurpose,
    pub date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub reason: Option<String>,
    pub tender_no: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecord {
    pub id: RecordId,
    pub transfer_no: TransferNo,
    pub item_id: ItemId,
    pub quantity: i64,
    pub from_warehouse_id: WarehouseId,
    pub from_location_id: Option<LocationId>,
    pub to_warehouse_id: WarehouseId,
    pub to_location_id: Option<LocationId>,
    pub note: String,
    pub transfer_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentRecord {
    pub id: RecordId,
    pub entry_id: EntryId,
    pub item_id: ItemId,
    pub warehouse_id: WarehouseId,
    pub location_id: Option<LocationId>,
    /// Magnitude of the correction (positive); direction is `action`.
    pub quantity: i64,
    pub action: Action,
    pub reason: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MovementRecord {
    StockIn(StockInRecord),
    StockOut(StockOutRecord),
    Transfer(TransferRecord),
    Adjustment(AdjustmentRecord),
}

impl MovementRecord {
    pub fn date(&self) -> DateTime<Utc> {
        match self {
            MovementRecord::StockIn(r) => r.date,
            MovementRecord::StockOut(r) => r.date,
            MovementRecord::Transfer(r) => r.transfer_date,
            MovementRecord::Adjustment(r) => r.date,
        }
    }

    pub fn item_id(&self) -> ItemId {
        match self {
            MovementRecord::StockIn(r) => r.item_id,
            MovementRecord::StockOut(r) => r.item_id,
            MovementRecord::Transfer(r) => r.item_id,
            MovementRecord::Adjustment(r) => r.item_id,
        }
    }
}

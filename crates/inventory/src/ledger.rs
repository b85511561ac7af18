//! The stock ledger: one signed quantity movement per entry.
//!
//! The ledger is append-only and is the single source of truth for stock.
//! Current quantity of a triple (item, warehouse, location) is the sum of
//! `quantity` over every entry carrying that triple; `location = None` is its
//! own bucket ("unracked" stock), distinct from every rack.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockwise_core::{DomainError, DomainResult, EntryId, ItemId, LocationId, TransferNo, WarehouseId};

/// Direction of a movement. The sign of `quantity` must agree with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    In,
    Out,
}

impl Action {
    /// Apply this action's sign to a magnitude.
    pub fn signed(self, magnitude: i64) -> i64 {
        match self {
            Action::In => magnitude.abs(),
            Action::Out => -magnitude.abs(),
        }
    }
}

/// Descriptive movement subtype. Never consulted by aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementType {
    In,
    Out,
    #[serde(rename = "Transfer In")]
    TransferIn,
    #[serde(rename = "Transfer Out")]
    TransferOut,
    Adjustment,
    #[serde(rename = "Return In")]
    ReturnIn,
    Manual,
}

/// Business purpose of a movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Purpose {
    Sale,
    Demo,
    #[serde(rename = "Demo Return")]
    DemoReturn,
    Adjusted,
    Transferred,
}

/// Aggregation key: (item, warehouse, optional rack).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockKey {
    pub item_id: ItemId,
    pub warehouse_id: WarehouseId,
    pub location_id: Option<LocationId>,
}

impl StockKey {
    pub fn new(item_id: ItemId, warehouse_id: WarehouseId, location_id: Option<LocationId>) -> Self {
        Self {
            item_id,
            warehouse_id,
            location_id,
        }
    }
}

impl core::fmt::Display for StockKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.location_id {
            Some(loc) => write!(f, "{}/{}/{}", self.item_id, self.warehouse_id, loc),
            None => write!(f, "{}/{}/-", self.item_id, self.warehouse_id),
        }
    }
}

/// Lifecycle of a demo `OUT` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DemoStatus {
    Pending,
    Returned,
}

/// One ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: EntryId,
    pub item_id: ItemId,
    pub warehouse_id: WarehouseId,
    pub location_id: Option<LocationId>,
    /// Signed delta: positive increases stock, negative decreases it.
    pub quantity: i64,
    pub action: Action,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub purpose: Option<Purpose>,
    pub remarks: String,
    /// Business date of the movement (user supplied).
    pub date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub returned: Option<bool>,
    /// On a demo-return row: the demo `OUT` row it closes.
    pub reference_id: Option<EntryId>,
    pub stock_transfer_no: Option<TransferNo>,
    /// When the row was recorded.
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn key(&self) -> StockKey {
        StockKey::new(self.item_id, self.warehouse_id, self.location_id)
    }

    /// Row-level invariants: non-zero quantity whose sign matches `action`.
    pub fn validate(&self) -> DomainResult<()> {
        if self.quantity == 0 {
            return Err(DomainError::invariant("ledger quantity cannot be zero"));
        }
        let sign_ok = match self.action {
            Action::In => self.quantity > 0,
            Action::Out => self.quantity < 0,
        };
        if !sign_ok {
            return Err(DomainError::invariant(format!(
                "quantity {} does not match action {:?}",
                self.quantity, self.action
            )));
        }
        Ok(())
    }

    pub fn is_demo_out(&self) -> bool {
        self.action == Action::Out && self.purpose == Some(Purpose::Demo)
    }

    pub fn is_demo_return(&self) -> bool {
        self.action == Action::In && self.purpose == Some(Purpose::DemoReturn)
    }

    /// Demo lifecycle state; `None` for rows that are not demo `OUT` rows.
    pub fn demo_status(&self) -> Option<DemoStatus> {
        if !self.is_demo_out() {
            return None;
        }
        Some(if self.returned == Some(true) {
            DemoStatus::Returned
        } else {
            DemoStatus::Pending
        })
    }
}

/// Field values for a new ledger row; sign is derived from `action`.
#[derive(Debug, Clone)]
pub(crate) struct EntryDraft {
    pub key: StockKey,
    pub action: Action,
    pub magnitude: i64,
    pub movement_type: MovementType,
    pub purpose: Option<Purpose>,
    pub remarks: String,
    pub date: DateTime<Utc>,
}

impl EntryDraft {
    pub(crate) fn into_entry(self, now: DateTime<Utc>) -> LedgerEntry {
        LedgerEntry {
            id: EntryId::new(),
            item_id: self.key.item_id,
            warehouse_id: self.key.warehouse_id,
            location_id: self.key.location_id,
            quantity: self.action.signed(self.magnitude),
            action: self.action,
            movement_type: self.movement_type,
            purpose: self.purpose,
            remarks: self.remarks,
            date: self.date,
            return_date: None,
            returned: None,
            reference_id: None,
            stock_transfer_no: None,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(action: Action, quantity: i64) -> LedgerEntry {
        let now = Utc::now();
        LedgerEntry {
            id: EntryId::new(),
            item_id: ItemId::new(),
            warehouse_id: WarehouseId::new(),
            location_id: None,
            quantity,
            action,
            movement_type: MovementType::Manual,
            purpose: None,
            remarks: String::new(),
            date: now,
            return_date: None,
            returned: None,
            reference_id: None,
            stock_transfer_no: None,
            created_at: now,
        }
    }

    #[test]
    fn sign_must_match_action() {
        assert!(entry(Action::In, 3).validate().is_ok());
        assert!(entry(Action::Out, -3).validate().is_ok());
        assert!(entry(Action::In, -3).validate().is_err());
        assert!(entry(Action::Out, 3).validate().is_err());
        assert!(entry(Action::In, 0).validate().is_err());
    }

    #[test]
    fn demo_status_tracks_returned_flag() {
        let mut out = entry(Action::Out, -2);
        assert_eq!(out.demo_status(), None);

        out.purpose = Some(Purpose::Demo);
        out.returned = Some(false);
        assert_eq!(out.demo_status(), Some(DemoStatus::Pending));

        out.returned = Some(true);
        assert_eq!(out.demo_status(), Some(DemoStatus::Returned));
    }

    #[test]
    fn wire_names_match_ledger_vocabulary() {
        let json = serde_json::to_value(MovementType::TransferOut).unwrap();
        assert_eq!(json, "Transfer Out");
        let json = serde_json::to_value(Purpose::DemoReturn).unwrap();
        assert_eq!(json, "Demo Return");
        let json = serde_json::to_value(Action::Out).unwrap();
        assert_eq!(json, "OUT");
    }
}

//! Inventory domain: registry entities, the stock ledger and movement rules.
//!
//! This crate is pure, deterministic domain logic (no IO, no HTTP, no storage).
//! Movement operations are planned here as [`movement::Decision`]s; the
//! infrastructure layer commits them atomically.

pub mod balance;
pub mod item;
pub mod ledger;
pub mod location;
pub mod movement;
pub mod records;
pub mod registry;
pub mod resolve;
pub mod warehouse;

#[cfg(test)]
mod fixtures;

pub use balance::{DashboardSummary, DemoReportRow, Discrepancy, PendingDemo, StockFilter, StockRow};
pub use item::{DEFAULT_MIN_STOCK_ALERT, Item, ItemPatch, NewItem};
pub use ledger::{Action, DemoStatus, LedgerEntry, MovementType, Purpose, StockKey};
pub use location::{Location, NewLocation, RenameRack};
pub use movement::{
    Decision, LedgerView, OverdrawPolicy, SkippedLine, StockAdjustment, StockIn, StockInLine, StockOut,
    StockOutLine, StockTransfer,
};
pub use records::{MovementRecord, OutPurpose};
pub use registry::{Catalog, RegistrySnapshot};
pub use resolve::{EntityRef, Unresolved};
pub use warehouse::{NewWarehouse, Warehouse, WarehousePatch};

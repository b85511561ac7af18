//! Read-side reports over the stock store.
//!
//! Balance views are served from the store's materialized balances; demo and
//! history views scan the ledger. Every row is enriched with display names
//! from one registry snapshot.

use serde::Serialize;
use tracing::{instrument, warn};

use stockwise_core::DomainError;
use stockwise_inventory::balance::{self, location_name};
use stockwise_inventory::records::{AdjustmentRecord, StockInRecord, StockOutRecord, TransferRecord};
use stockwise_inventory::{
    Catalog, DashboardSummary, DemoReportRow, Discrepancy, LedgerEntry, MovementRecord, PendingDemo,
    RegistrySnapshot, StockFilter, StockKey, StockRow,
};

use crate::error::ServiceResult;
use crate::store::StockStore;

/// Attempts to read balances and ledger at one version before giving up.
const RECONCILE_ATTEMPTS: u32 = 5;

/// A stored row plus the display names of what it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listed<T> {
    #[serde(flatten)]
    pub row: T,
    pub item_name: String,
    pub model_no: String,
    pub warehouse_name: String,
    pub location_name: String,
}

/// A transfer with names for both ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedTransfer {
    #[serde(flatten)]
    pub row: TransferRecord,
    pub item_name: String,
    pub model_no: String,
    pub from_warehouse_name: String,
    pub from_location_name: String,
    pub to_warehouse_name: String,
    pub to_location_name: String,
}

fn listed<T>(catalog: &RegistrySnapshot, key: StockKey, row: T) -> Listed<T> {
    let item = catalog.item(&key.item_id);
    Listed {
        row,
        item_name: item.map(|i| i.name.clone()).unwrap_or_default(),
        model_no: item.map(|i| i.model_no.clone()).unwrap_or_default(),
        warehouse_name: warehouse_name(catalog, &key),
        location_name: location_name(catalog, key.location_id),
    }
}

fn warehouse_name(catalog: &RegistrySnapshot, key: &StockKey) -> String {
    catalog
        .warehouse(&key.warehouse_id)
        .map(|w| w.name.clone())
        .unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct ReportService<S> {
    store: S,
    default_min_stock_alert: i64,
}

impl<S: StockStore> ReportService<S> {
    pub fn new(store: S, default_min_stock_alert: i64) -> Self {
        Self {
            store,
            default_min_stock_alert,
        }
    }

    /// Non-zero balances per (item, warehouse, rack), optionally filtered.
    pub fn current_stock(&self, filter: &StockFilter) -> ServiceResult<Vec<StockRow>> {
        let registry = self.store.registry()?;
        Ok(balance::current_stock(self.store.balances()?, filter, &registry))
    }

    /// Signed balance of one exact triple.
    pub fn available(&self, key: &StockKey) -> ServiceResult<i64> {
        Ok(self.store.balance(key)?)
    }

    pub fn transfer_candidates(&self) -> ServiceResult<Vec<StockRow>> {
        let registry = self.store.registry()?;
        Ok(balance::transfer_candidates(self.store.balances()?, &registry))
    }

    pub fn dashboard(&self) -> ServiceResult<DashboardSummary> {
        let registry = self.store.registry()?;
        Ok(balance::dashboard(
            self.store.balances()?,
            registry.items.len(),
            &registry,
            self.default_min_stock_alert,
        ))
    }

    pub fn demo_report(&self) -> ServiceResult<Vec<DemoReportRow>> {
        let registry = self.store.registry()?;
        Ok(balance::demo_report(&self.store.entries()?, &registry))
    }

    pub fn pending_demos(&self) -> ServiceResult<Vec<PendingDemo>> {
        let registry = self.store.registry()?;
        Ok(balance::pending_demos(&self.store.entries()?, &registry))
    }

    /// `Return In` rows, newest first.
    pub fn completed_demo_returns(&self) -> ServiceResult<Vec<Listed<LedgerEntry>>> {
        let registry = self.store.registry()?;
        let mut rows: Vec<Listed<LedgerEntry>> = self
            .store
            .entries()?
            .into_iter()
            .filter(LedgerEntry::is_demo_return)
            .map(|e| listed(&registry, e.key(), e))
            .collect();
        rows.sort_by(|a, b| b.row.date.cmp(&a.row.date));
        Ok(rows)
    }

    /// Every ledger row, newest business date first.
    pub fn ledger_history(&self) -> ServiceResult<Vec<Listed<LedgerEntry>>> {
        let registry = self.store.registry()?;
        let mut rows: Vec<Listed<LedgerEntry>> = self
            .store
            .entries()?
            .into_iter()
            .map(|e| listed(&registry, e.key(), e))
            .collect();
        rows.sort_by(|a, b| b.row.date.cmp(&a.row.date).then(b.row.created_at.cmp(&a.row.created_at)));
        Ok(rows)
    }

    pub fn stock_ins(&self) -> ServiceResult<Vec<Listed<StockInRecord>>> {
        let registry = self.store.registry()?;
        let mut rows: Vec<Listed<StockInRecord>> = self
            .records()?
            .into_iter()
            .filter_map(|r| match r {
                MovementRecord::StockIn(r) => Some(r),
                _ => None,
            })
            .map(|r| listed(&registry, StockKey::new(r.item_id, r.warehouse_id, r.location_id), r))
            .collect();
        rows.sort_by(|a, b| b.row.date.cmp(&a.row.date));
        Ok(rows)
    }

    pub fn stock_outs(&self) -> ServiceResult<Vec<Listed<StockOutRecord>>> {
        let registry = self.store.registry()?;
        let mut rows: Vec<Listed<StockOutRecord>> = self
            .records()?
            .into_iter()
            .filter_map(|r| match r {
                MovementRecord::StockOut(r) => Some(r),
                _ => None,
            })
            .map(|r| listed(&registry, StockKey::new(r.item_id, r.warehouse_id, r.location_id), r))
            .collect();
        rows.sort_by(|a, b| b.row.date.cmp(&a.row.date));
        Ok(rows)
    }

    pub fn adjustments(&self) -> ServiceResult<Vec<Listed<AdjustmentRecord>>> {
        let registry = self.store.registry()?;
        let mut rows: Vec<Listed<AdjustmentRecord>> = self
            .records()?
            .into_iter()
            .filter_map(|r| match r {
                MovementRecord::Adjustment(r) => Some(r),
                _ => None,
            })
            .map(|r| listed(&registry, StockKey::new(r.item_id, r.warehouse_id, r.location_id), r))
            .collect();
        rows.sort_by(|a, b| b.row.date.cmp(&a.row.date));
        Ok(rows)
    }

    pub fn transfers(&self) -> ServiceResult<Vec<ListedTransfer>> {
        let registry = self.store.registry()?;
        let mut rows: Vec<ListedTransfer> = self
            .records()?
            .into_iter()
            .filter_map(|r| match r {
                MovementRecord::Transfer(t) => Some(t),
                _ => None,
            })
            .map(|t| {
                let from = StockKey::new(t.item_id, t.from_warehouse_id, t.from_location_id);
                let to = StockKey::new(t.item_id, t.to_warehouse_id, t.to_location_id);
                let item = registry.item(&t.item_id);
                ListedTransfer {
                    item_name: item.map(|i| i.name.clone()).unwrap_or_default(),
                    model_no: item.map(|i| i.model_no.clone()).unwrap_or_default(),
                    from_warehouse_name: warehouse_name(&registry, &from),
                    from_location_name: location_name(&registry, from.location_id),
                    to_warehouse_name: warehouse_name(&registry, &to),
                    to_location_name: location_name(&registry, to.location_id),
                    row: t,
                }
            })
            .collect();
        rows.sort_by(|a, b| b.row.transfer_date.cmp(&a.row.transfer_date));
        Ok(rows)
    }

    fn records(&self) -> ServiceResult<Vec<MovementRecord>> {
        Ok(self.store.records()?)
    }

    /// Replay the ledger and compare with the materialized balances.
    ///
    /// Both reads must come from the same store version; if a commit lands in
    /// between, the comparison is retried.
    #[instrument(skip(self))]
    pub fn reconcile(&self) -> ServiceResult<Vec<Discrepancy>> {
        for attempt in 1..=RECONCILE_ATTEMPTS {
            let before = self.store.version()?;
            let materialized = self.store.balances()?;
            let entries = self.store.entries()?;
            if self.store.version()? != before {
                warn!(attempt, "store changed during reconcile; retrying");
                continue;
            }

            let replayed = balance::fold_balances(&entries);
            let drift = balance::reconcile(&materialized, &replayed);
            if !drift.is_empty() {
                warn!(triples = drift.len(), "materialized balances drifted from the ledger");
            }
            return Ok(drift);
        }
        Err(DomainError::conflict("store kept changing during reconcile").into())
    }
}

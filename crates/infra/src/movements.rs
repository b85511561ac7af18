//! Movement service: stock in, stock out, transfers, adjustments, demo returns.
//!
//! Each operation plans against a registry snapshot and prefetched ledger
//! balances, then commits its ledger rows and movement record(s) as a single
//! batch through the [`Dispatcher`].

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use stockwise_core::{EntryId, TransferNo};
use stockwise_inventory::movement::{
    Overdraw, decide_adjustment, decide_demo_return, decide_stock_in, decide_stock_out, decide_transfer,
};
use stockwise_inventory::records::TransferRecord;
use stockwise_inventory::{
    Decision, LedgerEntry, MovementRecord, OverdrawPolicy, SkippedLine, StockAdjustment, StockIn, StockKey,
    StockOut, StockTransfer,
};

use crate::dispatcher::{Dispatcher, Plan};
use crate::error::ServiceResult;
use crate::store::{PrefetchedLedger, StockStore, WriteBatch};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockInOutcome {
    pub entries: Vec<LedgerEntry>,
    pub skipped: Vec<SkippedLine>,
    /// Lines booked unracked because their location did not resolve.
    pub unracked: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockOutOutcome {
    pub entries: Vec<LedgerEntry>,
    pub skipped: Vec<SkippedLine>,
    pub overdrawn: Vec<Overdraw>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferOutcome {
    pub transfer_no: TransferNo,
    pub record: TransferRecord,
    pub entries: Vec<LedgerEntry>,
}

#[derive(Debug, Clone)]
pub struct MovementService<S> {
    dispatcher: Dispatcher<S>,
    overdraw: OverdrawPolicy,
}

impl<S: StockStore> MovementService<S> {
    pub fn new(store: S, max_retries: u32, overdraw: OverdrawPolicy) -> Self {
        Self {
            dispatcher: Dispatcher::new(store, max_retries),
            overdraw,
        }
    }

    pub fn overdraw_policy(&self) -> OverdrawPolicy {
        self.overdraw
    }

    #[instrument(skip_all, fields(lines = request.lines.len()))]
    pub fn stock_in(&self, request: StockIn) -> ServiceResult<StockInOutcome> {
        let now = Utc::now();
        let decision = self.dispatcher.dispatch("stock_in", |store| {
            let registry = store.registry()?;
            let decision = decide_stock_in(&registry, &request, now)?;
            Ok(Plan::new(WriteBatch::from(&decision), decision))
        })?;

        log_skipped("stock-in", &decision.skipped);
        for line in &decision.unracked {
            warn!(line, "location did not resolve; booked unracked");
        }
        info!(
            created = decision.entries.len(),
            skipped = decision.skipped.len(),
            "stock received"
        );

        Ok(StockInOutcome {
            entries: decision.entries,
            skipped: decision.skipped,
            unracked: decision.unracked,
        })
    }

    #[instrument(skip_all, fields(lines = request.lines.len(), purpose = ?request.purpose))]
    pub fn stock_out(&self, request: StockOut) -> ServiceResult<StockOutOutcome> {
        let now = Utc::now();
        let keys: Vec<StockKey> = request
            .lines
            .iter()
            .filter_map(|l| l.key().ok())
            .collect();

        let decision = self.dispatcher.dispatch("stock_out", |store| {
            let registry = store.registry()?;
            let ledger = PrefetchedLedger::load(store, &keys, &[])?;
            let decision = decide_stock_out(&registry, &ledger, &request, self.overdraw, now)?;
            Ok(Plan::new(WriteBatch::from(&decision), decision))
        })?;

        log_skipped("stock-out", &decision.skipped);
        for o in &decision.overdrawn {
            warn!(
                key = %o.key,
                available = o.available,
                requested = o.requested,
                "stock-out exceeds available quantity"
            );
        }
        info!(
            created = decision.entries.len(),
            skipped = decision.skipped.len(),
            "stock issued"
        );

        Ok(StockOutOutcome {
            entries: decision.entries,
            skipped: decision.skipped,
            overdrawn: decision.overdrawn,
        })
    }

    #[instrument(skip_all, fields(item = %request.item, quantity = request.quantity))]
    pub fn transfer(&self, request: StockTransfer) -> ServiceResult<TransferOutcome> {
        let now = Utc::now();
        let decision = self.dispatcher.dispatch("transfer", |store| {
            let registry = store.registry()?;
            let ledger = PrefetchedLedger::load(store, &[request.source()], &[])?;
            let decision = decide_transfer(&registry, &ledger, &request, now)?;
            Ok(Plan::new(WriteBatch::from(&decision), decision))
        })?;

        let record = transfer_record(&decision)?;
        info!(transfer_no = %record.transfer_no, "stock transferred");
        Ok(TransferOutcome {
            transfer_no: record.transfer_no.clone(),
            record,
            entries: decision.entries,
        })
    }

    #[instrument(skip_all, fields(item = %request.item, action = ?request.action, quantity = request.quantity))]
    pub fn adjust(&self, request: StockAdjustment) -> ServiceResult<LedgerEntry> {
        let now = Utc::now();
        let decision = self.dispatcher.dispatch("adjust", |store| {
            let registry = store.registry()?;
            let decision = decide_adjustment(&registry, &request, now)?;
            Ok(Plan::new(WriteBatch::from(&decision), decision))
        })?;

        let entry = single_entry(decision)?;
        info!(entry_id = %entry.id, delta = entry.quantity, "stock adjusted");
        Ok(entry)
    }

    /// Close a pending demo; returns the new `Return In` row.
    #[instrument(skip(self))]
    pub fn return_demo(&self, entry_id: EntryId) -> ServiceResult<LedgerEntry> {
        let now = Utc::now();
        let decision = self.dispatcher.dispatch("return_demo", |store| {
            let ledger = PrefetchedLedger::load(store, &[], &[entry_id])?;
            let decision = decide_demo_return(&ledger, entry_id, now)?;
            Ok(Plan::new(WriteBatch::from(&decision), decision))
        })?;

        let entry = single_entry(decision)?;
        info!(return_entry = %entry.id, quantity = entry.quantity, "demo returned");
        Ok(entry)
    }
}

fn log_skipped(operation: &str, skipped: &[SkippedLine]) {
    for line in skipped {
        warn!(operation, line = line.index, reason = %line.reason, "line skipped");
    }
}

fn single_entry(decision: Decision) -> ServiceResult<LedgerEntry> {
    decision.entries.into_iter().next().ok_or_else(|| {
        stockwise_core::DomainError::invariant("movement produced no ledger entry").into()
    })
}

fn transfer_record(decision: &Decision) -> ServiceResult<TransferRecord> {
    decision
        .records
        .iter()
        .find_map(|r| match r {
            MovementRecord::Transfer(t) => Some(t.clone()),
            _ => None,
        })
        .ok_or_else(|| stockwise_core::DomainError::invariant("transfer produced no record").into())
}

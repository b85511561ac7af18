//! Read-side aggregation over the ledger.
//!
//! Balances are folds of signed entry quantities per triple. The functions here
//! take already-folded balances (or raw entries) plus a [`Catalog`] for names,
//! so the same code serves both the materialized store view and a full replay.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockwise_core::{EntryId, ItemId, LocationId, WarehouseId};

use crate::ledger::{DemoStatus, LedgerEntry, StockKey};
use crate::registry::Catalog;

/// Display label for unracked stock or a rack that no longer exists.
pub const NO_LOCATION: &str = "—";
const UNKNOWN: &str = "Unknown";

/// Sum signed quantities per triple. Triples that net to zero are kept.
pub fn fold_balances<'a>(entries: impl IntoIterator<Item = &'a LedgerEntry>) -> BTreeMap<StockKey, i64> {
    let mut balances = BTreeMap::new();
    for entry in entries {
        *balances.entry(entry.key()).or_insert(0) += entry.quantity;
    }
    balances
}

/// Optional narrowing of the current-stock view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockFilter {
    #[serde(default)]
    pub item: Option<ItemId>,
    #[serde(default)]
    pub warehouse: Option<WarehouseId>,
}

impl StockFilter {
    pub fn matches(&self, key: &StockKey) -> bool {
        self.item.is_none_or(|i| i == key.item_id) && self.warehouse.is_none_or(|w| w == key.warehouse_id)
    }
}

/// One triple's balance with display names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRow {
    pub item_id: ItemId,
    pub warehouse_id: WarehouseId,
    pub location_id: Option<LocationId>,
    pub item: String,
    pub model_no: String,
    pub company_name: String,
    pub warehouse: String,
    pub location: String,
    pub quantity: i64,
}

impl StockRow {
    pub fn enrich(catalog: &impl Catalog, key: StockKey, quantity: i64) -> Self {
        let item = catalog.item(&key.item_id);
        Self {
            item_id: key.item_id,
            warehouse_id: key.warehouse_id,
            location_id: key.location_id,
            item: item.map_or(UNKNOWN, |i| i.name.as_str()).to_string(),
            model_no: item.map_or("-", |i| i.model_no.as_str()).to_string(),
            company_name: item.map_or(UNKNOWN, |i| i.company_name.as_str()).to_string(),
            warehouse: catalog
                .warehouse(&key.warehouse_id)
                .map_or(UNKNOWN, |w| w.name.as_str())
                .to_string(),
            location: location_name(catalog, key.location_id),
            quantity,
        }
    }

    pub fn key(&self) -> StockKey {
        StockKey::new(self.item_id, self.warehouse_id, self.location_id)
    }
}

pub fn location_name(catalog: &impl Catalog, location: Option<LocationId>) -> String {
    location
        .and_then(|id| catalog.location(&id))
        .map_or(NO_LOCATION, |l| l.name.as_str())
        .to_string()
}

/// Non-zero balances matching `filter`, enriched and ordered by item, warehouse, rack.
pub fn current_stock(
    balances: impl IntoIterator<Item = (StockKey, i64)>,
    filter: &StockFilter,
    catalog: &impl Catalog,
) -> Vec<StockRow> {
    let mut rows: Vec<StockRow> = balances
        .into_iter()
        .filter(|(key, qty)| *qty != 0 && filter.matches(key))
        .map(|(key, qty)| StockRow::enrich(catalog, key, qty))
        .collect();
    sort_rows(&mut rows);
    rows
}

/// Triples holding a positive balance; the sources a transfer may draw from.
pub fn transfer_candidates(
    balances: impl IntoIterator<Item = (StockKey, i64)>,
    catalog: &impl Catalog,
) -> Vec<StockRow> {
    let mut rows: Vec<StockRow> = balances
        .into_iter()
        .filter(|(_, qty)| *qty > 0)
        .map(|(key, qty)| StockRow::enrich(catalog, key, qty))
        .collect();
    sort_rows(&mut rows);
    rows
}

fn sort_rows(rows: &mut [StockRow]) {
    rows.sort_by(|a, b| {
        (&a.item, &a.warehouse, &a.location, a.key()).cmp(&(&b.item, &b.warehouse, &b.location, b.key()))
    });
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_items: usize,
    pub total_stock: i64,
    pub low_stock_items: usize,
}

/// Headline numbers.
///
/// Low stock is judged per (item, warehouse), summing every rack in that
/// warehouse, against the item's own threshold.
pub fn dashboard(
    balances: impl IntoIterator<Item = (StockKey, i64)>,
    item_count: usize,
    catalog: &impl Catalog,
    default_min_stock_alert: i64,
) -> DashboardSummary {
    let mut per_warehouse: HashMap<(ItemId, WarehouseId), i64> = HashMap::new();
    let mut total_stock = 0;
    for (key, qty) in balances {
        total_stock += qty;
        *per_warehouse.entry((key.item_id, key.warehouse_id)).or_insert(0) += qty;
    }

    let low_stock_items = per_warehouse
        .iter()
        .filter(|((item_id, _), qty)| {
            let threshold = catalog
                .item(item_id)
                .map_or(default_min_stock_alert, |i| i.effective_min_stock_alert(default_min_stock_alert));
            **qty < threshold
        })
        .count();

    DashboardSummary {
        total_items: item_count,
        total_stock,
        low_stock_items,
    }
}

/// One demo stock-out and what came back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoReportRow {
    pub entry_id: EntryId,
    pub item: String,
    pub model_no: String,
    pub warehouse: String,
    pub location: String,
    pub requested_qty: i64,
    pub returned_qty: i64,
    pub return_date: Option<DateTime<Utc>>,
    pub returned_on: Option<DateTime<Utc>>,
    pub returned: bool,
}

impl DemoReportRow {
    fn sort_date(&self) -> Option<DateTime<Utc>> {
        self.returned_on.or(self.return_date)
    }
}

/// Every demo stock-out joined with the return row that references it.
///
/// Sorted newest first by actual return date, falling back to the expected
/// one; rows with neither date come last.
pub fn demo_report<'a>(
    entries: impl IntoIterator<Item = &'a LedgerEntry>,
    catalog: &impl Catalog,
) -> Vec<DemoReportRow> {
    let mut outs = Vec::new();
    let mut returns: HashMap<EntryId, &LedgerEntry> = HashMap::new();
    for entry in entries {
        if entry.is_demo_out() {
            outs.push(entry);
        } else if entry.is_demo_return() {
            if let Some(reference) = entry.reference_id {
                returns.insert(reference, entry);
            }
        }
    }

    let mut rows: Vec<DemoReportRow> = outs
        .into_iter()
        .map(|out| {
            let back = returns.get(&out.id);
            let item = catalog.item(&out.item_id);
            DemoReportRow {
                entry_id: out.id,
                item: item.map_or("-", |i| i.name.as_str()).to_string(),
                model_no: item.map_or("-", |i| i.model_no.as_str()).to_string(),
                warehouse: catalog
                    .warehouse(&out.warehouse_id)
                    .map_or("-", |w| w.name.as_str())
                    .to_string(),
                location: location_name(catalog, out.location_id),
                requested_qty: out.quantity.abs(),
                returned_qty: back.map_or(0, |b| b.quantity.abs()),
                return_date: out.return_date,
                returned_on: back.map(|b| b.date),
                returned: back.is_some(),
            }
        })
        .collect();

    // `Option` orders `None` first; reversing the comparison puts it last.
    rows.sort_by(|a, b| b.sort_date().cmp(&a.sort_date()));
    rows
}

/// A demo stock-out still awaiting its return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingDemo {
    pub entry_id: EntryId,
    pub item: String,
    pub model_no: String,
    pub warehouse: String,
    pub location: String,
    pub quantity: i64,
    pub date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
}

pub fn pending_demos<'a>(entries: impl IntoIterator<Item = &'a LedgerEntry>, catalog: &impl Catalog) -> Vec<PendingDemo> {
    let mut rows: Vec<PendingDemo> = entries
        .into_iter()
        .filter(|e| e.demo_status() == Some(DemoStatus::Pending))
        .map(|e| {
            let item = catalog.item(&e.item_id);
            PendingDemo {
                entry_id: e.id,
                item: item.map_or("-", |i| i.name.as_str()).to_string(),
                model_no: item.map_or("-", |i| i.model_no.as_str()).to_string(),
                warehouse: catalog
                    .warehouse(&e.warehouse_id)
                    .map_or("-", |w| w.name.as_str())
                    .to_string(),
                location: location_name(catalog, e.location_id),
                quantity: e.quantity.abs(),
                date: e.date,
                return_date: e.return_date,
            }
        })
        .collect();
    rows.sort_by(|a, b| b.date.cmp(&a.date));
    rows
}

/// A triple whose materialized balance disagrees with a full replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discrepancy {
    pub key: StockKey,
    pub materialized: i64,
    pub replayed: i64,
}

/// Compare materialized balances with a fold of the full ledger.
///
/// A triple missing on one side counts as zero there.
pub fn reconcile(materialized: &BTreeMap<StockKey, i64>, replayed: &BTreeMap<StockKey, i64>) -> Vec<Discrepancy> {
    let mut keys: Vec<&StockKey> = materialized.keys().chain(replayed.keys()).collect();
    keys.sort();
    keys.dedup();

    keys.into_iter()
        .filter_map(|key| {
            let m = materialized.get(key).copied().unwrap_or(0);
            let r = replayed.get(key).copied().unwrap_or(0);
            (m != r).then_some(Discrepancy {
                key: *key,
                materialized: m,
                replayed: r,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{MemLedger, fixture};
    use crate::movement::{
        LedgerView, OverdrawPolicy, StockIn, StockInLine, StockOut, StockOutLine, decide_demo_return,
        decide_stock_in, decide_stock_out,
    };
    use crate::records::OutPurpose;
    use crate::registry::RegistrySnapshot;
    use chrono::Duration;
    use proptest::prelude::*;

    fn stock_in(snapshot: &RegistrySnapshot, ledger: &mut MemLedger, key: StockKey, qty: i64) {
        let request = StockIn {
            lines: vec![StockInLine {
                item: Some(key.item_id.into()),
                warehouse: Some(key.warehouse_id.into()),
                location: key.location_id.map(Into::into),
                quantity: Some(qty),
                ..StockInLine::default()
            }],
            ..StockIn::default()
        };
        ledger.apply(&decide_stock_in(snapshot, &request, Utc::now()).unwrap());
    }

    fn stock_out(
        snapshot: &RegistrySnapshot,
        ledger: &mut MemLedger,
        key: StockKey,
        qty: i64,
        purpose: OutPurpose,
        return_date: Option<DateTime<Utc>>,
    ) -> EntryId {
        let request = StockOut {
            lines: vec![StockOutLine::new(key, qty)],
            purpose: Some(purpose),
            return_date,
            ..StockOut::default()
        };
        let decision = decide_stock_out(snapshot, &*ledger, &request, OverdrawPolicy::Allow, Utc::now()).unwrap();
        ledger.apply(&decision);
        decision.entries[0].id
    }

    #[test]
    fn current_stock_drops_zero_triples_and_labels_unracked() {
        let fx = fixture();
        let racked = fx.key(fx.main, Some(fx.main_rack));
        let loose = fx.key(fx.main, None);
        let mut ledger = MemLedger::default();
        stock_in(&fx.snapshot, &mut ledger, racked, 4);
        stock_in(&fx.snapshot, &mut ledger, loose, 2);
        stock_out(&fx.snapshot, &mut ledger, loose, 2, OutPurpose::Sale, None);

        let balances = fold_balances(&ledger.entries);
        assert_eq!(balances[&loose], 0);

        let rows = current_stock(balances, &StockFilter::default(), &fx.snapshot);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].location, "Rack No-1");
        assert_eq!(rows[0].item, "Probe");
        assert_eq!(rows[0].company_name, "Acme");
        assert_eq!(rows[0].quantity, 4);

        let unracked = StockRow::enrich(&fx.snapshot, loose, 1);
        assert_eq!(unracked.location, NO_LOCATION);
    }

    #[test]
    fn negative_balances_stay_visible() {
        let fx = fixture();
        let key = fx.key(fx.north, None);
        let mut ledger = MemLedger::default();
        stock_out(&fx.snapshot, &mut ledger, key, 3, OutPurpose::Sale, None);

        let balances = fold_balances(&ledger.entries);
        let rows = current_stock(balances.clone(), &StockFilter::default(), &fx.snapshot);
        assert_eq!(rows[0].quantity, -3);
        assert!(transfer_candidates(balances, &fx.snapshot).is_empty());
    }

    #[test]
    fn filter_narrows_by_warehouse() {
        let fx = fixture();
        let mut ledger = MemLedger::default();
        stock_in(&fx.snapshot, &mut ledger, fx.key(fx.main, None), 1);
        stock_in(&fx.snapshot, &mut ledger, fx.key(fx.north, None), 1);

        let filter = StockFilter {
            warehouse: Some(fx.north),
            ..StockFilter::default()
        };
        let rows = current_stock(fold_balances(&ledger.entries), &filter, &fx.snapshot);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].warehouse, "North");
    }

    #[test]
    fn dashboard_counts_low_stock_per_item_and_warehouse() {
        let fx = fixture();
        let mut ledger = MemLedger::default();
        // Main: 3 racked + 3 unracked = 6, above the default threshold of 5.
        stock_in(&fx.snapshot, &mut ledger, fx.key(fx.main, Some(fx.main_rack)), 3);
        stock_in(&fx.snapshot, &mut ledger, fx.key(fx.main, None), 3);
        // North: 2, below.
        stock_in(&fx.snapshot, &mut ledger, fx.key(fx.north, None), 2);

        let summary = dashboard(fold_balances(&ledger.entries), 1, &fx.snapshot, 5);
        assert_eq!(
            summary,
            DashboardSummary {
                total_items: 1,
                total_stock: 8,
                low_stock_items: 1,
            }
        );
    }

    #[test]
    fn dashboard_respects_zero_threshold() {
        let mut fx = fixture();
        fx.snapshot.items.get_mut(&fx.item).unwrap().min_stock_alert = Some(0);
        let mut ledger = MemLedger::default();
        stock_in(&fx.snapshot, &mut ledger, fx.key(fx.main, None), 1);

        let summary = dashboard(fold_balances(&ledger.entries), 1, &fx.snapshot, 5);
        assert_eq!(summary.low_stock_items, 0);
    }

    #[test]
    fn demo_report_joins_returns_and_orders_by_date() {
        let fx = fixture();
        let key = fx.key(fx.main, None);
        let mut ledger = MemLedger::default();
        stock_in(&fx.snapshot, &mut ledger, key, 20);

        let later = Utc::now() + Duration::days(30);
        let sooner = Utc::now() + Duration::days(3);
        let undated = stock_out(&fx.snapshot, &mut ledger, key, 1, OutPurpose::Demo, None);
        let far = stock_out(&fx.snapshot, &mut ledger, key, 2, OutPurpose::Demo, Some(later));
        let near = stock_out(&fx.snapshot, &mut ledger, key, 3, OutPurpose::Demo, Some(sooner));
        stock_out(&fx.snapshot, &mut ledger, key, 4, OutPurpose::Sale, None);

        let back = decide_demo_return(&ledger, near, Utc::now()).unwrap();
        ledger.apply(&back);

        let report = demo_report(&ledger.entries, &fx.snapshot);
        let order: Vec<EntryId> = report.iter().map(|r| r.entry_id).collect();
        assert_eq!(order, vec![far, near, undated]);

        let returned = &report[1];
        assert!(returned.returned);
        assert_eq!(returned.requested_qty, 3);
        assert_eq!(returned.returned_qty, 3);
        assert!(returned.returned_on.is_some());
        assert!(!report[0].returned);
        assert_eq!(report[0].returned_qty, 0);

        let pending: Vec<EntryId> = pending_demos(&ledger.entries, &fx.snapshot)
            .iter()
            .map(|p| p.entry_id)
            .collect();
        assert_eq!(pending.len(), 2);
        assert!(!pending.contains(&near));
    }

    #[test]
    fn reconcile_reports_mismatched_triples() {
        let fx = fixture();
        let a = fx.key(fx.main, None);
        let b = fx.key(fx.north, None);
        let replayed = BTreeMap::from([(a, 5), (b, 0)]);
        let materialized = BTreeMap::from([(a, 5)]);
        assert!(reconcile(&materialized, &replayed).is_empty());

        let drifted = BTreeMap::from([(a, 4)]);
        assert_eq!(
            reconcile(&drifted, &replayed),
            vec![Discrepancy {
                key: a,
                materialized: 4,
                replayed: 5
            }]
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Folding agrees with per-triple lookups, and the current-stock view
        /// contains exactly the non-zero triples.
        #[test]
        fn fold_matches_point_balances(moves in prop::collection::vec((0usize..3, 1i64..20, any::<bool>()), 1..40)) {
            let fx = fixture();
            let keys = [
                fx.key(fx.main, None),
                fx.key(fx.main, Some(fx.main_rack)),
                fx.key(fx.north, Some(fx.north_rack)),
            ];
            let mut ledger = MemLedger::default();
            for (slot, qty, inbound) in moves {
                if inbound {
                    stock_in(&fx.snapshot, &mut ledger, keys[slot], qty);
                } else {
                    stock_out(&fx.snapshot, &mut ledger, keys[slot], qty, OutPurpose::Sale, None);
                }
            }

            let balances = fold_balances(&ledger.entries);
            for key in &keys {
                prop_assert_eq!(balances.get(key).copied().unwrap_or(0), ledger.balance(key));
            }

            let rows = current_stock(balances.clone(), &StockFilter::default(), &fx.snapshot);
            let non_zero = balances.values().filter(|q| **q != 0).count();
            prop_assert_eq!(rows.len(), non_zero);
            prop_assert!(rows.iter().all(|r| r.quantity != 0));
        }
    }
}

//! Integration tests for the full pipeline.
//!
//! Tests: Service → Dispatcher → StockStore → Reports
//!
//! Verifies:
//! - Movement scenarios end to end against materialized balances
//! - Failed operations leave no ledger rows behind
//! - Materialized balances never drift from a ledger replay

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use chrono::{Duration, Utc};
    use proptest::prelude::*;

    use stockwise_core::{DomainError, ItemId, LocationId, WarehouseId};
    use stockwise_inventory::records::OutPurpose;
    use stockwise_inventory::{
        Action, EntityRef, NewItem, NewLocation, NewWarehouse, OverdrawPolicy, StockAdjustment, StockFilter, StockIn,
        StockInLine, StockKey, StockOut, StockOutLine, StockTransfer,
    };

    use crate::config::InventoryConfig;
    use crate::error::ServiceError;
    use crate::store::{InMemoryStockStore, StockStore};
    use crate::Inventory;

    type Store = Arc<InMemoryStockStore>;

    struct World {
        store: Store,
        inv: Inventory<Store>,
        x: ItemId,
        y: ItemId,
        w1: WarehouseId,
        w2: WarehouseId,
        rack_a: LocationId,
        rack_b: LocationId,
    }

    fn world(config: InventoryConfig) -> World {
        let store: Store = Arc::new(InMemoryStockStore::new());
        let inv = Inventory::new(store.clone(), &config);

        let item = |name: &str, model: &str| {
            inv.registry
                .create_item(NewItem {
                    name: name.to_string(),
                    model_no: model.to_string(),
                    company_name: "Acme".to_string(),
                    ..NewItem::default()
                })
                .unwrap()
                .id
        };
        let x = item("Scanner", "X-1");
        let y = item("Meter", "Y-1");

        let w1 = inv
            .registry
            .create_warehouse(NewWarehouse {
                name: "W1".to_string(),
                location: "Pune".to_string(),
            })
            .unwrap()
            .id;
        let w2 = inv
            .registry
            .create_warehouse(NewWarehouse {
                name: "W2".to_string(),
                location: "Delhi".to_string(),
            })
            .unwrap()
            .id;
        inv.registry
            .create_location(NewLocation {
                name: "Rack A".to_string(),
                description: None,
            })
            .unwrap();
        inv.registry
            .create_location(NewLocation {
                name: "Rack B".to_string(),
                description: None,
            })
            .unwrap();

        let snapshot = store.registry().unwrap();
        let rack_a = snapshot.rack_in_warehouse(w1, "Rack A").unwrap().id;
        let rack_b = snapshot.rack_in_warehouse(w2, "Rack B").unwrap().id;

        World {
            store,
            inv,
            x,
            y,
            w1,
            w2,
            rack_a,
            rack_b,
        }
    }

    fn stock_in(w: &World, item: ItemId, warehouse: WarehouseId, location: Option<LocationId>, qty: i64) {
        w.inv
            .movements
            .stock_in(StockIn {
                lines: vec![StockInLine {
                    item: Some(EntityRef::Id(item)),
                    warehouse: Some(EntityRef::Id(warehouse)),
                    location: location.map(EntityRef::Id),
                    quantity: Some(qty),
                    ..StockInLine::default()
                }],
                ..StockIn::default()
            })
            .unwrap();
    }

    fn out_line(item: ItemId, warehouse: WarehouseId, location: Option<LocationId>, qty: i64) -> StockOutLine {
        StockOutLine::new(StockKey::new(item, warehouse, location), qty)
    }

    fn stock_of(w: &World, item: ItemId, warehouse: WarehouseId) -> i64 {
        w.inv
            .reports
            .current_stock(&StockFilter {
                item: Some(item),
                warehouse: Some(warehouse),
            })
            .unwrap()
            .iter()
            .map(|r| r.quantity)
            .sum()
    }

    fn available(w: &World, item: ItemId, warehouse: WarehouseId, location: Option<LocationId>) -> i64 {
        w.inv.reports.available(&StockKey::new(item, warehouse, location)).unwrap()
    }

    #[test]
    fn stock_in_then_sale_nets_out() {
        let w = world(InventoryConfig::default());
        stock_in(&w, w.x, w.w1, None, 10);
        assert_eq!(stock_of(&w, w.x, w.w1), 10);

        w.inv
            .movements
            .stock_out(StockOut {
                lines: vec![out_line(w.x, w.w1, None, 4)],
                purpose: Some(OutPurpose::Sale),
                ..StockOut::default()
            })
            .unwrap();

        assert_eq!(stock_of(&w, w.x, w.w1), 6);
        let entries = w.store.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries.iter().map(|e| e.quantity).sum::<i64>(), 6);
    }

    #[test]
    fn transfer_moves_whole_rack_and_links_rows() {
        let w = world(InventoryConfig::default());
        stock_in(&w, w.x, w.w1, Some(w.rack_a), 6);

        let outcome = w
            .inv
            .movements
            .transfer(StockTransfer {
                item: w.x,
                quantity: 6,
                from_warehouse: w.w1,
                from_location: Some(w.rack_a),
                to_warehouse: w.w2,
                to_location: Some(w.rack_b),
                note: None,
                date: None,
            })
            .unwrap();

        assert_eq!(available(&w, w.x, w.w1, Some(w.rack_a)), 0);
        assert_eq!(available(&w, w.x, w.w2, Some(w.rack_b)), 6);

        let listing = w.inv.reports.current_stock(&StockFilter::default()).unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].warehouse_id, w.w2);

        assert_eq!(outcome.entries.len(), 2);
        assert!(
            outcome
                .entries
                .iter()
                .all(|e| e.stock_transfer_no.as_ref() == Some(&outcome.transfer_no))
        );
    }

    #[test]
    fn insufficient_transfer_writes_nothing() {
        let w = world(InventoryConfig::default());
        stock_in(&w, w.x, w.w1, Some(w.rack_a), 2);
        let before = w.store.entries().unwrap();

        let err = w
            .inv
            .movements
            .transfer(StockTransfer {
                item: w.x,
                quantity: 3,
                from_warehouse: w.w1,
                from_location: Some(w.rack_a),
                to_warehouse: w.w2,
                to_location: None,
                note: None,
                date: None,
            })
            .unwrap_err();

        assert_eq!(
            err,
            ServiceError::Domain(DomainError::conflict("Insufficient stock. Available: 2"))
        );
        assert_eq!(w.store.entries().unwrap(), before);
        assert!(w.inv.reports.transfers().unwrap().is_empty());
    }

    #[test]
    fn demo_round_trip_and_dashboard() {
        let w = world(InventoryConfig::default());
        stock_in(&w, w.x, w.w1, None, 10);
        stock_in(&w, w.y, w.w1, Some(w.rack_a), 8);
        let pre_out = available(&w, w.y, w.w1, Some(w.rack_a));

        let due = Utc::now() + Duration::days(7);
        let out = w
            .inv
            .movements
            .stock_out(StockOut {
                lines: vec![out_line(w.y, w.w1, Some(w.rack_a), 3)],
                purpose: Some(OutPurpose::Demo),
                return_date: Some(due),
                ..StockOut::default()
            })
            .unwrap();
        let demo_id = out.entries[0].id;

        let report = w.inv.reports.demo_report().unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].requested_qty, 3);
        assert_eq!(report[0].returned_qty, 0);
        assert!(!report[0].returned);
        assert_eq!(w.inv.reports.pending_demos().unwrap().len(), 1);

        w.inv.movements.return_demo(demo_id).unwrap();

        let report = w.inv.reports.demo_report().unwrap();
        assert_eq!(report[0].returned_qty, 3);
        assert!(report[0].returned);
        assert_eq!(available(&w, w.y, w.w1, Some(w.rack_a)), pre_out);
        assert!(w.inv.reports.pending_demos().unwrap().is_empty());
        assert_eq!(w.inv.reports.completed_demo_returns().unwrap().len(), 1);

        // Second return is a conflict and writes nothing.
        let ledger_after_first = w.store.entries().unwrap();
        let err = w.inv.movements.return_demo(demo_id).unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Conflict(_))));
        assert_eq!(w.store.entries().unwrap(), ledger_after_first);

        // X: 10 in W1 (not low). Y: 8 in W1 (not low). Threshold is the default 5.
        let summary = w.inv.reports.dashboard().unwrap();
        assert_eq!(summary.total_items, 2);
        assert_eq!(summary.total_stock, 18);
        assert_eq!(summary.low_stock_items, 0);

        w.inv
            .movements
            .stock_out(StockOut {
                lines: vec![out_line(w.y, w.w1, Some(w.rack_a), 4)],
                purpose: Some(OutPurpose::Sale),
                ..StockOut::default()
            })
            .unwrap();
        assert_eq!(w.inv.reports.dashboard().unwrap().low_stock_items, 1);
    }

    #[test]
    fn configured_threshold_applies_to_items_without_one() {
        let w = world(InventoryConfig {
            default_min_stock_alert: 10,
            ..InventoryConfig::default()
        });
        let item = w.store.registry().unwrap().items[&w.x].clone();
        assert_eq!(item.min_stock_alert, None);

        stock_in(&w, w.x, w.w1, None, 7);
        stock_in(&w, w.y, w.w1, None, 12);

        let summary = w.inv.reports.dashboard().unwrap();
        assert_eq!(summary.low_stock_items, 1);
    }

    #[test]
    fn reject_policy_refuses_overdraw_atomically() {
        let w = world(InventoryConfig {
            overdraw_policy: OverdrawPolicy::Reject,
            ..InventoryConfig::default()
        });
        stock_in(&w, w.x, w.w1, None, 5);

        let err = w
            .inv
            .movements
            .stock_out(StockOut {
                lines: vec![out_line(w.x, w.w1, None, 3), out_line(w.x, w.w1, None, 3)],
                purpose: Some(OutPurpose::Sale),
                ..StockOut::default()
            })
            .unwrap_err();

        assert!(matches!(err, ServiceError::Domain(DomainError::Conflict(_))));
        assert_eq!(stock_of(&w, w.x, w.w1), 5);
        assert_eq!(w.store.entries().unwrap().len(), 1);
    }

    #[test]
    fn deleting_a_referenced_warehouse_is_a_conflict() {
        let w = world(InventoryConfig::default());
        stock_in(&w, w.x, w.w1, Some(w.rack_a), 1);

        let err = w.inv.registry.delete_warehouse(w.w1).unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Conflict(_))));
        assert!(w.store.registry().unwrap().warehouses.contains_key(&w.w1));

        // W2 has racks but no ledger rows; it goes, racks and all.
        w.inv.registry.delete_warehouse(w.w2).unwrap();
        let snapshot = w.store.registry().unwrap();
        assert!(!snapshot.warehouses.contains_key(&w.w2));
        assert!(snapshot.locations.values().all(|l| l.warehouse_id != w.w2));
    }

    #[test]
    fn concurrent_transfers_never_oversell() {
        let w = Arc::new(world(InventoryConfig {
            max_commit_retries: 64,
            ..InventoryConfig::default()
        }));
        stock_in(&w, w.x, w.w1, Some(w.rack_a), 5);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let w = Arc::clone(&w);
                thread::spawn(move || {
                    w.inv
                        .movements
                        .transfer(StockTransfer {
                            item: w.x,
                            quantity: 1,
                            from_warehouse: w.w1,
                            from_location: Some(w.rack_a),
                            to_warehouse: w.w2,
                            to_location: Some(w.rack_b),
                            note: None,
                            date: None,
                        })
                        .is_ok()
                })
            })
            .collect();
        let succeeded = handles.into_iter().filter_map(|h| h.join().ok()).filter(|ok| *ok).count();

        assert_eq!(succeeded, 5);
        assert_eq!(available(&w, w.x, w.w1, Some(w.rack_a)), 0);
        assert_eq!(available(&w, w.x, w.w2, Some(w.rack_b)), 5);
        assert!(w.inv.reports.reconcile().unwrap().is_empty());
    }

    #[derive(Debug, Clone)]
    enum Op {
        In { item: usize, wh: usize, rack: bool, qty: i64 },
        Out { item: usize, wh: usize, rack: bool, qty: i64, demo: bool },
        Transfer { item: usize, from: usize, to: usize, qty: i64 },
        Adjust { item: usize, wh: usize, qty: i64, add: bool },
        ReturnFirstDemo,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..2usize, 0..2usize, any::<bool>(), 1..20i64).prop_map(|(item, wh, rack, qty)| Op::In {
                item,
                wh,
                rack,
                qty
            }),
            (0..2usize, 0..2usize, any::<bool>(), 1..20i64, any::<bool>()).prop_map(
                |(item, wh, rack, qty, demo)| Op::Out {
                    item,
                    wh,
                    rack,
                    qty,
                    demo
                }
            ),
            (0..2usize, 0..2usize, 0..2usize, 1..10i64).prop_map(|(item, from, to, qty)| Op::Transfer {
                item,
                from,
                to,
                qty
            }),
            (0..2usize, 0..2usize, 1..10i64, any::<bool>()).prop_map(|(item, wh, qty, add)| Op::Adjust {
                item,
                wh,
                qty,
                add
            }),
            Just(Op::ReturnFirstDemo),
        ]
    }

    fn run(w: &World, op: &Op) {
        let items = [w.x, w.y];
        let whs = [w.w1, w.w2];
        let rack = |wh: usize| if wh == 0 { w.rack_a } else { w.rack_b };

        // Individual operations may be refused (insufficient stock, demo
        // already returned); refusals must leave the store consistent too.
        match *op {
            Op::In { item, wh, rack: racked, qty } => {
                stock_in(w, items[item], whs[wh], racked.then(|| rack(wh)), qty);
            }
            Op::Out {
                item,
                wh,
                rack: racked,
                qty,
                demo,
            } => {
                let _ = w.inv.movements.stock_out(StockOut {
                    lines: vec![out_line(items[item], whs[wh], racked.then(|| rack(wh)), qty)],
                    purpose: Some(if demo { OutPurpose::Demo } else { OutPurpose::Sale }),
                    ..StockOut::default()
                });
            }
            Op::Transfer { item, from, to, qty } => {
                let _ = w.inv.movements.transfer(StockTransfer {
                    item: items[item],
                    quantity: qty,
                    from_warehouse: whs[from],
                    from_location: Some(rack(from)),
                    to_warehouse: whs[to],
                    to_location: None,
                    note: None,
                    date: None,
                });
            }
            Op::Adjust { item, wh, qty, add } => {
                let _ = w.inv.movements.adjust(StockAdjustment {
                    item: items[item],
                    warehouse: whs[wh],
                    location: None,
                    quantity: qty,
                    action: if add { Action::In } else { Action::Out },
                    reason: "count".to_string(),
                    date: None,
                });
            }
            Op::ReturnFirstDemo => {
                if let Some(demo) = w.inv.reports.pending_demos().unwrap().first() {
                    let _ = w.inv.movements.return_demo(demo.entry_id);
                }
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]

        #[test]
        fn materialized_balances_match_replay(ops in prop::collection::vec(op(), 1..25)) {
            let w = world(InventoryConfig::default());
            let mut total_in_out = 0i64;
            for op in &ops {
                run(&w, op);
            }
            for entry in w.store.entries().unwrap() {
                total_in_out += entry.quantity;
            }

            prop_assert!(w.inv.reports.reconcile().unwrap().is_empty());

            let listed: i64 = w
                .inv
                .reports
                .current_stock(&StockFilter::default())
                .unwrap()
                .iter()
                .map(|r| r.quantity)
                .sum();
            prop_assert_eq!(listed, total_in_out);
            prop_assert_eq!(w.inv.reports.dashboard().unwrap().total_stock, total_in_out);
        }
    }
}

//! Entity registry service: items, warehouses and rack locations.

use tracing::{info, instrument};

use stockwise_core::{DomainError, ItemId, LocationId, WarehouseId};
use stockwise_inventory::location::{plan_rename, plan_replication, plan_standard_racks};
use stockwise_inventory::{
    Item, ItemPatch, Location, NewItem, NewLocation, NewWarehouse, RegistrySnapshot, RenameRack, Warehouse,
    WarehousePatch,
};

use crate::dispatcher::{Dispatcher, Plan};
use crate::error::ServiceResult;
use crate::store::{StockStore, WriteBatch, WriteOp};

#[derive(Debug, Clone)]
pub struct RegistryService<S> {
    dispatcher: Dispatcher<S>,
    standard_racks: Vec<String>,
}

impl<S: StockStore> RegistryService<S> {
    pub fn new(store: S, max_retries: u32, standard_racks: Vec<String>) -> Self {
        Self {
            dispatcher: Dispatcher::new(store, max_retries),
            standard_racks,
        }
    }

    fn snapshot(&self) -> ServiceResult<RegistrySnapshot> {
        Ok(self.dispatcher.store().registry()?)
    }

    // -- items ---------------------------------------------------------------

    #[instrument(skip_all, fields(model_no = %new.model_no))]
    pub fn create_item(&self, new: NewItem) -> ServiceResult<Item> {
        let item = self.dispatcher.dispatch("create_item", |store| {
            let snapshot = store.registry()?;
            let item = new.clone().into_item(ItemId::new())?;
            ensure_unique_item(&snapshot, &item)?;
            Ok(Plan::new(WriteBatch::new().with(WriteOp::PutItem(item.clone())), item))
        })?;
        info!(item_id = %item.id, "item created");
        Ok(item)
    }

    #[instrument(skip(self, patch))]
    pub fn update_item(&self, id: ItemId, patch: ItemPatch) -> ServiceResult<Item> {
        let item = self.dispatcher.dispatch("update_item", |store| {
            let snapshot = store.registry()?;
            let current = snapshot
                .items
                .get(&id)
                .ok_or_else(|| DomainError::not_found(format!("item {id}")))?;
            let next = current.patched(&patch)?;
            ensure_unique_item(&snapshot, &next)?;
            Ok(Plan::new(WriteBatch::new().with(WriteOp::PutItem(next.clone())), next))
        })?;
        info!("item updated");
        Ok(item)
    }

    #[instrument(skip(self))]
    pub fn delete_item(&self, id: ItemId) -> ServiceResult<()> {
        self.dispatcher.dispatch("delete_item", |store| {
            if !store.registry()?.items.contains_key(&id) {
                return Err(DomainError::not_found(format!("item {id}")).into());
            }
            Ok(Plan::new(WriteBatch::new().with(WriteOp::DeleteItem(id)), ()))
        })?;
        info!("item deleted");
        Ok(())
    }

    pub fn get_item(&self, id: ItemId) -> ServiceResult<Item> {
        self.snapshot()?
            .items
            .remove(&id)
            .ok_or_else(|| DomainError::not_found(format!("item {id}")).into())
    }

    /// Items ordered by name.
    pub fn list_items(&self) -> ServiceResult<Vec<Item>> {
        let mut items: Vec<Item> = self.snapshot()?.items.into_values().collect();
        items.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(items)
    }

    // -- warehouses ----------------------------------------------------------

    #[instrument(skip_all, fields(name = %new.name))]
    pub fn create_warehouse(&self, new: NewWarehouse) -> ServiceResult<Warehouse> {
        let warehouse = new.into_warehouse(WarehouseId::new())?;
        let created = self.dispatcher.dispatch("create_warehouse", |_| {
            Ok(Plan::new(
                WriteBatch::new().with(WriteOp::PutWarehouse(warehouse.clone())),
                warehouse.clone(),
            ))
        })?;
        info!(warehouse_id = %created.id, "warehouse created");
        Ok(created)
    }

    #[instrument(skip(self, patch))]
    pub fn update_warehouse(&self, id: WarehouseId, patch: WarehousePatch) -> ServiceResult<Warehouse> {
        let warehouse = self.dispatcher.dispatch("update_warehouse", |store| {
            let snapshot = store.registry()?;
            let current = snapshot
                .warehouses
                .get(&id)
                .ok_or_else(|| DomainError::not_found(format!("warehouse {id}")))?;
            let next = current.patched(&patch)?;
            Ok(Plan::new(WriteBatch::new().with(WriteOp::PutWarehouse(next.clone())), next))
        })?;
        info!("warehouse updated");
        Ok(warehouse)
    }

    /// Delete a warehouse together with its racks.
    ///
    /// Fails with a conflict if the ledger references the warehouse or any of
    /// its racks; nothing is deleted in that case.
    #[instrument(skip(self))]
    pub fn delete_warehouse(&self, id: WarehouseId) -> ServiceResult<()> {
        let racks = self.dispatcher.dispatch("delete_warehouse", |store| {
            let snapshot = store.registry()?;
            if !snapshot.warehouses.contains_key(&id) {
                return Err(DomainError::not_found(format!("warehouse {id}")).into());
            }
            let mut batch: WriteBatch = snapshot
                .locations
                .values()
                .filter(|l| l.warehouse_id == id)
                .map(|l| WriteOp::DeleteLocation(l.id))
                .collect();
            let racks = batch.len();
            batch.push(WriteOp::DeleteWarehouse(id));
            Ok(Plan::new(batch, racks))
        })?;
        info!(racks, "warehouse deleted");
        Ok(())
    }

    pub fn get_warehouse(&self, id: WarehouseId) -> ServiceResult<Warehouse> {
        self.snapshot()?
            .warehouses
            .remove(&id)
            .ok_or_else(|| DomainError::not_found(format!("warehouse {id}")).into())
    }

    pub fn list_warehouses(&self) -> ServiceResult<Vec<Warehouse>> {
        let mut warehouses: Vec<Warehouse> = self.snapshot()?.warehouses.into_values().collect();
        warehouses.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(warehouses)
    }

    // -- locations -----------------------------------------------------------

    /// Create a rack name in every warehouse that lacks it.
    #[instrument(skip_all, fields(name = %new.name))]
    pub fn create_location(&self, new: NewLocation) -> ServiceResult<Vec<Location>> {
        let created = self.dispatcher.dispatch("create_location", |store| {
            let rows = plan_replication(&store.registry()?, &new)?;
            let batch = rows.iter().cloned().map(WriteOp::PutLocation).collect();
            Ok(Plan::new(batch, rows))
        })?;
        info!(warehouses = created.len(), "rack replicated");
        Ok(created)
    }

    /// Rename (and optionally re-describe) every rack row named `name`.
    #[instrument(skip(self, request), fields(new_name = %request.new_name))]
    pub fn update_locations_by_name(&self, name: &str, request: RenameRack) -> ServiceResult<usize> {
        let updated = self.dispatcher.dispatch("update_locations_by_name", |store| {
            let rows = plan_rename(&store.registry()?, name, &request)?;
            let count = rows.len();
            Ok(Plan::new(rows.into_iter().map(WriteOp::PutLocation).collect(), count))
        })?;
        info!(updated, "racks renamed");
        Ok(updated)
    }

    /// Delete every rack row named `name` (case-insensitive), all or nothing.
    #[instrument(skip(self))]
    pub fn delete_locations_by_name(&self, name: &str) -> ServiceResult<usize> {
        let deleted = self.dispatcher.dispatch("delete_locations_by_name", |store| {
            let snapshot = store.registry()?;
            let batch: WriteBatch = snapshot
                .locations_named(name)
                .into_iter()
                .map(|l| WriteOp::DeleteLocation(l.id))
                .collect();
            if batch.is_empty() {
                return Err(DomainError::not_found(format!("no locations named \"{}\"", name.trim())).into());
            }
            let count = batch.len();
            Ok(Plan::new(batch, count))
        })?;
        info!(deleted, "racks deleted");
        Ok(deleted)
    }

    #[instrument(skip(self))]
    pub fn delete_location(&self, id: LocationId) -> ServiceResult<()> {
        self.dispatcher.dispatch("delete_location", |store| {
            if !store.registry()?.locations.contains_key(&id) {
                return Err(DomainError::not_found(format!("location {id}")).into());
            }
            Ok(Plan::new(WriteBatch::new().with(WriteOp::DeleteLocation(id)), ()))
        })?;
        info!("rack deleted");
        Ok(())
    }

    /// Make sure every configured standard rack exists in every warehouse.
    #[instrument(skip(self))]
    pub fn replicate_standard_racks(&self) -> ServiceResult<Vec<Location>> {
        let created = self.dispatcher.dispatch("replicate_standard_racks", |store| {
            let rows = plan_standard_racks(&store.registry()?, &self.standard_racks);
            let batch = rows.iter().cloned().map(WriteOp::PutLocation).collect();
            Ok(Plan::new(batch, rows))
        })?;
        info!(created = created.len(), "standard racks replicated");
        Ok(created)
    }

    /// Rack rows ordered by warehouse, then rack name.
    pub fn list_locations(&self) -> ServiceResult<Vec<Location>> {
        let snapshot = self.snapshot()?;
        let warehouse_name = |id: &WarehouseId| snapshot.warehouses.get(id).map(|w| w.name.clone());
        let mut locations: Vec<Location> = snapshot.locations.values().cloned().collect();
        locations.sort_by(|a, b| {
            (warehouse_name(&a.warehouse_id), &a.name, a.id).cmp(&(warehouse_name(&b.warehouse_id), &b.name, b.id))
        });
        Ok(locations)
    }
}

fn ensure_unique_item(snapshot: &RegistrySnapshot, item: &Item) -> Result<(), DomainError> {
    match snapshot.items.values().find(|i| i.id != item.id && i.same_identity(item)) {
        Some(_) => Err(DomainError::conflict(format!(
            "item with model number \"{}\" from \"{}\" already exists",
            item.model_no, item.company_name
        ))),
        None => Ok(()),
    }
}

use std::sync::Arc;

use stockwise_infra::{InMemoryStockStore, Inventory, InventoryConfig, ServiceResult, StockStore};

pub type AppStore = Arc<InMemoryStockStore>;

/// Everything a handler needs: the shared store and the services over it.
#[derive(Debug, Clone)]
pub struct AppServices {
    store: AppStore,
    pub inventory: Inventory<AppStore>,
}

impl AppServices {
    /// Current commit version of the store.
    pub fn version(&self) -> ServiceResult<u64> {
        Ok(self.store.version()?)
    }
}

pub fn build_services(config: &InventoryConfig) -> AppServices {
    let store: AppStore = Arc::new(InMemoryStockStore::new());
    AppServices {
        inventory: Inventory::new(store.clone(), config),
        store,
    }
}

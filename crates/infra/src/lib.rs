//! Infrastructure layer: storage, transactional dispatch, services and config.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod movements;
pub mod registry;
pub mod reports;
pub mod store;

mod integration_tests;

pub use config::{ConfigError, InventoryConfig};
pub use error::{ServiceError, ServiceResult};
pub use movements::MovementService;
pub use registry::RegistryService;
pub use reports::ReportService;
pub use store::{InMemoryStockStore, StockStore, StoreError};

/// Registry, movement and report services sharing one store.
#[derive(Debug, Clone)]
pub struct Inventory<S> {
    pub registry: RegistryService<S>,
    pub movements: MovementService<S>,
    pub reports: ReportService<S>,
}

impl<S: StockStore + Clone> Inventory<S> {
    pub fn new(store: S, config: &InventoryConfig) -> Self {
        Self {
            registry: RegistryService::new(
                store.clone(),
                config.max_commit_retries,
                config.standard_racks.clone(),
            ),
            movements: MovementService::new(store.clone(), config.max_commit_retries, config.overdraw_policy),
            reports: ReportService::new(store, config.default_min_stock_alert),
        }
    }
}

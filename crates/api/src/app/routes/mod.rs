use axum::Router;

pub mod demos;
pub mod items;
pub mod locations;
pub mod movements;
pub mod reports;
pub mod system;
pub mod warehouses;

/// Router for every stock-ledger endpoint.
pub fn router() -> Router {
    Router::new()
        .merge(items::router())
        .merge(warehouses::router())
        .merge(locations::router())
        .merge(movements::router())
        .merge(demos::router())
        .merge(reports::router())
}

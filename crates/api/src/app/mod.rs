//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store and service wiring shared by every handler
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: query DTOs and id parsing helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use stockwise_infra::InventoryConfig;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: &InventoryConfig) -> Router {
    let services = Arc::new(services::build_services(config));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(ServiceBuilder::new().layer(Extension(services)))
}

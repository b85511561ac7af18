use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use stockwise_core::WarehouseId;
use stockwise_inventory::{NewWarehouse, WarehousePatch};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/warehouses", get(list_warehouses).post(create_warehouse))
        .route("/warehouses/:id", get(get_warehouse).put(update_warehouse).delete(delete_warehouse))
}

pub async fn create_warehouse(Extension(services): Extension<Arc<AppServices>>, Json(body): Json<NewWarehouse>) -> Response {
    errors::respond(StatusCode::CREATED, services.inventory.registry.create_warehouse(body))
}

pub async fn list_warehouses(Extension(services): Extension<Arc<AppServices>>) -> Response {
    errors::respond(StatusCode::OK, services.inventory.registry.list_warehouses())
}

pub async fn get_warehouse(Extension(services): Extension<Arc<AppServices>>, Path(id): Path<String>) -> Response {
    let id: WarehouseId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(StatusCode::OK, services.inventory.registry.get_warehouse(id))
}

pub async fn update_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<WarehousePatch>,
) -> Response {
    let id: WarehouseId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(StatusCode::OK, services.inventory.registry.update_warehouse(id, body))
}

/// Removes the warehouse with its racks; refused while the ledger references either.
pub async fn delete_warehouse(Extension(services): Extension<Arc<AppServices>>, Path(id): Path<String>) -> Response {
    let id: WarehouseId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.inventory.registry.delete_warehouse(id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

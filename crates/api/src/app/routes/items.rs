use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use stockwise_core::ItemId;
use stockwise_inventory::{ItemPatch, NewItem};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route("/items/:id", get(get_item).put(update_item).delete(delete_item))
}

pub async fn create_item(Extension(services): Extension<Arc<AppServices>>, Json(body): Json<NewItem>) -> Response {
    errors::respond(StatusCode::CREATED, services.inventory.registry.create_item(body))
}

pub async fn list_items(Extension(services): Extension<Arc<AppServices>>) -> Response {
    errors::respond(StatusCode::OK, services.inventory.registry.list_items())
}

pub async fn get_item(Extension(services): Extension<Arc<AppServices>>, Path(id): Path<String>) -> Response {
    let id: ItemId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(StatusCode::OK, services.inventory.registry.get_item(id))
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<ItemPatch>,
) -> Response {
    let id: ItemId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(StatusCode::OK, services.inventory.registry.update_item(id, body))
}

pub async fn delete_item(Extension(services): Extension<Arc<AppServices>>, Path(id): Path<String>) -> Response {
    let id: ItemId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.inventory.registry.delete_item(id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

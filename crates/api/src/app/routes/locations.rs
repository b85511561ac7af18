use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};

use stockwise_core::LocationId;
use stockwise_inventory::{NewLocation, RenameRack};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/locations", get(list_locations).post(create_location))
        .route("/locations/replicate-standard", post(replicate_standard))
        .route("/locations/by-name/:name", put(rename_by_name).delete(delete_by_name))
        .route("/locations/:id", delete(delete_location))
}

/// Creates the rack in every warehouse that lacks it.
pub async fn create_location(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<NewLocation>,
) -> Response {
    errors::respond(StatusCode::CREATED, services.inventory.registry.create_location(body))
}

pub async fn list_locations(Extension(services): Extension<Arc<AppServices>>) -> Response {
    errors::respond(StatusCode::OK, services.inventory.registry.list_locations())
}

pub async fn rename_by_name(
    Extension(services): Extension<Arc<AppServices>>,
    Path(name): Path<String>,
    Json(body): Json<RenameRack>,
) -> Response {
    let result = services.inventory.registry.update_locations_by_name(&name, body);
    errors::respond(StatusCode::OK, result.map(|count| dto::CountResponse { count }))
}

pub async fn delete_by_name(Extension(services): Extension<Arc<AppServices>>, Path(name): Path<String>) -> Response {
    let result = services.inventory.registry.delete_locations_by_name(&name);
    errors::respond(StatusCode::OK, result.map(|count| dto::CountResponse { count }))
}

pub async fn delete_location(Extension(services): Extension<Arc<AppServices>>, Path(id): Path<String>) -> Response {
    let id: LocationId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.inventory.registry.delete_location(id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn replicate_standard(Extension(services): Extension<Arc<AppServices>>) -> Response {
    errors::respond(StatusCode::OK, services.inventory.registry.replicate_standard_racks())
}

use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::Response};
use serde_json::json;

use crate::app::errors;
use crate::app::services::AppServices;

pub async fn health(Extension(services): Extension<Arc<AppServices>>) -> Response {
    errors::respond(
        StatusCode::OK,
        services.version().map(|version| json!({ "status": "ok", "version": version })),
    )
}

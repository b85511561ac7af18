use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::{get, post},
};

use stockwise_core::EntryId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/demo-returns/pending", get(pending))
        .route("/demo-returns/completed", get(completed))
        .route("/demo-returns/report", get(report))
        .route("/demo-returns/:id/return", post(return_demo))
}

pub async fn pending(Extension(services): Extension<Arc<AppServices>>) -> Response {
    errors::respond(StatusCode::OK, services.inventory.reports.pending_demos())
}

pub async fn completed(Extension(services): Extension<Arc<AppServices>>) -> Response {
    errors::respond(StatusCode::OK, services.inventory.reports.completed_demo_returns())
}

pub async fn report(Extension(services): Extension<Arc<AppServices>>) -> Response {
    errors::respond(StatusCode::OK, services.inventory.reports.demo_report())
}

/// Books the demo stock back in; a second call for the same entry is a 409.
pub async fn return_demo(Extension(services): Extension<Arc<AppServices>>, Path(id): Path<String>) -> Response {
    let id: EntryId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(StatusCode::CREATED, services.inventory.movements.return_demo(id))
}

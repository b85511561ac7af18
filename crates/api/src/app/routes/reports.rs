use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Query},
    http::StatusCode,
    response::Response,
    routing::get,
};
use serde_json::json;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/stock-ledger", get(ledger))
        .route("/current-stock", get(current_stock))
        .route("/current-stock/dashboard", get(dashboard))
        .route("/current-stock/by-rack", get(by_rack))
        .route("/admin/reconcile", get(reconcile))
}

pub async fn ledger(Extension(services): Extension<Arc<AppServices>>) -> Response {
    errors::respond(StatusCode::OK, services.inventory.reports.ledger_history())
}

pub async fn current_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::StockQuery>,
) -> Response {
    let filter = match query.filter() {
        Ok(f) => f,
        Err(e) => return errors::domain_error_to_response(e),
    };
    errors::respond(StatusCode::OK, services.inventory.reports.current_stock(&filter))
}

pub async fn dashboard(Extension(services): Extension<Arc<AppServices>>) -> Response {
    errors::respond(StatusCode::OK, services.inventory.reports.dashboard())
}

pub async fn by_rack(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::TripleQuery>,
) -> Response {
    let key = match query.key() {
        Ok(k) => k,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let result = services.inventory.reports.available(&key);
    errors::respond(StatusCode::OK, result.map(|quantity| dto::QuantityResponse { quantity }))
}

pub async fn reconcile(Extension(services): Extension<Arc<AppServices>>) -> Response {
    let result = services.inventory.reports.reconcile().map(|drift| {
        json!({
            "consistent": drift.is_empty(),
            "discrepancies": drift,
        })
    });
    errors::respond(StatusCode::OK, result)
}

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    http::StatusCode,
    response::Response,
    routing::get,
};

use stockwise_inventory::{StockAdjustment, StockIn, StockOut, StockTransfer};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/stock-in", get(list_stock_ins).post(stock_in))
        .route("/stock-out", get(list_stock_outs).post(stock_out))
        .route("/stock-transfers", get(list_transfers).post(transfer))
        .route("/stock-transfers/available", get(transfer_candidates))
        .route("/stock-transfers/available-qty", get(available_qty))
        .route("/stock-adjustments", get(list_adjustments).post(adjust))
}

pub async fn stock_in(Extension(services): Extension<Arc<AppServices>>, Json(body): Json<StockIn>) -> Response {
    errors::respond(StatusCode::CREATED, services.inventory.movements.stock_in(body))
}

pub async fn list_stock_ins(Extension(services): Extension<Arc<AppServices>>) -> Response {
    errors::respond(StatusCode::OK, services.inventory.reports.stock_ins())
}

pub async fn stock_out(Extension(services): Extension<Arc<AppServices>>, Json(body): Json<StockOut>) -> Response {
    errors::respond(StatusCode::CREATED, services.inventory.movements.stock_out(body))
}

pub async fn list_stock_outs(Extension(services): Extension<Arc<AppServices>>) -> Response {
    errors::respond(StatusCode::OK, services.inventory.reports.stock_outs())
}

pub async fn transfer(Extension(services): Extension<Arc<AppServices>>, Json(body): Json<StockTransfer>) -> Response {
    errors::respond(StatusCode::CREATED, services.inventory.movements.transfer(body))
}

pub async fn list_transfers(Extension(services): Extension<Arc<AppServices>>) -> Response {
    errors::respond(StatusCode::OK, services.inventory.reports.transfers())
}

/// Triples with stock on hand, for picking a transfer source.
pub async fn transfer_candidates(Extension(services): Extension<Arc<AppServices>>) -> Response {
    errors::respond(StatusCode::OK, services.inventory.reports.transfer_candidates())
}

pub async fn available_qty(
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

pub async fn adjust(Extension(services): Extension<Arc<AppServices>>, Json(body): Json<StockAdjustment>) -> Response {
    errors::respond(StatusCode::CREATED, services.inventory.movements.adjust(body))
}

pub async fn list_adjustments(Extension(services): Extension<Arc<AppServices>>) -> Response {
    errors::respond(StatusCode::OK, services.inventory.reports.adjustments())
}

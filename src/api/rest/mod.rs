pub mod drivers;
pub mod orders;
pub mod ws;

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::engine::reports::{fleet_overview, FleetOverview};
use crate::error::AppError;
use crate::models::driver::GeoPoint;
use crate::models::order::OrderStatus;
use crate::services::geocoder::describe_position;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(drivers::router())
        .merge(orders::router())
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/stats", get(stats))
        .route("/geocode/reverse", get(reverse_geocode))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    orders: usize,
    pending_orders: usize,
    drivers: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        orders: state.orders.len(),
        pending_orders: state.orders.count_by_status(OrderStatus::Pending),
        drivers: state.drivers.len(),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}

async fn stats(State(state): State<Arc<AppState>>) -> Json<FleetOverview> {
    Json(fleet_overview(&state))
}

#[derive(Serialize)]
struct AddressResponse {
    address: String,
}

async fn reverse_geocode(
    State(state): State<Arc<AppState>>,
    Query(point): Query<GeoPoint>,
) -> Result<Json<AddressResponse>, AppError> {
    if !point.is_valid() {
        return Err(AppError::Validation(format!(
            "coordinates out of range: {}, {}",
            point.lat, point.lng
        )));
    }

    let address = describe_position(state.geocoder.as_ref(), point).await;
    Ok(Json(AddressResponse { address }))
}

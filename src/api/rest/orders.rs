use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::dispatch;
use crate::engine::pricing::FareQuote;
use crate::error::AppError;
use crate::models::order::{NewOrder, Order, OrderFilter};
use crate::models::vehicle::VehicleType;
use crate::services::parser::ParsedOrderDraft;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", post(create_order).get(list_orders))
        .route("/orders/draft", post(create_order_from_draft))
        .route("/orders/quote", post(quote_fare))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/accept", post(accept_order))
        .route("/orders/:id/pickup", post(confirm_pickup))
        .route("/orders/:id/complete", post(complete_order))
        .route("/orders/:id/payout", post(settle_payout))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftOrderRequest {
    pub customer_name: String,
    #[serde(flatten)]
    pub draft: ParsedOrderDraft,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub origin: String,
    pub destination: String,
    pub vehicle_type: VehicleType,
    #[serde(default)]
    pub current_price: Option<u64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverActionRequest {
    pub driver_id: String,
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewOrder>,
) -> Result<Json<Order>, AppError> {
    dispatch::submit_order(&state, payload).map(Json)
}

async fn create_order_from_draft(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DraftOrderRequest>,
) -> Result<Json<Order>, AppError> {
    dispatch::submit_draft(&state, payload.customer_name, payload.draft).map(Json)
}

async fn quote_fare(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<QuoteRequest>,
) -> Json<FareQuote> {
    let quote = dispatch::quote_fare(
        &state,
        &payload.origin,
        &payload.destination,
        payload.vehicle_type,
        payload.current_price,
    )
    .await;

    Json(quote)
}

async fn list_orders(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<OrderFilter>,
) -> Json<Vec<Order>> {
    Json(state.orders.list(&filter))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    state.orders.get(id).map(Json)
}

async fn accept_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DriverActionRequest>,
) -> Result<Json<Order>, AppError> {
    dispatch::accept_order(&state, id, &payload.driver_id).map(Json)
}

async fn confirm_pickup(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DriverActionRequest>,
) -> Result<Json<Order>, AppError> {
    dispatch::confirm_pickup(&state, id, &payload.driver_id).map(Json)
}

async fn complete_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DriverActionRequest>,
) -> Result<Json<Order>, AppError> {
    dispatch::complete_order(&state, id, &payload.driver_id).map(Json)
}

async fn settle_payout(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    dispatch::settle_payout(&state, id).map(Json)
}

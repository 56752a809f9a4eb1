use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post, put};
use axum::Json;
use axum::Router;
use serde::Deserialize;

use crate::engine::dispatch;
use crate::engine::proximity::{nearby_orders, NearbyOrder, RadiusPolicy};
use crate::engine::reports::{driver_settlement, DriverSettlement};
use crate::error::AppError;
use crate::models::driver::{
    ApprovalStatus, DriverRegistration, LocationAck, LocationReport, NewRegistration,
};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers", post(register_driver).get(list_drivers))
        .route("/drivers/:id", get(get_driver))
        .route("/drivers/:id/approve", post(approve_driver))
        .route("/drivers/:id/reject", post(reject_driver))
        .route("/drivers/:id/location", put(update_location))
        .route("/drivers/:id/nearby-orders", get(list_nearby_orders))
        .route("/drivers/:id/settlement", get(get_settlement))
}

#[derive(Deserialize)]
pub struct DriverQuery {
    pub status: Option<ApprovalStatus>,
    pub tracking: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyQuery {
    pub radius_km: Option<f64>,
    pub limit: Option<usize>,
}

async fn register_driver(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewRegistration>,
) -> Result<Json<DriverRegistration>, AppError> {
    dispatch::register_driver(&state, payload).map(Json)
}

async fn list_drivers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DriverQuery>,
) -> Json<Vec<DriverRegistration>> {
    let drivers = state.drivers.list_where(|driver| {
        query.status.is_none_or(|status| driver.status == status)
            && query
                .tracking
                .is_none_or(|tracking| driver.position().is_some() == tracking)
    });

    Json(drivers)
}

async fn get_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DriverRegistration>, AppError> {
    state.drivers.get(&id).map(Json)
}

async fn approve_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DriverRegistration>, AppError> {
    dispatch::approve_driver(&state, &id).map(Json)
}

async fn reject_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DriverRegistration>, AppError> {
    dispatch::reject_driver(&state, &id).map(Json)
}

async fn update_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<LocationReport>,
) -> Result<Json<LocationAck>, AppError> {
    dispatch::report_location(&state, &id, payload).map(Json)
}

async fn list_nearby_orders(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<Vec<NearbyOrder>>, AppError> {
    let policy = RadiusPolicy {
        max_km: Some(query.radius_km.unwrap_or(state.nearby_radius_km)),
        limit: query.limit,
    };

    nearby_orders(&state, &id, policy).await.map(Json)
}

async fn get_settlement(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DriverSettlement>, AppError> {
    driver_settlement(&state, &id).map(Json)
}

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AppError;
use crate::models::order::{Order, OrderFilter, OrderStatus};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadiusPolicy {
    /// Orders further away, or at an unknown distance, are dropped.
    pub max_km: Option<f64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyOrder {
    #[serde(flatten)]
    pub order: Order,
    pub distance_km: Option<f64>,
}

/// PENDING orders around an approved driver who is tracking.
///
/// Nearest first. Without a radius, orders whose distance the oracle could
/// not determine follow the ranked ones in most-recent-first order.
pub async fn nearby_orders(
    state: &AppState,
    driver_id: &str,
    policy: RadiusPolicy,
) -> Result<Vec<NearbyOrder>, AppError> {
    if let Some(max_km) = policy.max_km {
        if !(max_km.is_finite() && max_km >= 0.0) {
            return Err(AppError::Validation(format!("invalid radius {max_km}")));
        }
    }

    let driver = state.drivers.get(driver_id)?;
    if !driver.is_approved() {
        return Err(AppError::DriverNotEligible(driver_id.to_string()));
    }
    let position = driver
        .position()
        .ok_or_else(|| AppError::DriverNotEligible(driver_id.to_string()))?;

    let pending = state
        .orders
        .list(&OrderFilter::with_status(OrderStatus::Pending));

    let mut ranked = Vec::with_capacity(pending.len());
    let mut unranked = Vec::new();
    for order in pending {
        match state.distance_oracle.distance_km(position, &order).await {
            Ok(km) if km.is_finite() && km >= 0.0 => ranked.push((km, order)),
            Ok(km) => {
                debug!(order_id = %order.id, km, "distance oracle returned an unusable value");
                unranked.push(order);
            }
            Err(err) => {
                debug!(order_id = %order.id, error = %err, "distance unknown");
                unranked.push(order);
            }
        }
    }
    ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

    let ranked = ranked.into_iter().map(|(km, order)| NearbyOrder {
        order,
        distance_km: Some(km),
    });
    let mut nearby: Vec<NearbyOrder> = match policy.max_km {
        Some(max_km) => ranked
            .filter(|candidate| candidate.distance_km.is_some_and(|km| km <= max_km))
            .collect(),
        None => ranked
            .chain(unranked.into_iter().map(|order| NearbyOrder {
                order,
                distance_km: None,
            }))
            .collect(),
    };

    if let Some(limit) = policy.limit {
        nearby.truncate(limit);
    }

    Ok(nearby)
}

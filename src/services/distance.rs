use async_trait::async_trait;

use crate::models::driver::GeoPoint;
use crate::models::order::Order;
use crate::services::ServiceError;

/// Distance from a driver's position to where an order is picked up.
#[async_trait]
pub trait DistanceOracle: Send + Sync {
    async fn distance_km(&self, from: GeoPoint, order: &Order) -> Result<f64, ServiceError>;
}

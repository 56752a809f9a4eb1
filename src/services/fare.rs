use async_trait::async_trait;

use crate::models::vehicle::VehicleType;
use crate::services::ServiceError;

#[async_trait]
pub trait FareEstimator: Send + Sync {
    async fn estimate(
        &self,
        origin: &str,
        destination: &str,
        vehicle: VehicleType,
    ) -> Result<u64, ServiceError>;
}

/// Flat per-class base fares. Distance is not priced in.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedFareEstimator;

#[async_trait]
impl FareEstimator for RuleBasedFareEstimator {
    async fn estimate(
        &self,
        origin: &str,
        destination: &str,
        vehicle: VehicleType,
    ) -> Result<u64, ServiceError> {
        if origin.trim().is_empty() || destination.trim().is_empty() {
            return Err(ServiceError::Malformed(
                "origin and destination are required".to_string(),
            ));
        }

        vehicle
            .base_fare()
            .ok_or_else(|| ServiceError::NoResult(format!("no base fare for {vehicle}")))
    }
}

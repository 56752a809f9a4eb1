use async_trait::async_trait;
use tracing::debug;

use crate::models::driver::GeoPoint;
use crate::services::ServiceError;

#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn address_for(&self, point: GeoPoint) -> Result<String, ServiceError>;
}

/// Display label for raw coordinates.
pub fn gps_label(point: GeoPoint) -> String {
    format!("GPS: {:.4}, {:.4}", point.lat, point.lng)
}

/// Best-effort address for display; falls back to the coordinates.
pub async fn describe_position(geocoder: &dyn ReverseGeocoder, point: GeoPoint) -> String {
    match geocoder.address_for(point).await {
        Ok(address) if !address.trim().is_empty() => address.trim().to_string(),
        Ok(_) => gps_label(point),
        Err(err) => {
            debug!(error = %err, "reverse geocoding failed");
            gps_label(point)
        }
    }
}

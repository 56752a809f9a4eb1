use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::vehicle::VehicleType;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "PENDING",
            ApprovalStatus::Approved => "APPROVED",
            ApprovalStatus::Rejected => "REJECTED",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverRegistration {
    pub id: String,
    pub driver_name: String,
    pub car_number: String,
    pub vehicle_type: VehicleType,
    pub phone_number: String,
    pub status: ApprovalStatus,
    pub applied_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_tracking: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_location_update: Option<DateTime<Utc>>,
    /// Newest report timestamp ever accepted, kept after tracking stops.
    #[serde(skip)]
    pub(crate) last_report_at: Option<DateTime<Utc>>,
}

impl DriverRegistration {
    pub fn is_approved(&self) -> bool {
        self.status == ApprovalStatus::Approved
    }

    pub fn is_tracking(&self) -> bool {
        self.is_tracking.unwrap_or(false)
    }

    /// Current position, present only while tracking is on.
    pub fn position(&self) -> Option<GeoPoint> {
        if !self.is_tracking() {
            return None;
        }

        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
            _ => None,
        }
    }

    /// Approved and reporting a live position.
    pub fn can_receive_work_nearby(&self) -> bool {
        self.is_approved() && self.position().is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRegistration {
    pub id: String,
    pub driver_name: String,
    pub car_number: String,
    pub vehicle_type: VehicleType,
    pub phone_number: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationReport {
    pub lat: f64,
    pub lng: f64,
    pub tracking: bool,
    #[serde(default)]
    pub reported_at: Option<DateTime<Utc>>,
}

/// Result of a location report: the stored record and whether the report
/// changed it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationAck {
    pub applied: bool,
    pub driver: DriverRegistration,
}

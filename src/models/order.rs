use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::vehicle::VehicleType;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Accepted,
    Pickup,
    Completed,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Accepted,
        OrderStatus::Pickup,
        OrderStatus::Completed,
    ];

    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// PICKUP is optional: an accepted order may be completed directly.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Accepted)
                | (OrderStatus::Accepted, OrderStatus::Pickup)
                | (OrderStatus::Accepted, OrderStatus::Completed)
                | (OrderStatus::Pickup, OrderStatus::Completed)
        )
    }

    /// States in which an order must carry a driver id.
    pub fn holds_driver(self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Accepted => "ACCEPTED",
            OrderStatus::Pickup => "PICKUP",
            OrderStatus::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutStatus {
    Pending,
    Ready,
    Completed,
}

impl PayoutStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PayoutStatus::Pending => "PENDING",
            PayoutStatus::Ready => "READY",
            PayoutStatus::Completed => "COMPLETED",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CargoDetails {
    pub weight: String,
    pub size: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub customer_name: String,
    pub origin: String,
    pub destination: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_phone: Option<String>,
    pub vehicle_type: VehicleType,
    #[serde(
        rename = "vehicleOption",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub vehicle_options: Vec<String>,
    pub price: u64,
    pub fee: u64,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cargo_details: Option<CargoDetails>,
    pub is_insured: bool,
    pub payout_status: PayoutStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picked_up_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Amount owed to the driver once the platform fee is taken.
    pub fn driver_payout(&self) -> u64 {
        self.price.saturating_sub(self.fee)
    }
}

/// Customer input for a new order. `price` is signed so that a negative
/// amount reaches validation instead of failing deserialization.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub customer_name: String,
    pub origin: String,
    pub destination: String,
    #[serde(default)]
    pub recipient_phone: Option<String>,
    pub vehicle_type: VehicleType,
    #[serde(rename = "vehicleOption", default)]
    pub vehicle_options: Vec<String>,
    pub price: i64,
    #[serde(default)]
    pub fee: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cargo_details: Option<CargoDetails>,
    #[serde(default)]
    pub is_insured: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub driver_id: Option<String>,
}

impl OrderFilter {
    pub fn with_status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            driver_id: None,
        }
    }

    pub fn for_driver(driver_id: impl Into<String>) -> Self {
        Self {
            status: None,
            driver_id: Some(driver_id.into()),
        }
    }

    pub fn matches(&self, order: &Order) -> bool {
        let status_ok = self.status.is_none_or(|status| order.status == status);
        let driver_ok = self
            .driver_id
            .as_deref()
            .is_none_or(|driver| order.driver_id.as_deref() == Some(driver));

        status_ok && driver_ok
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::driver::DriverRegistration;
use crate::models::order::Order;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DispatchEventKind {
    OrderCreated(Order),
    OrderAccepted(Order),
    OrderPickedUp(Order),
    OrderCompleted(Order),
    PayoutCompleted(Order),
    DriverRegistered(DriverRegistration),
    DriverReviewed(DriverRegistration),
    DriverMoved(DriverRegistration),
}

/// Event published to live subscribers after a successful state change.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchEvent {
    #[serde(flatten)]
    pub kind: DispatchEventKind,
    pub emitted_at: DateTime<Utc>,
}

impl DispatchEvent {
    pub fn new(kind: DispatchEventKind) -> Self {
        Self {
            kind,
            emitted_at: Utc::now(),
        }
    }
}

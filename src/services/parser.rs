use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::order::{CargoDetails, NewOrder};
use crate::models::vehicle::VehicleType;
use crate::services::ServiceError;

const UNSPECIFIED: &str = "unspecified";

/// Structured order draft extracted from a free-text request.
///
/// Treated as untrusted: it goes through the same validation as a form
/// submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedOrderDraft {
    pub origin: String,
    pub destination: String,
    #[serde(default)]
    pub recipient_phone: Option<String>,
    pub vehicle_type: VehicleType,
    pub estimated_price: i64,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub cargo_weight: Option<String>,
    #[serde(default)]
    pub cargo_type: Option<String>,
}

impl ParsedOrderDraft {
    pub fn into_new_order(self, customer_name: String) -> NewOrder {
        let cargo_details = cargo_from(self.cargo_weight, self.cargo_type);
        NewOrder {
            customer_name,
            origin: self.origin,
            destination: self.destination,
            recipient_phone: self.recipient_phone,
            vehicle_type: self.vehicle_type,
            vehicle_options: Vec::new(),
            price: self.estimated_price,
            fee: None,
            description: Some(self.summary).filter(|s| !s.trim().is_empty()),
            cargo_details,
            is_insured: true,
        }
    }

    /// Overlays the draft on a form the customer already filled in. Fields
    /// the draft leaves blank keep the form's values.
    pub fn apply_to(self, mut form: NewOrder) -> NewOrder {
        if !self.origin.trim().is_empty() {
            form.origin = self.origin;
        }
        if !self.destination.trim().is_empty() {
            form.destination = self.destination;
        }
        if self.recipient_phone.is_some() {
            form.recipient_phone = self.recipient_phone;
        }
        form.vehicle_type = self.vehicle_type;
        if self.estimated_price > 0 {
            form.price = self.estimated_price;
        }
        if !self.summary.trim().is_empty() && form.description.is_none() {
            form.description = Some(self.summary);
        }
        if let Some(cargo) = cargo_from(self.cargo_weight, self.cargo_type) {
            form.cargo_details = Some(cargo);
        }
        form
    }
}

fn cargo_from(weight: Option<String>, kind: Option<String>) -> Option<CargoDetails> {
    let weight = weight.filter(|w| !w.trim().is_empty());
    let kind = kind.filter(|k| !k.trim().is_empty());
    if weight.is_none() && kind.is_none() {
        return None;
    }

    Some(CargoDetails {
        weight: weight.unwrap_or_default(),
        size: UNSPECIFIED.to_string(),
        kind: kind.unwrap_or_default(),
    })
}

#[async_trait]
pub trait OrderParser: Send + Sync {
    async fn parse(&self, text: &str) -> Result<ParsedOrderDraft, ServiceError>;
}

/// Runs the parser, swallowing failures so submission is never blocked.
pub async fn draft_from_text(parser: &dyn OrderParser, text: &str) -> Option<ParsedOrderDraft> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    match parser.parse(text).await {
        Ok(draft) => Some(draft),
        Err(err) => {
            warn!(error = %err, "order parser failed; keeping caller values");
            None
        }
    }
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::order::OrderStatus;

#[derive(Debug, Error, PartialEq)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("order {order_id} is already assigned to driver {driver_id}")]
    AlreadyAssigned { order_id: Uuid, driver_id: String },

    #[error("driver {0} is not eligible for dispatch")]
    DriverNotEligible(String),

    #[error("driver {0} already has an active registration")]
    DuplicateRegistration(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn order_transition(from: OrderStatus, to: OrderStatus) -> Self {
        AppError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InvalidTransition { .. } => "INVALID_TRANSITION",
            AppError::AlreadyAssigned { .. } => "ALREADY_ASSIGNED",
            AppError::DriverNotEligible(_) => "DRIVER_NOT_ELIGIBLE",
            AppError::DuplicateRegistration(_) => "DUPLICATE_REGISTRATION",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Internal(_) => "INTERNAL",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidTransition { .. }
            | AppError::AlreadyAssigned { .. }
            | AppError::DuplicateRegistration(_) => StatusCode::CONFLICT,
            AppError::DriverNotEligible(_) => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.to_string(),
            "code": self.code(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn race_loss_maps_to_conflict() {
        let err = AppError::AlreadyAssigned {
            order_id: Uuid::nil(),
            driver_id: "driver-x".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "ALREADY_ASSIGNED");
    }

    #[test]
    fn ineligible_driver_is_forbidden() {
        let err = AppError::DriverNotEligible("driver-z".to_string());
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn transition_error_names_both_states() {
        let err = AppError::order_transition(OrderStatus::Pending, OrderStatus::Completed);
        assert_eq!(
            err.to_string(),
            "invalid transition from PENDING to COMPLETED"
        );
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }
}

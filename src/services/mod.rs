//! Contracts for the external collaborators the dispatch core consumes.
//!
//! Failures here never become [`crate::error::AppError`]s; callers fall back
//! to the values they already had.

pub mod distance;
pub mod fare;
pub mod geocoder;
pub mod parser;
pub mod places;

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ServiceError {
    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("no result: {0}")]
    NoResult(String),
}

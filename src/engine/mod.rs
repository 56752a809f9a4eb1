//! Coordination over the order store and the driver registry.
//!
//! The engine keeps no state of its own; every function works on the
//! shared [`crate::state::AppState`].

pub mod dispatch;
pub mod pricing;
pub mod proximity;
pub mod reports;

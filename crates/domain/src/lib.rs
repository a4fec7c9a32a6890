//! Domain layer for the Fusion X backend.
//!
//! This crate contains:
//! - Domain models (Registration, roster views, check-in outcomes)
//! - Business logic services (scanner state machine)
//! - Domain error types

pub mod models;
pub mod services;

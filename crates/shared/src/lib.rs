//! Shared utilities and common types for the Fusion X backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Hashing of admin API keys
//! - Registration field validators
//! - QR code encoding and decoding for tickets

pub mod crypto;
pub mod qr;
pub mod validation;

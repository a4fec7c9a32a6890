//! Custom Axum extractors.

pub mod admin_key;

pub use admin_key::AdminKey;

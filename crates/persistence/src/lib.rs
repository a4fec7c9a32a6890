//! Persistence layer for the Fusion X backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations
//! - The registration store abstraction with Postgres and in-memory backends

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
pub mod store;

pub use store::{
    InMemoryRegistrationStore, PgRegistrationStore, RegistrationStore, RosterBroadcaster,
    RosterSubscription, StoreError,
};

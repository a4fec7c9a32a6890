//! Registration store abstraction.
//!
//! Every component that reads or writes registrations goes through
//! [`RegistrationStore`]. Two backends exist: Postgres for deployments and an
//! in-memory store for local development and tests. Both fan roster changes
//! out through a [`RosterBroadcaster`].

mod broadcast;
mod memory;
mod pg;

use async_trait::async_trait;
use domain::models::{NewRegistration, Registration, RegistrationField, RegistrationPatch};
use thiserror::Error;
use uuid::Uuid;

pub use broadcast::{Roster, RosterBroadcaster, RosterSubscription};
pub use memory::InMemoryRegistrationStore;
pub use pg::{PgRegistrationStore, RosterSync};

/// Errors raised by registration stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("registration {0} not found")]
    NotFound(Uuid),

    #[error("store write failed: {0}")]
    Write(String),

    #[error("store read failed: {0}")]
    Read(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    fn is_connectivity(err: &sqlx::Error) -> bool {
        matches!(
            err,
            sqlx::Error::Io(_)
                | sqlx::Error::Tls(_)
                | sqlx::Error::PoolTimedOut
                | sqlx::Error::PoolClosed
                | sqlx::Error::WorkerCrashed
        )
    }

    pub(crate) fn read(err: sqlx::Error) -> Self {
        if Self::is_connectivity(&err) {
            StoreError::Unavailable(err.to_string())
        } else {
            StoreError::Read(err.to_string())
        }
    }

    pub(crate) fn write(err: sqlx::Error) -> Self {
        if Self::is_connectivity(&err) {
            StoreError::Unavailable(err.to_string())
        } else {
            StoreError::Write(err.to_string())
        }
    }
}

/// Persistence contract for registrations.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Adds a registration with a store-assigned id and creation time and
    /// both flags unset.
    async fn create(&self, registration: NewRegistration) -> Result<Registration, StoreError>;

    /// Registrations whose field equals `value` exactly.
    async fn find_by_field(
        &self,
        field: RegistrationField,
        value: &str,
    ) -> Result<Vec<Registration>, StoreError>;

    /// Merges `patch` into the registration with the given id.
    async fn update(&self, id: Uuid, patch: RegistrationPatch)
        -> Result<Registration, StoreError>;

    /// The whole collection, oldest first.
    async fn list(&self) -> Result<Vec<Registration>, StoreError>;

    /// Live view of the whole collection. Dropping the subscription
    /// unsubscribes.
    fn subscribe(&self) -> RosterSubscription;

    /// Checks that the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError>;

    /// First registration with this email, if any.
    async fn find_by_email(&self, email: &str) -> Result<Option<Registration>, StoreError> {
        Ok(self
            .find_by_field(RegistrationField::Email, email)
            .await?
            .into_iter()
            .next())
    }
}

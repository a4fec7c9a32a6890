//! Postgres-backed registration store.
//!
//! Roster subscribers are fed by a [`RosterSync`] task listening on the
//! `registrations_changed` channel, so writes made by any process sharing the
//! database reach every subscriber.

use std::time::Duration;

use async_trait::async_trait;
use domain::models::{NewRegistration, Registration, RegistrationField, RegistrationPatch};
use sqlx::postgres::PgListener;
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{RegistrationStore, RosterBroadcaster, RosterSubscription, StoreError};
use crate::metrics::{record_listener_failure, record_roster_reload};
use crate::repositories::{RegistrationRepository, REGISTRATIONS_CHANNEL};

/// Registration store backed by Postgres.
pub struct PgRegistrationStore {
    repo: RegistrationRepository,
    roster: RosterBroadcaster,
    sync: JoinHandle<()>,
}

impl PgRegistrationStore {
    /// Loads the initial roster and starts the roster sync task.
    pub async fn start(pool: PgPool, retry_delay: Duration) -> Result<Self, StoreError> {
        let repo = RegistrationRepository::new(pool);
        let initial = load_roster(&repo).await?;
        info!(count = initial.len(), "Loaded registration roster");

        let roster = RosterBroadcaster::new(initial);
        let sync = RosterSync::new(repo.clone(), roster.clone(), retry_delay).spawn();

        Ok(Self { repo, roster, sync })
    }
}

impl Drop for PgRegistrationStore {
    fn drop(&mut self) {
        self.sync.abort();
    }
}

async fn load_roster(repo: &RegistrationRepository) -> Result<Vec<Registration>, StoreError> {
    let rows = repo.list().await.map_err(StoreError::read)?;
    Ok(rows.into_iter().map(Into::into).collect())
}

#[async_trait]
impl RegistrationStore for PgRegistrationStore {
    async fn create(&self, registration: NewRegistration) -> Result<Registration, StoreError> {
        let entity = self
            .repo
            .create(&registration)
            .await
            .map_err(StoreError::write)?;
        Ok(entity.into())
    }

    async fn find_by_field(
        &self,
        field: RegistrationField,
        value: &str,
    ) -> Result<Vec<Registration>, StoreError> {
        let rows = self
            .repo
            .find_by_field(field, value)
            .await
            .map_err(StoreError::read)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update(
        &self,
        id: Uuid,
        patch: RegistrationPatch,
    ) -> Result<Registration, StoreError> {
        self.repo
            .update(id, &patch)
            .await
            .map_err(StoreError::write)?
            .map(Into::into)
            .ok_or(StoreError::NotFound(id))
    }

    async fn list(&self) -> Result<Vec<Registration>, StoreError> {
        load_roster(&self.repo).await
    }

    fn subscribe(&self) -> RosterSubscription {
        self.roster.subscribe()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.repo.ping().await.map_err(StoreError::read)
    }
}

/// Keeps a [`RosterBroadcaster`] in step with the registrations table.
///
/// On every notification the full roster is reloaded and published. When the
/// listener connection fails the task waits `retry_delay`, reconnects and
/// reloads once to pick up anything missed in between.
pub struct RosterSync {
    repo: RegistrationRepository,
    roster: RosterBroadcaster,
    retry_delay: Duration,
}

impl RosterSync {
    pub fn new(repo: RegistrationRepository, roster: RosterBroadcaster, retry_delay: Duration) -> Self {
        Self {
            repo,
            roster,
            retry_delay,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        loop {
            if let Err(e) = self.listen().await {
                record_listener_failure();
                warn!(
                    error = %e,
                    retry_in_ms = self.retry_delay.as_millis() as u64,
                    "Roster listener failed"
                );
            }
            tokio::time::sleep(self.retry_delay).await;
        }
    }

    async fn listen(&self) -> Result<(), StoreError> {
        let mut listener = PgListener::connect_with(self.repo.pool())
            .await
            .map_err(StoreError::read)?;
        listener
            .listen(REGISTRATIONS_CHANNEL)
            .await
            .map_err(StoreError::read)?;
        debug!(channel = REGISTRATIONS_CHANNEL, "Listening for roster changes");

        self.refresh().await?;

        loop {
            let notification = listener.recv().await.map_err(StoreError::read)?;
            debug!(operation = notification.payload(), "Registrations changed");
            self.refresh().await?;
        }
    }

    async fn refresh(&self) -> Result<(), StoreError> {
        let roster = load_roster(&self.repo).await?;
        debug!(count = roster.len(), "Publishing roster");
        record_roster_reload(roster.len());
        self.roster.publish(roster);
        Ok(())
    }
}

//! Process-local registration store.

use async_trait::async_trait;
use chrono::Utc;
use domain::models::{NewRegistration, Registration, RegistrationField, RegistrationPatch};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{RegistrationStore, RosterBroadcaster, RosterSubscription, StoreError};

/// Registration store kept in memory.
///
/// Subscribers are notified synchronously after every write.
#[derive(Default)]
pub struct InMemoryRegistrationStore {
    rows: RwLock<Vec<Registration>>,
    roster: RosterBroadcaster,
}

impl InMemoryRegistrationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store pre-populated with registrations.
    pub fn with_registrations(mut registrations: Vec<Registration>) -> Self {
        registrations.sort_by_key(|r| r.created_at);
        Self {
            roster: RosterBroadcaster::new(registrations.clone()),
            rows: RwLock::new(registrations),
        }
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl RegistrationStore for InMemoryRegistrationStore {
    async fn create(&self, registration: NewRegistration) -> Result<Registration, StoreError> {
        let created = Registration {
            id: Uuid::new_v4(),
            email: registration.email,
            name: registration.name,
            whatsapp: registration.whatsapp,
            faculty: registration.faculty,
            year: registration.year,
            created_at: Utc::now(),
            is_arrived: false,
            is_email_sent: false,
            email_sent_at: None,
        };

        let mut rows = self.rows.write().await;
        rows.push(created.clone());
        self.roster.publish(rows.clone());
        Ok(created)
    }

    async fn find_by_field(
        &self,
        field: RegistrationField,
        value: &str,
    ) -> Result<Vec<Registration>, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|r| field.value_of(r) == value)
            .cloned()
            .collect())
    }

    async fn update(
        &self,
        id: Uuid,
        patch: RegistrationPatch,
    ) -> Result<Registration, StoreError> {
        let mut rows = self.rows.write().await;
        let row = rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))?;

        if let Some(is_arrived) = patch.is_arrived {
            row.is_arrived = is_arrived;
        }
        if let Some(email_sent) = patch.email_sent {
            row.is_email_sent = email_sent;
            row.email_sent_at = email_sent.then(Utc::now);
        }

        let updated = row.clone();
        self.roster.publish(rows.clone());
        Ok(updated)
    }

    async fn list(&self) -> Result<Vec<Registration>, StoreError> {
        Ok(self.rows.read().await.clone())
    }

    fn subscribe(&self) -> RosterSubscription {
        self.roster.subscribe()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

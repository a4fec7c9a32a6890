//! Registration entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the registrations table.
#[derive(Debug, Clone, FromRow)]
pub struct RegistrationEntity {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub whatsapp: String,
    pub faculty: String,
    pub year: String,
    pub created_at: DateTime<Utc>,
    pub is_arrived: bool,
    pub is_email_sent: bool,
    pub email_sent_at: Option<DateTime<Utc>>,
}

impl From<RegistrationEntity> for domain::models::Registration {
    fn from(entity: RegistrationEntity) -> Self {
        Self {
            id: entity.id,
            email: entity.email,
            name: entity.name,
            whatsapp: entity.whatsapp,
            faculty: entity.faculty,
            year: entity.year,
            created_at: entity.created_at,
            is_arrived: entity.is_arrived,
            is_email_sent: entity.is_email_sent,
            email_sent_at: entity.email_sent_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::Registration;

    #[test]
    fn test_entity_to_domain() {
        let now = Utc::now();
        let entity = RegistrationEntity {
            id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            name: "Alice".to_string(),
            whatsapp: "+1234567890".to_string(),
            faculty: "Eng".to_string(),
            year: "2".to_string(),
            created_at: now,
            is_arrived: true,
            is_email_sent: true,
            email_sent_at: Some(now),
        };
        let id = entity.id;

        let registration: Registration = entity.into();
        assert_eq!(registration.id, id);
        assert_eq!(registration.email, "a@x.com");
        assert!(registration.is_arrived);
        assert_eq!(registration.email_sent_at, Some(now));
    }
}

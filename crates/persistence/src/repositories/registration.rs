//! Registration repository for database operations.

use domain::models::{NewRegistration, RegistrationField, RegistrationPatch};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::RegistrationEntity;
use crate::metrics::QueryTimer;

/// Channel the registrations trigger notifies on.
pub const REGISTRATIONS_CHANNEL: &str = "registrations_changed";

const COLUMNS: &str = "id, email, name, whatsapp, faculty, year, created_at, \
                       is_arrived, is_email_sent, email_sent_at";

/// Repository for registration database operations.
#[derive(Clone)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    /// Creates a new RegistrationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Insert a registration. Id, creation time and both flags come from
    /// column defaults.
    pub async fn create(
        &self,
        registration: &NewRegistration,
    ) -> Result<RegistrationEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_registration");
        let result = sqlx::query_as::<_, RegistrationEntity>(&format!(
            r#"
            INSERT INTO registrations (email, name, whatsapp, faculty, year)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&registration.email)
        .bind(&registration.name)
        .bind(&registration.whatsapp)
        .bind(&registration.faculty)
        .bind(&registration.year)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find registrations whose field equals `value` exactly.
    pub async fn find_by_field(
        &self,
        field: RegistrationField,
        value: &str,
    ) -> Result<Vec<RegistrationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_registrations_by_field");
        let result = sqlx::query_as::<_, RegistrationEntity>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM registrations
            WHERE {} = $1
            ORDER BY created_at ASC
            "#,
            field.column()
        ))
        .bind(value)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Merge a patch into a registration.
    ///
    /// Returns `None` when no row has the given id. Setting the email flag
    /// stamps `email_sent_at` with the database clock; clearing it resets the
    /// timestamp.
    pub async fn update(
        &self,
        id: Uuid,
        patch: &RegistrationPatch,
    ) -> Result<Option<RegistrationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_registration");
        let result = sqlx::query_as::<_, RegistrationEntity>(&format!(
            r#"
            UPDATE registrations
            SET is_arrived = COALESCE($2::boolean, is_arrived),
                is_email_sent = COALESCE($3::boolean, is_email_sent),
                email_sent_at = CASE
                    WHEN $3::boolean IS NULL THEN email_sent_at
                    WHEN $3::boolean THEN NOW()
                    ELSE NULL
                END
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.is_arrived)
        .bind(patch.email_sent)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Load every registration, oldest first.
    pub async fn list(&self) -> Result<Vec<RegistrationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_registrations");
        let result = sqlx::query_as::<_, RegistrationEntity>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM registrations
            ORDER BY created_at ASC
            "#
        ))
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Round-trip to the database.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

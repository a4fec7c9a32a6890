//! Participant signup.

use domain::models::{Registration, RegistrationForm};
use persistence::store::{RegistrationStore, StoreError};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Message shown when an email already has a registration.
pub const DUPLICATE_EMAIL_MESSAGE: &str = "This email is already registered.";

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("registration form has {} invalid fields", .0.len())]
    Invalid(BTreeMap<String, String>),

    #[error("email is already registered")]
    DuplicateEmail,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Validates forms and creates registrations.
#[derive(Clone)]
pub struct RegistrationService {
    store: Arc<dyn RegistrationStore>,
}

impl RegistrationService {
    pub fn new(store: Arc<dyn RegistrationStore>) -> Self {
        Self { store }
    }

    /// Validates the form, rejects a known email, then creates the record.
    ///
    /// The uniqueness check and the write are separate store calls, so two
    /// concurrent submissions of the same email can both succeed.
    pub async fn register(&self, form: RegistrationForm) -> Result<Registration, RegistrationError> {
        let errors = form.field_errors();
        if !errors.is_empty() {
            return Err(RegistrationError::Invalid(errors));
        }

        if self.is_registered(&form.email).await? {
            info!(email = %form.email, "Duplicate registration rejected");
            return Err(RegistrationError::DuplicateEmail);
        }

        let registration = self.store.create(form.into()).await?;
        info!(
            registration_id = %registration.id,
            email = %registration.email,
            "Registration created"
        );
        Ok(registration)
    }

    /// Whether any registration uses this exact email.
    pub async fn is_registered(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.store.find_by_email(email).await?.is_some())
    }
}

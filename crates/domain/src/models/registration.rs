//! Registration domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::validation::{
    validate_email_address, validate_faculty, validate_name, validate_whatsapp, validate_year,
};
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::Validate;

/// A participant's signup record, keyed by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub whatsapp: String,
    pub faculty: String,
    pub year: String,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "is_arrived")]
    pub is_arrived: bool,
    pub is_email_sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_sent_at: Option<DateTime<Utc>>,
}

/// Fields written by the store when a registration is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRegistration {
    pub email: String,
    pub name: String,
    pub whatsapp: String,
    pub faculty: String,
    pub year: String,
}

/// Registration form as submitted by a participant.
///
/// Every field defaults to empty so a missing field is reported as a
/// validation error rather than a malformed body.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct RegistrationForm {
    #[serde(default)]
    #[validate(custom(function = "validate_email_address"))]
    pub email: String,

    #[serde(default)]
    #[validate(custom(function = "validate_name"))]
    pub name: String,

    #[serde(default)]
    #[validate(custom(function = "validate_whatsapp"))]
    pub whatsapp: String,

    #[serde(default)]
    #[validate(custom(function = "validate_faculty"))]
    pub faculty: String,

    #[serde(default)]
    #[validate(custom(function = "validate_year"))]
    pub year: String,
}

impl RegistrationForm {
    /// Maps each invalid field to its error message.
    ///
    /// An empty map means the form is valid.
    pub fn field_errors(&self) -> BTreeMap<String, String> {
        let Err(errors) = self.validate() else {
            return BTreeMap::new();
        };

        errors
            .field_errors()
            .iter()
            .filter_map(|(field, errs)| {
                errs.first().map(|e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    (field.to_string(), message)
                })
            })
            .collect()
    }
}

impl From<RegistrationForm> for NewRegistration {
    fn from(form: RegistrationForm) -> Self {
        Self {
            email: form.email,
            name: form.name,
            whatsapp: form.whatsapp,
            faculty: form.faculty,
            year: form.year,
        }
    }
}

/// Partial update merged into an existing registration.
///
/// `email_sent = Some(true)` makes the store stamp `email_sent_at` with its
/// own clock; `Some(false)` clears the timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistrationPatch {
    pub is_arrived: Option<bool>,
    pub email_sent: Option<bool>,
}

impl RegistrationPatch {
    pub fn arrival(is_arrived: bool) -> Self {
        Self {
            is_arrived: Some(is_arrived),
            ..Self::default()
        }
    }

    pub fn email_sent() -> Self {
        Self {
            email_sent: Some(true),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.is_arrived.is_none() && self.email_sent.is_none()
    }
}

/// Fields a registration can be looked up by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationField {
    Email,
    Name,
    Whatsapp,
    Faculty,
    Year,
}

impl RegistrationField {
    /// Column name in the registrations table.
    pub fn column(self) -> &'static str {
        match self {
            RegistrationField::Email => "email",
            RegistrationField::Name => "name",
            RegistrationField::Whatsapp => "whatsapp",
            RegistrationField::Faculty => "faculty",
            RegistrationField::Year => "year",
        }
    }

    /// Value of this field on a registration.
    pub fn value_of(self, registration: &Registration) -> &str {
        match self {
            RegistrationField::Email => &registration.email,
            RegistrationField::Name => &registration.name,
            RegistrationField::Whatsapp => &registration.whatsapp,
            RegistrationField::Faculty => &registration.faculty,
            RegistrationField::Year => &registration.year,
        }
    }
}

/// Links a registrant uses to fetch their ticket.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct TicketLinks {
    pub ticket: String,
    pub qr_code: String,
    pub download: String,
}

/// Response after a successful registration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RegisterResponse {
    pub registration: Registration,
    pub links: TicketLinks,
}

/// Query for the email availability check.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailQuery {
    #[serde(default)]
    pub email: String,
}

/// Response for the email availability check.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EmailCheckResponse {
    pub email: String,
    pub registered: bool,
}

/// Request to change a registrant's arrival flag.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SetArrivalRequest {
    pub is_arrived: bool,
}

//! Check-in decisions and outcomes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::registration::Registration;

/// What to do with a scanned payload, decided against a roster snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckInDecision<'a> {
    /// No registration carries this email.
    NotFound,
    /// The registrant has already been admitted.
    AlreadyArrived(&'a Registration),
    /// The registrant should be marked as arrived.
    Admit(&'a Registration),
}

/// Looks up `email` in the roster by exact, case-sensitive match.
pub fn resolve_check_in<'a>(roster: &'a [Registration], email: &str) -> CheckInDecision<'a> {
    match roster.iter().find(|r| r.email == email) {
        None => CheckInDecision::NotFound,
        Some(r) if r.is_arrived => CheckInDecision::AlreadyArrived(r),
        Some(r) => CheckInDecision::Admit(r),
    }
}

/// Request body for a one-shot check-in.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckInRequest {
    pub payload: String,
}

/// Result of a check-in attempt, as shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckInOutcome {
    Success {
        registration_id: Uuid,
        name: String,
        email: String,
    },
    AlreadyArrived {
        registration_id: Uuid,
        name: String,
        email: String,
    },
    NotFound {
        email: String,
    },
    Error {
        message: String,
    },
}

/// Operator message when a check-in could not be processed.
pub const CHECK_IN_FAILED_MESSAGE: &str = "Failed to process ticket scan.";

impl CheckInOutcome {
    pub fn success(registration: &Registration) -> Self {
        CheckInOutcome::Success {
            registration_id: registration.id,
            name: registration.name.clone(),
            email: registration.email.clone(),
        }
    }

    pub fn failed() -> Self {
        CheckInOutcome::Error {
            message: CHECK_IN_FAILED_MESSAGE.to_string(),
        }
    }

    pub fn already_arrived(registration: &Registration) -> Self {
        CheckInOutcome::AlreadyArrived {
            registration_id: registration.id,
            name: registration.name.clone(),
            email: registration.email.clone(),
        }
    }

    /// Outcome kind as a metrics label.
    pub fn label(&self) -> &'static str {
        match self {
            CheckInOutcome::Success { .. } => "success",
            CheckInOutcome::AlreadyArrived { .. } => "already_arrived",
            CheckInOutcome::NotFound { .. } => "not_found",
            CheckInOutcome::Error { .. } => "error",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CheckInOutcome::Success { .. })
    }

    /// Operator-facing message.
    pub fn message(&self) -> String {
        match self {
            CheckInOutcome::Success { name, .. } => format!("{name} checked in successfully!"),
            CheckInOutcome::AlreadyArrived { name, .. } => {
                format!("{name} has already checked in!")
            }
            CheckInOutcome::NotFound { email } => format!("No registration found for email: {email}"),
            CheckInOutcome::Error { message } => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn reg(email: &str, arrived: bool) -> Registration {
        Registration {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: "Alice".to_string(),
            whatsapp: "+1234567890".to_string(),
            faculty: "Eng".to_string(),
            year: "2".to_string(),
            created_at: Utc::now(),
            is_arrived: arrived,
            is_email_sent: false,
            email_sent_at: None,
        }
    }

    #[test]
    fn test_resolve_admits_unarrived_registrant() {
        let roster = vec![reg("a@x.com", false)];
        assert!(matches!(
            resolve_check_in(&roster, "a@x.com"),
            CheckInDecision::Admit(r) if r.email == "a@x.com"
        ));
    }

    #[test]
    fn test_resolve_already_arrived() {
        let roster = vec![reg("a@x.com", true)];
        assert!(matches!(
            resolve_check_in(&roster, "a@x.com"),
            CheckInDecision::AlreadyArrived(_)
        ));
    }

    #[test]
    fn test_resolve_is_case_sensitive() {
        let roster = vec![reg("a@x.com", false)];
        assert_eq!(resolve_check_in(&roster, "A@X.COM"), CheckInDecision::NotFound);
        assert_eq!(resolve_check_in(&[], "a@x.com"), CheckInDecision::NotFound);
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let outcome = CheckInOutcome::success(&reg("a@x.com", false));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["name"], "Alice");

        let json = serde_json::to_value(CheckInOutcome::NotFound {
            email: "z@x.com".to_string(),
        })
        .unwrap();
        assert_eq!(json["status"], "not_found");
    }

    #[test]
    fn test_outcome_labels_and_messages() {
        let r = reg("a@x.com", true);
        let outcome = CheckInOutcome::already_arrived(&r);
        assert_eq!(outcome.label(), "already_arrived");
        assert_eq!(outcome.message(), "Alice has already checked in!");
        assert!(!outcome.is_success());
        assert!(CheckInOutcome::success(&r).is_success());
    }
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use persistence::store::StoreError;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::services::registration::DUPLICATE_EMAIL_MESSAGE;
use crate::services::{RegistrationError, TicketError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Conflict on {}: {}", .0.field, .0.message)]
    FieldConflict(ValidationDetail),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Validation error: {} invalid fields", .0.len())]
    InvalidFields(Vec<ValidationDetail>),

    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    #[error("Bad gateway: {0}")]
    BadGateway(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<ValidationDetail>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationDetail {
    pub field: String,
    pub message: String,
}

impl ValidationDetail {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl ApiError {
    /// One detail per invalid field, in field order.
    pub fn invalid_fields(errors: BTreeMap<String, String>) -> Self {
        ApiError::InvalidFields(
            errors
                .into_iter()
                .map(|(field, message)| ValidationDetail { field, message })
                .collect(),
        )
    }
}

fn summarize(details: &[ValidationDetail]) -> String {
    if details.len() == 1 {
        details[0].message.clone()
    } else {
        format!("{} validation errors", details.len())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::FieldConflict(detail) => (
                StatusCode::CONFLICT,
                "conflict",
                detail.message.clone(),
                Some(vec![detail]),
            ),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg, None),
            ApiError::InvalidFields(details) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                summarize(&details),
                Some(details),
            ),
            ApiError::Unprocessable(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "unprocessable",
                msg,
                None,
            ),
            ApiError::BadGateway(msg) => {
                tracing::warn!("Upstream failure: {}", msg);
                (StatusCode::BAD_GATEWAY, "bad_gateway", msg, None)
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                    None,
                )
            }
            ApiError::ServiceUnavailable(msg) => {
                tracing::warn!("Service unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "service_unavailable",
                    msg,
                    None,
                )
            }
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ApiError::NotFound(format!("Registration {} not found", id)),
            other => ApiError::ServiceUnavailable(other.to_string()),
        }
    }
}

impl From<RegistrationError> for ApiError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::Invalid(errors) => ApiError::invalid_fields(errors),
            RegistrationError::DuplicateEmail => {
                ApiError::FieldConflict(ValidationDetail::new("email", DUPLICATE_EMAIL_MESSAGE))
            }
            RegistrationError::Store(e) => e.into(),
        }
    }
}

impl From<TicketError> for ApiError {
    fn from(err: TicketError) -> Self {
        match err {
            TicketError::NotRegistered(email) => {
                ApiError::NotFound(format!("No registration found for email: {}", email))
            }
            TicketError::Store(e) => e.into(),
            TicketError::Qr(e) => ApiError::Internal(e.to_string()),
            TicketError::Mailer(e) => ApiError::BadGateway(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use uuid::Uuid;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_api_error_unauthorized() {
        let response = ApiError::Unauthorized("test message".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_api_error_not_found() {
        let response = ApiError::NotFound("missing".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_api_error_conflict() {
        let response = ApiError::Conflict("busy".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_field_conflict_carries_detail() {
        let response = ApiError::FieldConflict(ValidationDetail::new(
            "email",
            "This email is already registered.",
        ))
        .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = body_json(response).await;
        assert_eq!(body["error"], "conflict");
        assert_eq!(body["details"][0]["field"], "email");
        assert_eq!(body["message"], "This email is already registered.");
    }

    #[tokio::test]
    async fn test_invalid_fields_lists_every_field() {
        let mut errors = BTreeMap::new();
        errors.insert("email".to_string(), "Email is required.".to_string());
        errors.insert("year".to_string(), "Year is required.".to_string());

        let response = ApiError::invalid_fields(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["message"], "2 validation errors");
        assert_eq!(body["details"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_plain_errors_omit_details() {
        let body = body_json(ApiError::Validation("bad".into()).into_response()).await;
        assert!(body.get("details").is_none());
    }

    #[test]
    fn test_api_error_unprocessable() {
        let response = ApiError::Unprocessable("no qr".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_api_error_bad_gateway() {
        let response = ApiError::BadGateway("mailer down".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_api_error_internal() {
        let response = ApiError::Internal("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_store_errors_map_to_status() {
        let id = Uuid::new_v4();
        let response = ApiError::from(StoreError::NotFound(id)).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = ApiError::from(StoreError::Write("disk".into())).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = ApiError::from(StoreError::Unavailable("down".into())).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_registration_errors_map_to_status() {
        let response = ApiError::from(RegistrationError::DuplicateEmail).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let mut errors = BTreeMap::new();
        errors.insert("name".to_string(), "Name is required.".to_string());
        let response = ApiError::from(RegistrationError::Invalid(errors)).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_ticket_errors_map_to_status() {
        let response =
            ApiError::from(TicketError::NotRegistered("a@x.com".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = ApiError::from(TicketError::Mailer(
            crate::services::mailer::MailerError::Transport("refused".into()),
        ))
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_api_error_display() {
        assert_eq!(
            format!("{}", ApiError::Unauthorized("test".to_string())),
            "Unauthorized: test"
        );
        assert_eq!(
            format!(
                "{}",
                ApiError::FieldConflict(ValidationDetail::new("email", "taken"))
            ),
            "Conflict on email: taken"
        );
    }
}

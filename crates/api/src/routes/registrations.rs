//! Participant registration endpoints.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use domain::models::registration::{EmailCheckResponse, EmailQuery, RegisterResponse};
use domain::models::RegistrationForm;
use tracing::warn;

use super::tickets::ticket_links;
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_registration_created;

/// Register a participant.
///
/// POST /api/v1/registrations
///
/// When `tickets.auto_send_on_register` is set the ticket email is sent in
/// the background; the response does not wait for it.
pub async fn register(
    State(state): State<AppState>,
    Json(form): Json<RegistrationForm>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let registration = state.registrations.register(form).await?;
    record_registration_created();

    if state.config.tickets.auto_send_on_register {
        let tickets = state.tickets.clone();
        let email = registration.email.clone();
        tokio::spawn(async move {
            if let Err(e) = tickets.dispatch_email(&email).await {
                warn!(email = %email, error = %e, "Background ticket email failed");
            }
        });
    }

    let links = ticket_links(&state.config.server.public_base_url, &registration.email)?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            registration,
            links,
        }),
    ))
}

/// Check whether an email is already registered.
///
/// GET /api/v1/registrations/check?email=
pub async fn check_email(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<EmailCheckResponse>, ApiError> {
    if query.email.trim().is_empty() {
        return Err(ApiError::Validation("Email is required.".to_string()));
    }

    let registered = state.registrations.is_registered(&query.email).await?;
    Ok(Json(EmailCheckResponse {
        email: query.email,
        registered,
    }))
}

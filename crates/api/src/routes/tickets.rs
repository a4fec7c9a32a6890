//! Ticket endpoints.

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use domain::models::registration::{EmailQuery, TicketLinks};
use reqwest::Url;
use serde::Serialize;
use tracing::{debug, warn};

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::tickets::{render_svg, TICKET_FILE_NAME};
use crate::services::{DispatchOutcome, TicketError};

/// Absolute links to the ticket resources of `email`.
pub fn ticket_links(base_url: &str, email: &str) -> Result<TicketLinks, ApiError> {
    let base = base_url.trim_end_matches('/');
    let link = |path: &str| {
        Url::parse_with_params(&format!("{}/api/v1/tickets{}", base, path), &[("email", email)])
            .map(String::from)
            .map_err(|e| ApiError::Internal(format!("Invalid public_base_url: {}", e)))
    };

    Ok(TicketLinks {
        ticket: link("")?,
        qr_code: link("/qr.png")?,
        download: link("/download")?,
    })
}

/// Show the ticket for a registered email.
///
/// GET /api/v1/tickets?email=
///
/// Any failure, including an unknown email, redirects to the registration
/// page.
pub async fn get_ticket(State(state): State<AppState>, Query(query): Query<EmailQuery>) -> Response {
    let register_page = state.config.tickets.register_page_url.as_str();
    if query.email.is_empty() {
        return Redirect::to(register_page).into_response();
    }

    match state.tickets.issue(&query.email).await {
        Ok(ticket) => Json(ticket).into_response(),
        Err(TicketError::NotRegistered(email)) => {
            debug!(email = %email, "Ticket requested for unknown email");
            Redirect::to(register_page).into_response()
        }
        Err(e) => {
            warn!(email = %query.email, error = %e, "Ticket lookup failed");
            Redirect::to(register_page).into_response()
        }
    }
}

/// QR code image for a registered email.
///
/// GET /api/v1/tickets/qr.png?email=
pub async fn qr_code(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<Response, ApiError> {
    let png = state.tickets.qr_png(&query.email).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

/// Downloadable SVG ticket.
///
/// GET /api/v1/tickets/download?email=
pub async fn download(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<Response, ApiError> {
    let ticket = state.tickets.issue(&query.email).await?;
    let disposition = format!("attachment; filename=\"{}\"", TICKET_FILE_NAME);

    Ok((
        [
            (header::CONTENT_TYPE, "image/svg+xml".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        render_svg(&ticket),
    )
        .into_response())
}

/// Result of a ticket email request.
#[derive(Debug, Serialize)]
pub struct SendTicketResponse {
    pub status: DispatchOutcome,
}

/// Email the ticket unless it has already been sent.
///
/// POST /api/v1/tickets/send
pub async fn send_ticket(
    State(state): State<AppState>,
    Json(request): Json<EmailQuery>,
) -> Result<Json<SendTicketResponse>, ApiError> {
    if request.email.is_empty() {
        return Err(ApiError::Validation("Email is required.".to_string()));
    }

    let status = state.tickets.dispatch_email(&request.email).await?;
    Ok(Json(SendTicketResponse { status }))
}

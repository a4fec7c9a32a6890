//! One-shot check-in endpoints.

use axum::{body::Bytes, extract::State, Json};
use domain::models::check_in::CheckInRequest;
use domain::models::CheckInOutcome;
use serde::Serialize;

use crate::app::AppState;
use crate::error::ApiError;

/// Check-in outcome with the operator message.
#[derive(Debug, Serialize)]
pub struct CheckInResponse {
    #[serde(flatten)]
    pub outcome: CheckInOutcome,
    pub message: String,
}

impl From<CheckInOutcome> for CheckInResponse {
    fn from(outcome: CheckInOutcome) -> Self {
        Self {
            message: outcome.message(),
            outcome,
        }
    }
}

async fn check_in_payload(state: &AppState, payload: &str) -> Result<CheckInResponse, ApiError> {
    if payload.is_empty() {
        return Err(ApiError::Validation("Payload is required.".to_string()));
    }

    let roster = state.store.subscribe().snapshot();
    let outcome = state.check_in.check_in(&roster, payload).await?;
    Ok(outcome.into())
}

/// Check in a scanned ticket payload.
///
/// POST /api/v1/admin/check-in
pub async fn check_in(
    State(state): State<AppState>,
    Json(request): Json<CheckInRequest>,
) -> Result<Json<CheckInResponse>, ApiError> {
    Ok(Json(check_in_payload(&state, &request.payload).await?))
}

/// Check in from an uploaded photo of a ticket QR code.
///
/// POST /api/v1/admin/check-in/image
pub async fn check_in_image(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CheckInResponse>, ApiError> {
    let payload = tokio::task::spawn_blocking(move || shared::qr::decode_image(&body))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(|e| {
            tracing::debug!(error = %e, "Uploaded image has no readable QR code");
            ApiError::Unprocessable("No QR code found in image".to_string())
        })?;

    Ok(Json(check_in_payload(&state, &payload).await?))
}

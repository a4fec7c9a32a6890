//! Admin roster endpoints.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use chrono::Utc;
use domain::models::registration::SetArrivalRequest;
use domain::models::roster::export_file_name;
use domain::models::{Registration, RegistrationPatch, RosterQuery, RosterView};
use futures::{Stream, StreamExt};
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AdminKey;
use crate::services::export_xlsx;
use crate::services::roster::XLSX_CONTENT_TYPE;

/// SSE event name carrying a roster view.
pub const ROSTER_EVENT: &str = "roster";

/// Current roster, filtered and projected.
///
/// GET /api/v1/admin/registrations?search=&columns=
pub async fn list_registrations(
    State(state): State<AppState>,
    Query(query): Query<RosterQuery>,
) -> Json<RosterView> {
    let roster = state.store.subscribe().snapshot();
    Json(RosterView::build(&roster, &query))
}

/// Live roster as Server-Sent Events.
///
/// GET /api/v1/admin/registrations/stream?search=&columns=
///
/// Sends the current roster on attach and again after every change. The
/// subscription is released when the client disconnects.
pub async fn stream_registrations(
    State(state): State<AppState>,
    Query(query): Query<RosterQuery>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let stream = state.store.subscribe().into_stream().map(move |roster| {
        Event::default()
            .event(ROSTER_EVENT)
            .json_data(RosterView::build(&roster, &query))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Spreadsheet of the whole roster.
///
/// GET /api/v1/admin/registrations/export
pub async fn export_registrations(State(state): State<AppState>) -> Result<Response, ApiError> {
    let roster = state.store.subscribe().snapshot();
    let bytes = export_xlsx(&roster).map_err(|e| ApiError::Internal(e.to_string()))?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        export_file_name(Utc::now().date_naive())
    );

    info!(rows = roster.len(), "Roster exported");
    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// Manually mark a registrant as arrived or not arrived.
///
/// PUT /api/v1/admin/registrations/:id/arrival
pub async fn set_arrival(
    State(state): State<AppState>,
    admin: AdminKey,
    Path(id): Path<Uuid>,
    Json(request): Json<SetArrivalRequest>,
) -> Result<Json<Registration>, ApiError> {
    let _permit = state.arrivals.try_acquire(id).ok_or_else(|| {
        ApiError::Conflict("An arrival update for this registration is in progress".to_string())
    })?;

    let registration = state
        .store
        .update(id, RegistrationPatch::arrival(request.is_arrived))
        .await?;

    info!(
        registration_id = %id,
        is_arrived = request.is_arrived,
        key_prefix = %admin.key_prefix,
        "Arrival updated"
    );
    Ok(Json(registration))
}

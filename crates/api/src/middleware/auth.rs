//! Authentication middleware.
//!
//! Admin routes accept the key in the `X-API-Key` header. Browser clients of
//! the roster stream and the scanner socket cannot set headers, so an
//! `api_key` query parameter is accepted as well.

use axum::{
    body::Body,
    extract::{Query, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AdminKey;

/// Header carrying the admin API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

#[derive(Debug, Deserialize)]
struct ApiKeyQuery {
    api_key: Option<String>,
}

/// Reads the admin key from the header, falling back to the query string.
pub fn presented_key<B>(req: &Request<B>) -> Option<String> {
    if let Some(key) = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        return Some(key.to_string());
    }

    Query::<ApiKeyQuery>::try_from_uri(req.uri())
        .ok()
        .and_then(|Query(q)| q.api_key)
}

/// Middleware for admin-only routes.
///
/// Rejects requests without a configured admin key. The validated
/// [`AdminKey`] is stored in request extensions for handlers.
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(api_key) = presented_key(&req) else {
        return ApiError::Unauthorized("Invalid or missing API key".to_string()).into_response();
    };

    match AdminKey::validate(&state.config.admin, &api_key) {
        Ok(admin) => {
            tracing::debug!(key_prefix = %admin.key_prefix, "Admin request authenticated");
            req.extensions_mut().insert(admin);
            next.run(req).await
        }
        Err(err) => {
            tracing::warn!(path = %req.uri().path(), "Rejected admin request");
            err.into_response()
        }
    }
}

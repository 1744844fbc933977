//! `GET` and `HEAD /api/stream/{id}`

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, Response};
use vidrelay_core::streaming::extract_range_header;
use vidrelay_core::{MediaId, RelayError};

use crate::errors::ApiError;
use crate::server::AppState;

fn parse_id(raw_id: &str) -> Result<MediaId, ApiError> {
    MediaId::parse(raw_id).map_err(|e| ApiError::stream(e.into()))
}

/// Proxies the media bytes for `id`, honoring a single byte `Range`.
///
/// # Errors
/// - `ApiError::InvalidIdentifier` - `id` is not a well-formed identifier
/// - `ApiError::RangeNotSatisfiable` - Range starts past the end
/// - `ApiError::StreamFailed` - Resolution or upstream open failed
pub async fn stream_video(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response<Body>, ApiError> {
    let id = parse_id(&raw_id)?;
    state
        .proxy
        .serve(&id, extract_range_header(&headers))
        .await
        .map_err(|e| ApiError::stream(RelayError::from(e)))
}

/// Same status and headers as [`stream_video`] without opening upstream.
///
/// # Errors
/// Same as [`stream_video`], minus upstream open failures.
pub async fn stream_head(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response<Body>, ApiError> {
    let id = parse_id(&raw_id)?;
    state
        .proxy
        .serve_head(&id, extract_range_header(&headers))
        .await
        .map_err(|e| ApiError::stream(RelayError::from(e)))
}

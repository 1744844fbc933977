//! `GET /api/video-info/{id}`

use axum::Json;
use axum::extract::{Path, State};
use tracing::debug;
use vidrelay_core::{MediaId, RelayError, VideoInfo};

use crate::errors::ApiError;
use crate::server::AppState;

/// Resolves `id` and returns its display metadata.
///
/// Media without a combined audio+video format cannot be played, so it
/// fails here the same way streaming would.
///
/// # Errors
/// - `ApiError::InvalidIdentifier` - `id` is not a well-formed identifier
/// - `ApiError::MetadataFailed` - Resolution failed or no combined format
pub async fn video_info(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<VideoInfo>, ApiError> {
    let id = MediaId::parse(&raw_id).map_err(|e| ApiError::metadata(e.into()))?;

    let media = state
        .proxy
        .resolver()
        .resolve(&id)
        .await
        .map_err(|e| ApiError::metadata(RelayError::from(e)))?;
    media
        .require_combined_format()
        .map_err(|e| ApiError::metadata(RelayError::from(e)))?;

    debug!("Resolved metadata for {}", id);
    Ok(Json(VideoInfo::from_media(&media)))
}

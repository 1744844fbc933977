//! Mapping of relay failures to HTTP responses.
//!
//! Bodies are always `{"error": "..."}` with a fixed message per kind;
//! internal error text goes to the log only.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};
use vidrelay_core::RelayError;

/// Failure of one API request, already reduced to what the client sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Invalid YouTube URL")]
    InvalidIdentifier,

    #[error("Failed to fetch video info")]
    MetadataFailed,

    #[error("Failed to stream video")]
    StreamFailed,

    #[error("Range not satisfiable")]
    RangeNotSatisfiable { total: u64 },
}

impl ApiError {
    /// Classifies a failure of the metadata endpoint.
    pub fn metadata(err: RelayError) -> Self {
        log(&err);
        match err {
            RelayError::InvalidIdentifier(_) => ApiError::InvalidIdentifier,
            _ => ApiError::MetadataFailed,
        }
    }

    /// Classifies a failure of the stream endpoint before headers were sent.
    pub fn stream(err: RelayError) -> Self {
        log(&err);
        match err {
            RelayError::InvalidIdentifier(_) => ApiError::InvalidIdentifier,
            RelayError::RangeUnsatisfiable(range) => ApiError::RangeNotSatisfiable {
                total: range.total,
            },
            _ => ApiError::StreamFailed,
        }
    }

    /// Status code for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidIdentifier => StatusCode::BAD_REQUEST,
            ApiError::MetadataFailed | ApiError::StreamFailed => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::RangeNotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
        }
    }
}

fn log(err: &RelayError) {
    if err.is_user_error() {
        warn!("Rejected request: {}", err);
    } else {
        error!("Request failed: {}", err);
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        let mut response = (status, body).into_response();

        if let ApiError::RangeNotSatisfiable { total } = self {
            if let Ok(value) = HeaderValue::from_str(&format!("bytes */{total}")) {
                response.headers_mut().insert(header::CONTENT_RANGE, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use vidrelay_core::resolver::ResolveError;
    use vidrelay_core::{IdentifierError, RangeError, UpstreamError};

    use super::*;

    #[test]
    fn test_classification() {
        let invalid = RelayError::from(IdentifierError::Empty);
        assert_eq!(ApiError::stream(invalid), ApiError::InvalidIdentifier);

        let resolve = RelayError::from(ResolveError::Unavailable {
            reason: "boom".to_string(),
        });
        assert_eq!(ApiError::metadata(resolve), ApiError::MetadataFailed);

        let upstream = RelayError::from(UpstreamError::MissingUrl);
        assert_eq!(ApiError::stream(upstream), ApiError::StreamFailed);

        let range = RelayError::from(RangeError { total: 1000 });
        assert_eq!(
            ApiError::stream(range),
            ApiError::RangeNotSatisfiable { total: 1000 }
        );
    }

    #[test]
    fn test_unsatisfiable_response_carries_total() {
        let response = ApiError::RangeNotSatisfiable { total: 1000 }.into_response();
        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes */1000");
    }
}

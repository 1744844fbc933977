//! vidrelay core - identifiers, source resolution and range-aware streaming
//!
//! This crate provides the server-side building blocks of the relay: media
//! identifier validation, the resolver and upstream byte source seams, the
//! range planning math, the stream proxy that ties them together, and the
//! shared configuration, runtime mode and tracing setup.

pub mod config;
pub mod identifier;
pub mod metadata;
pub mod mode;
pub mod resolver;
pub mod streaming;
pub mod tracing_setup;
pub mod upstream;

// Re-export main types for convenient access
pub use config::RelayConfig;
pub use identifier::{IdentifierError, MediaId};
pub use metadata::VideoInfo;
pub use mode::RuntimeMode;
pub use resolver::{FormatDescriptor, ResolveError, ResolvedMedia, SourceResolver};
pub use streaming::{ProxyError, RangeError, StreamProxy};
pub use upstream::{ByteSource, ByteSpan, ByteStream, UpstreamError};

/// Errors that can bubble up from any vidrelay subsystem.
///
/// Each variant is one class of failure with its own recovery policy at the
/// HTTP boundary or in the client session.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(#[from] IdentifierError),

    #[error("Resolution failed: {0}")]
    Resolution(#[from] ResolveError),

    #[error("Stream transport failed: {0}")]
    StreamTransport(#[from] UpstreamError),

    #[error("Range not satisfiable: {0}")]
    RangeUnsatisfiable(#[from] RangeError),

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ProxyError> for RelayError {
    fn from(error: ProxyError) -> Self {
        match error {
            ProxyError::Resolve(e) => RelayError::Resolution(e),
            ProxyError::Range(e) => RelayError::RangeUnsatisfiable(e),
            ProxyError::Upstream(e) => RelayError::StreamTransport(e),
        }
    }
}

impl RelayError {
    /// Returns a user-friendly error message suitable for display.
    ///
    /// Never includes upstream error text.
    pub fn user_message(&self) -> String {
        match self {
            RelayError::InvalidIdentifier(_) => "Invalid YouTube URL".to_string(),
            RelayError::Resolution(e) => match e {
                ResolveError::NoCombinedFormat { .. } => {
                    "No playable format with both audio and video".to_string()
                }
                ResolveError::Timeout { .. } => "Video lookup timed out".to_string(),
                _ => "Failed to load video".to_string(),
            },
            RelayError::StreamTransport(_) => "Failed to stream video".to_string(),
            RelayError::RangeUnsatisfiable(_) => "Range not satisfiable".to_string(),
            RelayError::Configuration { reason } => format!("Configuration error: {reason}"),
            RelayError::Io(_) => "File system error occurred".to_string(),
        }
    }

    /// Checks if this error is due to user input validation.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            RelayError::InvalidIdentifier(_)
                | RelayError::RangeUnsatisfiable(_)
                | RelayError::Configuration { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_hide_internal_text() {
        let err = RelayError::from(ResolveError::Unavailable {
            reason: "ERROR: secret stderr".to_string(),
        });
        assert_eq!(err.user_message(), "Failed to load video");
        assert!(!err.is_user_error());
    }

    #[test]
    fn test_proxy_errors_map_to_taxonomy() {
        let err = RelayError::from(ProxyError::Range(RangeError { total: 10 }));
        assert!(matches!(err, RelayError::RangeUnsatisfiable(RangeError { total: 10 })));
        assert!(err.is_user_error());

        let err = RelayError::from(ProxyError::Upstream(UpstreamError::MissingUrl));
        assert!(matches!(err, RelayError::StreamTransport(_)));
    }

    #[test]
    fn test_invalid_identifier_is_user_error() {
        let err: RelayError = MediaId::parse("short").unwrap_err().into();
        assert!(err.is_user_error());
        assert_eq!(err.user_message(), "Invalid YouTube URL");
    }
}

//! Source resolution: identifier to metadata plus one playable format.
//!
//! The resolver is an unstable external dependency (it scrapes a third-party
//! platform), so everything downstream talks to it through the narrow
//! [`SourceResolver`] trait. Production uses [`YtDlpResolver`]; development
//! mode and tests substitute a simulated resolver.

pub mod cache;
pub mod ytdlp;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub use cache::CachedResolver;
pub use ytdlp::YtDlpResolver;

use crate::identifier::MediaId;

/// Errors that can occur while resolving an identifier.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// The upstream platform rejected the identifier (private, removed, malformed).
    #[error("identifier {id} rejected by source: {reason}")]
    Rejected {
        /// The rejected identifier
        id: MediaId,
        /// Reason reported by the source
        reason: String,
    },

    /// The source could not be reached or answered with garbage.
    #[error("source unavailable: {reason}")]
    Unavailable {
        /// Description of the failure
        reason: String,
    },

    /// No rendition carries both audio and video in one stream.
    #[error("no combined audio+video format for {id}")]
    NoCombinedFormat {
        /// Identifier that lacked a combined format
        id: MediaId,
    },

    /// Resolution took longer than the configured limit.
    #[error("resolving {id} timed out after {after:?}")]
    Timeout {
        /// Identifier being resolved
        id: MediaId,
        /// Configured limit that was exceeded
        after: Duration,
    },

    /// Resolver output could not be decoded.
    #[error("failed to parse resolver output: {reason}")]
    Parse {
        /// Decoder error description
        reason: String,
    },
}

/// Description of one encoded rendition of a media item.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatDescriptor {
    /// Rendition carries a video track
    pub has_video: bool,
    /// Rendition carries an audio track
    pub has_audio: bool,
    /// Exact byte length, when the source reports one
    pub content_length: Option<u64>,
    /// Container MIME type reported by the source
    pub mime_type: String,
    /// Direct URL of the byte stream; `None` for non-HTTP sources
    pub url: Option<Url>,
    /// Vertical resolution used for quality ranking
    pub height: Option<u32>,
    /// Average bitrate in kbit/s used to break height ties
    pub bitrate: Option<u64>,
    /// Extra request headers the upstream requires
    pub http_headers: HashMap<String, String>,
}

impl FormatDescriptor {
    /// Whether audio and video are muxed into this single stream.
    pub fn is_combined(&self) -> bool {
        self.has_video && self.has_audio
    }

    fn quality_key(&self) -> (u32, u64) {
        (self.height.unwrap_or(0), self.bitrate.unwrap_or(0))
    }
}

/// Human-facing metadata of a media item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaDetails {
    /// Display title
    pub title: String,
    /// Channel or uploader name
    pub author: String,
    /// Duration in whole seconds
    pub length_seconds: u64,
    /// Thumbnail URLs ordered from smallest to largest
    pub thumbnails: Vec<String>,
    /// Free-form description
    pub description: String,
}

/// Result of a successful resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMedia {
    /// Identifier that was resolved
    pub id: MediaId,
    /// Metadata for display
    pub details: MediaDetails,
    /// Best combined format, if any exists
    pub format: Option<FormatDescriptor>,
}

impl ResolvedMedia {
    /// Returns the selected combined format, treating its absence as a
    /// resolution failure.
    ///
    /// # Errors
    /// - `ResolveError::NoCombinedFormat` - Source only offers split audio/video tracks
    pub fn require_combined_format(&self) -> Result<&FormatDescriptor, ResolveError> {
        self.format
            .as_ref()
            .filter(|format| format.is_combined())
            .ok_or_else(|| ResolveError::NoCombinedFormat {
                id: self.id.clone(),
            })
    }
}

/// Picks the highest-quality rendition with both audio and video.
///
/// Ranking is by height, then bitrate. Renditions without a direct URL are
/// kept only when no rendition has one (non-HTTP byte sources).
pub fn select_combined_format(
    formats: impl IntoIterator<Item = FormatDescriptor>,
) -> Option<FormatDescriptor> {
    formats
        .into_iter()
        .filter(FormatDescriptor::is_combined)
        .max_by_key(|format| (format.url.is_some(), format.quality_key()))
}

/// Resolves media identifiers into metadata and a playable format.
#[async_trait]
pub trait SourceResolver: Send + Sync + std::fmt::Debug {
    /// Resolves a single identifier.
    ///
    /// # Errors
    /// - `ResolveError::Rejected` - Source refused the identifier
    /// - `ResolveError::Unavailable` - Source unreachable or failed
    /// - `ResolveError::Timeout` - Resolution exceeded the configured limit
    /// - `ResolveError::Parse` - Source output could not be decoded
    async fn resolve(&self, id: &MediaId) -> Result<ResolvedMedia, ResolveError>;
}

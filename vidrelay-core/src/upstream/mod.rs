//! Upstream byte sources for the stream proxy.
//!
//! A [`ByteSource`] opens the raw bytes of a resolved format, optionally
//! bounded to an inclusive byte span. Streams are pull-based: bytes are read
//! from upstream only as the consumer polls, and dropping the stream closes
//! the upstream connection.

pub mod bounded;
pub mod http;

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use thiserror::Error;

pub use bounded::BoundedStream;
pub use http::HttpByteSource;

use crate::resolver::FormatDescriptor;

/// Boxed stream of upstream chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, UpstreamError>> + Send>>;

/// Errors raised while opening or reading an upstream byte stream.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Format has no URL this source knows how to fetch.
    #[error("format has no fetchable URL")]
    MissingUrl,

    /// Connection could not be established.
    #[error("failed to connect upstream: {reason}")]
    Connect {
        /// Description of the connection failure
        reason: String,
    },

    /// Upstream answered with a non-success status.
    #[error("upstream returned HTTP {status}")]
    Status {
        /// HTTP status code returned by upstream
        status: u16,
    },

    /// Upstream answered a ranged request with the whole resource.
    #[error("upstream ignored range request for {span}")]
    RangeIgnored {
        /// The span that was requested
        span: ByteSpan,
    },

    /// Transfer failed after it started.
    #[error("upstream transfer failed: {reason}")]
    Transport {
        /// Description of the transfer failure
        reason: String,
    },

    /// Upstream closed before delivering the advertised byte count.
    #[error("upstream ended after {received} of {expected} bytes")]
    Truncated {
        /// Bytes promised to the client
        expected: u64,
        /// Bytes actually delivered
        received: u64,
    },
}

/// Inclusive byte span `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteSpan {
    /// First byte offset
    pub start: u64,
    /// Last byte offset, inclusive
    pub end: u64,
}

impl ByteSpan {
    /// Creates a span; callers guarantee `start <= end`.
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end, "byte span start {start} after end {end}");
        Self { start, end }
    }

    /// Number of bytes covered by the span.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Always false; a span covers at least one byte.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Value for an outgoing `Range` header.
    pub fn to_header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }
}

impl std::fmt::Display for ByteSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Opens upstream byte streams for resolved formats.
#[async_trait]
pub trait ByteSource: Send + Sync + std::fmt::Debug {
    /// Opens the stream for `format`, bounded to `span` when given.
    ///
    /// Implementations must have verified that the upstream accepted the
    /// request before returning, so that the caller can still answer with an
    /// error status.
    ///
    /// # Errors
    /// - `UpstreamError::MissingUrl` - Format cannot be fetched by this source
    /// - `UpstreamError::Connect` - Upstream unreachable
    /// - `UpstreamError::Status` - Upstream refused the request
    /// - `UpstreamError::RangeIgnored` - Upstream would send the wrong bytes
    async fn open(
        &self,
        format: &FormatDescriptor,
        span: Option<ByteSpan>,
    ) -> Result<ByteStream, UpstreamError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_length_is_inclusive() {
        assert_eq!(ByteSpan::new(100, 199).len(), 100);
        assert_eq!(ByteSpan::new(0, 0).len(), 1);
    }

    #[test]
    fn test_span_header_value() {
        assert_eq!(ByteSpan::new(500, 999).to_header_value(), "bytes=500-999");
    }
}

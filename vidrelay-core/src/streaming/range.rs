//! HTTP Range request handling for video streaming
//!
//! Implements the single-range subset of RFC 7233 that media elements use:
//! `bytes=start-end`, `bytes=start-` and `bytes=-suffix`. Anything else is
//! ignored and served as a full response.

use axum::http::{HeaderMap, header};
use thiserror::Error;

use crate::upstream::ByteSpan;

/// Parsed form of a `Range` header before the resource length is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeRequest {
    /// `bytes=start-` or `bytes=start-end`
    FromStart {
        /// First requested byte
        start: u64,
        /// Last requested byte, inclusive
        end: Option<u64>,
    },
    /// `bytes=-len`: the final `len` bytes
    Suffix {
        /// Number of trailing bytes requested
        len: u64,
    },
}

/// The requested range cannot be served from a resource of this length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("range not satisfiable for resource of {total} bytes")]
pub struct RangeError {
    /// Total resource length reported in `Content-Range: bytes */total`
    pub total: u64,
}

/// What the proxy will send for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePlan {
    /// `200 OK` with the whole stream.
    Full {
        /// Exact length, when known
        content_length: Option<u64>,
    },
    /// `206 Partial Content` for `span` out of `total` bytes.
    Partial {
        /// Bytes to send
        span: ByteSpan,
        /// Total resource length
        total: u64,
    },
}

impl RangePlan {
    /// Value of the `Content-Length` header, if one can be sent.
    pub fn content_length(&self) -> Option<u64> {
        match self {
            RangePlan::Full { content_length } => *content_length,
            RangePlan::Partial { span, .. } => Some(span.len()),
        }
    }

    /// Value of the `Content-Range` header for partial responses.
    pub fn content_range(&self) -> Option<String> {
        match self {
            RangePlan::Full { .. } => None,
            RangePlan::Partial { span, total } => {
                Some(format!("bytes {}-{}/{}", span.start, span.end, total))
            }
        }
    }

    /// Span to request upstream, if bounded.
    pub fn span(&self) -> Option<ByteSpan> {
        match self {
            RangePlan::Full { .. } => None,
            RangePlan::Partial { span, .. } => Some(*span),
        }
    }
}

/// Extract the raw Range header value.
///
/// Returns None if no range header present or if it is not valid UTF-8.
pub fn extract_range_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::RANGE)
        .and_then(|range| range.to_str().ok())
}

/// Parse an HTTP Range header value.
///
/// Returns `None` for anything other than a single well-formed byte range,
/// including multi-range requests and other units.
///
/// # Examples
/// ```
/// use vidrelay_core::streaming::range::{RangeRequest, parse_range_header};
/// assert_eq!(
///     parse_range_header("bytes=100-199"),
///     Some(RangeRequest::FromStart { start: 100, end: Some(199) })
/// );
/// ```
pub fn parse_range_header(value: &str) -> Option<RangeRequest> {
    let spec = value.trim().strip_prefix("bytes=")?.trim();
    if spec.contains(',') {
        return None;
    }

    let (start_str, end_str) = spec.split_once('-')?;
    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    if start_str.is_empty() {
        let len = end_str.parse::<u64>().ok()?;
        return Some(RangeRequest::Suffix { len });
    }

    let start = start_str.parse::<u64>().ok()?;
    let end = if end_str.is_empty() {
        None
    } else {
        let end = end_str.parse::<u64>().ok()?;
        if end < start {
            return None;
        }
        Some(end)
    };

    Some(RangeRequest::FromStart { start, end })
}

/// Decide how to answer a request given its Range header and the known
/// resource length.
///
/// Partial content is only possible when the length is known; otherwise the
/// range is ignored. An end past the resource is clamped to the last byte.
///
/// # Errors
/// Returns `RangeError` when the first requested byte lies beyond the
/// resource or a suffix of zero bytes was requested.
pub fn plan_range(
    range_header: Option<&str>,
    content_length: Option<u64>,
) -> Result<RangePlan, RangeError> {
    let full = RangePlan::Full { content_length };

    let (Some(header), Some(total)) = (range_header, content_length) else {
        return Ok(full);
    };
    let Some(request) = parse_range_header(header) else {
        return Ok(full);
    };

    let unsatisfiable = RangeError { total };
    if total == 0 {
        return Err(unsatisfiable);
    }
    let last = total - 1;

    let span = match request {
        RangeRequest::FromStart { start, end } => {
            if start > last {
                return Err(unsatisfiable);
            }
            ByteSpan::new(start, end.map_or(last, |end| end.min(last)))
        }
        RangeRequest::Suffix { len } => {
            if len == 0 {
                return Err(unsatisfiable);
            }
            ByteSpan::new(total.saturating_sub(len), last)
        }
    };

    Ok(RangePlan::Partial { span, total })
}

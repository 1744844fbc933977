//! Range-aware stream proxy.
//!
//! Resolves an identifier, plans the response range against the format's
//! content length, opens the upstream bounded to that range and pipes it
//! through unmodified. The body is pulled by hyper as the client reads, so a
//! slow client pauses upstream reads and a disconnect drops the upstream
//! connection.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderValue, Response, StatusCode, header};
use futures::TryStreamExt;
use thiserror::Error;
use tracing::{Instrument, debug, error, info, info_span};
use uuid::Uuid;

use super::range::{RangeError, RangePlan, plan_range};
use crate::identifier::MediaId;
use crate::resolver::{FormatDescriptor, ResolveError, SourceResolver};
use crate::upstream::{BoundedStream, ByteSource, ByteStream, UpstreamError};

/// Content type advertised for every proxied stream.
pub const STREAM_CONTENT_TYPE: &str = "video/mp4";

/// Failures that happen before the response head is sent.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Identifier could not be resolved to a combined format.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Requested range lies outside the resource.
    #[error(transparent)]
    Range(#[from] RangeError),

    /// Upstream refused or failed to open the byte stream.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// Everything needed to answer one stream request.
#[derive(Debug, Clone)]
pub struct StreamPlan {
    /// Correlates log lines of one request
    pub stream_id: Uuid,
    /// Identifier being streamed
    pub id: MediaId,
    /// Selected combined format
    pub format: FormatDescriptor,
    /// Status, length and upstream span
    pub range: RangePlan,
}

impl StreamPlan {
    /// Status code the response will carry.
    pub fn status(&self) -> StatusCode {
        match self.range {
            RangePlan::Full { .. } => StatusCode::OK,
            RangePlan::Partial { .. } => StatusCode::PARTIAL_CONTENT,
        }
    }

    /// Builds the response head with `body`.
    pub fn response(&self, body: Body) -> Response<Body> {
        let mut response = Response::new(body);
        *response.status_mut() = self.status();

        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(STREAM_CONTENT_TYPE),
        );
        headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
        if let Some(length) = self.range.content_length() {
            headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
        }
        if let Some(content_range) = self.range.content_range() {
            if let Ok(value) = HeaderValue::from_str(&content_range) {
                headers.insert(header::CONTENT_RANGE, value);
            }
        }

        response
    }
}

/// Range-aware streaming proxy over a resolver and a byte source.
#[derive(Debug, Clone)]
pub struct StreamProxy {
    resolver: Arc<dyn SourceResolver>,
    source: Arc<dyn ByteSource>,
}

impl StreamProxy {
    /// Creates a proxy. Both collaborators are shared across requests but
    /// hold no per-request state.
    pub fn new(resolver: Arc<dyn SourceResolver>, source: Arc<dyn ByteSource>) -> Self {
        Self { resolver, source }
    }

    /// The resolver this proxy uses, shared with the metadata endpoint.
    pub fn resolver(&self) -> &Arc<dyn SourceResolver> {
        &self.resolver
    }

    /// Resolves `id` and plans the response for `range_header`.
    ///
    /// # Errors
    /// - `ProxyError::Resolve` - Resolution failed or no combined format exists
    /// - `ProxyError::Range` - Range starts beyond the known content length
    pub async fn plan(
        &self,
        id: &MediaId,
        range_header: Option<&str>,
    ) -> Result<StreamPlan, ProxyError> {
        let media = self.resolver.resolve(id).await?;
        let format = media.require_combined_format()?.clone();
        let range = plan_range(range_header, format.content_length)?;

        Ok(StreamPlan {
            stream_id: Uuid::new_v4(),
            id: id.clone(),
            format,
            range,
        })
    }

    /// Opens the upstream for a plan, bounded to exactly the advertised bytes.
    ///
    /// Errors raised by the returned stream happen after the head was sent;
    /// they are logged here and abort the connection.
    ///
    /// # Errors
    /// - `ProxyError::Upstream` - Upstream could not be opened
    pub async fn open(&self, plan: &StreamPlan) -> Result<ByteStream, ProxyError> {
        let span = plan.range.span();
        let upstream = self.source.open(&plan.format, span).await?;

        let bounded = match plan.range.content_length() {
            Some(length) => BoundedStream::new(upstream, length).boxed(),
            None => upstream,
        };

        let stream_id = plan.stream_id;
        let id = plan.id.clone();
        Ok(Box::pin(bounded.inspect_err(move |e| {
            error!(%stream_id, %id, "Stream error after headers were sent: {}", e);
        })))
    }

    /// Serves a GET: plan, open, then respond with the piped body.
    ///
    /// # Errors
    /// - `ProxyError::Resolve` - Resolution failed
    /// - `ProxyError::Range` - Range not satisfiable
    /// - `ProxyError::Upstream` - Upstream could not be opened
    pub async fn serve(
        &self,
        id: &MediaId,
        range_header: Option<&str>,
    ) -> Result<Response<Body>, ProxyError> {
        let plan = self.plan(id, range_header).await?;
        let span = info_span!("stream", stream_id = %plan.stream_id, %id);

        async {
            info!(
                "Streaming {} with {:?} (status {})",
                plan.id,
                plan.range,
                plan.status().as_u16()
            );
            let stream = self.open(&plan).await?;
            debug!("Upstream opened");
            Ok::<_, ProxyError>(plan.response(Body::from_stream(stream)))
        }
        .instrument(span)
        .await
    }

    /// Serves a HEAD: the same head as [`StreamProxy::serve`], no upstream.
    ///
    /// # Errors
    /// - `ProxyError::Resolve` - Resolution failed
    /// - `ProxyError::Range` - Range not satisfiable
    pub async fn serve_head(
        &self,
        id: &MediaId,
        range_header: Option<&str>,
    ) -> Result<Response<Body>, ProxyError> {
        let plan = self.plan(id, range_header).await?;
        Ok(plan.response(Body::empty()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use bytes::Bytes;
    use futures::stream;

    use super::*;
    use crate::resolver::{MediaDetails, ResolvedMedia};
    use crate::upstream::ByteSpan;

    #[derive(Debug)]
    struct FixedResolver {
        content_length: Option<u64>,
        combined: bool,
    }

    #[async_trait]
    impl SourceResolver for FixedResolver {
        async fn resolve(&self, id: &MediaId) -> Result<ResolvedMedia, ResolveError> {
            Ok(ResolvedMedia {
                id: id.clone(),
                details: MediaDetails {
                    title: "fixed".to_string(),
                    author: "tester".to_string(),
                    length_seconds: 10,
                    thumbnails: vec![],
                    description: String::new(),
                },
                format: Some(FormatDescriptor {
                    has_video: true,
                    has_audio: self.combined,
                    content_length: self.content_length,
                    mime_type: "video/mp4".to_string(),
                    url: None,
                    height: Some(360),
                    bitrate: None,
                    http_headers: HashMap::new(),
                }),
            })
        }
    }

    /// Serves a counting byte pattern of the given total length.
    #[derive(Debug)]
    struct PatternSource {
        total: u64,
    }

    #[async_trait]
    impl ByteSource for PatternSource {
        async fn open(
            &self,
            _format: &FormatDescriptor,
            span: Option<ByteSpan>,
        ) -> Result<ByteStream, UpstreamError> {
            let span = span.unwrap_or(ByteSpan::new(0, self.total - 1));
            let data: Vec<u8> = (span.start..=span.end).map(|i| (i % 256) as u8).collect();
            Ok(Box::pin(stream::iter(vec![Ok(Bytes::from(data))])))
        }
    }

    fn proxy(content_length: Option<u64>, combined: bool) -> StreamProxy {
        StreamProxy::new(
            Arc::new(FixedResolver {
                content_length,
                combined,
            }),
            Arc::new(PatternSource { total: 1000 }),
        )
    }

    fn id() -> MediaId {
        MediaId::parse("dQw4w9WgXcQ").unwrap()
    }

    #[tokio::test]
    async fn test_partial_response_headers_and_body() {
        let response = proxy(Some(1000), true)
            .serve(&id(), Some("bytes=100-199"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_RANGE], "bytes 100-199/1000");
        assert_eq!(headers[header::CONTENT_LENGTH], "100");
        assert_eq!(headers[header::ACCEPT_RANGES], "bytes");
        assert_eq!(headers[header::CONTENT_TYPE], "video/mp4");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body.len(), 100);
        assert_eq!(body[0], 100);
    }

    #[tokio::test]
    async fn test_full_response_without_range() {
        let response = proxy(Some(1000), true).serve(&id(), None).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "1000");
        assert!(response.headers().get(header::CONTENT_RANGE).is_none());
    }

    #[tokio::test]
    async fn test_unknown_length_omits_content_length() {
        let response = proxy(None, true)
            .serve(&id(), Some("bytes=0-10"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::CONTENT_LENGTH).is_none());
        assert_eq!(response.headers()[header::ACCEPT_RANGES], "bytes");
    }

    #[tokio::test]
    async fn test_split_tracks_fail_resolution() {
        let result = proxy(Some(1000), false).serve(&id(), None).await;
        assert!(matches!(
            result,
            Err(ProxyError::Resolve(ResolveError::NoCombinedFormat { .. }))
        ));
    }

    #[tokio::test]
    async fn test_head_matches_get_headers() {
        let response = proxy(Some(1000), true)
            .serve_head(&id(), Some("bytes=500-"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes 500-999/1000");
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "500");
    }
}

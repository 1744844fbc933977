//! HTTP byte source backed by `reqwest`.

use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::{Client, StatusCode, header};
use tracing::debug;

use super::{ByteSource, ByteSpan, ByteStream, UpstreamError};
use crate::config::UpstreamConfig;
use crate::resolver::FormatDescriptor;

/// Fetches format URLs over HTTP, forwarding byte spans as `Range` requests.
#[derive(Debug, Clone)]
pub struct HttpByteSource {
    client: Client,
}

impl HttpByteSource {
    /// Builds a client from the upstream section of the config.
    ///
    /// No overall request timeout is set: a stream lives as long as the
    /// viewer keeps reading.
    ///
    /// # Errors
    /// - `UpstreamError::Connect` - TLS backend or client initialisation failed
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| UpstreamError::Connect {
                reason: e.to_string(),
            })?;
        Ok(Self { client })
    }

    /// Wraps an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ByteSource for HttpByteSource {
    async fn open(
        &self,
        format: &FormatDescriptor,
        span: Option<ByteSpan>,
    ) -> Result<ByteStream, UpstreamError> {
        let url = format.url.clone().ok_or(UpstreamError::MissingUrl)?;

        let mut req = self.client.get(url);
        for (name, value) in &format.http_headers {
            req = req.header(name.as_str(), value.as_str());
        }
        if let Some(span) = span {
            req = req.header(header::RANGE, span.to_header_value());
        }

        let resp = req.send().await.map_err(|e| UpstreamError::Connect {
            reason: e.to_string(),
        })?;
        let status = resp.status();
        debug!("Upstream answered {} for span {:?}", status, span);

        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
            });
        }
        // A 200 for a span starting at zero still carries the right prefix;
        // the caller's length bound trims the rest.
        if let Some(span) = span {
            if status != StatusCode::PARTIAL_CONTENT && span.start > 0 {
                return Err(UpstreamError::RangeIgnored { span });
            }
        }

        let stream = resp.bytes_stream().map_err(|e| UpstreamError::Transport {
            reason: e.to_string(),
        });
        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[tokio::test]
    async fn test_missing_url_is_rejected_before_any_request() {
        let source = HttpByteSource::new(&UpstreamConfig::default()).unwrap();
        let format = FormatDescriptor {
            has_video: true,
            has_audio: true,
            content_length: None,
            mime_type: "video/mp4".to_string(),
            url: None,
            height: None,
            bitrate: None,
            http_headers: HashMap::new(),
        };

        assert!(matches!(
            source.open(&format, None).await,
            Err(UpstreamError::MissingUrl)
        ));
    }
}

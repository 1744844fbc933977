//! Client side of the relay API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use vidrelay_core::config::ClientConfig;
use vidrelay_core::{MediaId, VideoInfo};

/// Failures fetching metadata from the relay.
#[derive(Debug, Clone, Error)]
pub enum MetadataError {
    /// Request could not be sent or timed out.
    #[error("metadata request failed: {reason}")]
    Request { reason: String },

    /// Relay answered with an error status.
    #[error("relay returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Body was not a `VideoInfo`.
    #[error("invalid metadata response: {reason}")]
    Decode { reason: String },
}

/// Where the session gets metadata and stream URLs from.
#[async_trait]
pub trait MetadataSource: Send + Sync + std::fmt::Debug {
    /// Fetches metadata for `id`.
    ///
    /// # Errors
    /// - `MetadataError::Request` - Relay unreachable
    /// - `MetadataError::Status` - Relay reported a failure
    /// - `MetadataError::Decode` - Unexpected body
    async fn video_info(&self, id: &MediaId) -> Result<VideoInfo, MetadataError>;

    /// URL a media element should load to play `id`.
    fn stream_url(&self, id: &MediaId) -> String;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// `reqwest` client for `/api/video-info` and `/api/stream`.
#[derive(Debug, Clone)]
pub struct HttpMetadataClient {
    client: Client,
    base: String,
}

impl HttpMetadataClient {
    /// Client for the relay at `config.api_base`.
    ///
    /// # Errors
    /// - `MetadataError::Request` - HTTP client could not be built
    pub fn new(config: &ClientConfig) -> Result<Self, MetadataError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| MetadataError::Request {
                reason: e.to_string(),
            })?;
        Ok(Self::with_client(client, &config.api_base))
    }

    /// Wraps an existing client.
    pub fn with_client(client: Client, base: &str) -> Self {
        Self {
            client,
            base: base.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MetadataSource for HttpMetadataClient {
    async fn video_info(&self, id: &MediaId) -> Result<VideoInfo, MetadataError> {
        let url = format!("{}/api/video-info/{}", self.base, id);
        debug!("Fetching metadata from {}", url);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MetadataError::Request {
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| status.to_string());
            return Err(MetadataError::Status {
                status: status.as_u16(),
                message,
            });
        }

        resp.json::<VideoInfo>()
            .await
            .map_err(|e| MetadataError::Decode {
                reason: e.to_string(),
            })
    }

    fn stream_url(&self, id: &MediaId) -> String {
        format!("{}/api/stream/{}", self.base, id)
    }
}

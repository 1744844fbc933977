//! Metadata source that skips HTTP and asks a resolver directly.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;
use vidrelay_core::{MediaId, SourceResolver, VideoInfo};
use vidrelay_player::{MetadataError, MetadataSource};

/// Answers `video_info` the way the relay's endpoint would, without a
/// server in between.
#[derive(Debug, Clone)]
pub struct ResolverMetadataSource {
    resolver: Arc<dyn SourceResolver>,
    base: String,
}

impl ResolverMetadataSource {
    /// Stream URLs are built against `base`.
    pub fn new(resolver: Arc<dyn SourceResolver>, base: &str) -> Self {
        Self {
            resolver,
            base: base.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MetadataSource for ResolverMetadataSource {
    async fn video_info(&self, id: &MediaId) -> Result<VideoInfo, MetadataError> {
        let resolved = self.resolver.resolve(id).await.and_then(|media| {
            media.require_combined_format()?;
            Ok(VideoInfo::from_media(&media))
        });
        resolved.map_err(|e| {
            warn!("Resolution of {} failed: {}", id, e);
            MetadataError::Status {
                status: 500,
                message: "Failed to fetch video info".to_string(),
            }
        })
    }

    fn stream_url(&self, id: &MediaId) -> String {
        format!("{}/api/stream/{}", self.base, id)
    }
}

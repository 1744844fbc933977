//! Deterministic stand-in for the production resolver.
//!
//! Any syntactically valid identifier resolves. Unknown identifiers get
//! metadata and a content length derived from a seed, so the same id always
//! produces the same media and bytes across runs.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;
use vidrelay_core::MediaId;
use vidrelay_core::resolver::{
    FormatDescriptor, MediaDetails, ResolveError, ResolvedMedia, SourceResolver,
    select_combined_format,
};

use crate::bytes::sim_url;

/// One simulated media item.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedMedia {
    pub id: MediaId,
    pub details: MediaDetails,
    /// Seed of the synthetic bytes
    pub seed: u64,
    /// Size of the combined rendition
    pub size: u64,
    /// Whether the combined rendition advertises its length
    pub length_known: bool,
    /// Whether a combined audio+video rendition exists at all
    pub combined: bool,
}

impl SimulatedMedia {
    /// Derives an item from `id` and the resolver seed.
    pub fn generate(id: &MediaId, base_seed: u64) -> Self {
        let seed = base_seed ^ fnv1a(id.as_str().as_bytes());
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let length_seconds = rng.random_range(60..=900);
        let size = rng.random_range(256 * 1024..=4 * 1024 * 1024);

        Self {
            id: id.clone(),
            details: MediaDetails {
                title: format!("Simulated video {id}"),
                author: "vidrelay simulator".to_string(),
                length_seconds,
                thumbnails: vec![
                    format!("https://img.youtube.com/vi/{id}/default.jpg"),
                    format!("https://img.youtube.com/vi/{id}/hqdefault.jpg"),
                ],
                description: format!("Deterministic synthetic content, seed {seed}"),
            },
            seed,
            size,
            length_known: true,
            combined: true,
        }
    }

    /// Offered renditions: split tracks of higher quality plus the combined
    /// one when present.
    pub fn formats(&self) -> Vec<FormatDescriptor> {
        let url = sim_url(self.id.as_str(), self.seed, self.size);
        let rendition = |has_video, has_audio, height: Option<u32>, bitrate| FormatDescriptor {
            has_video,
            has_audio,
            content_length: Some(self.size),
            mime_type: "video/mp4".to_string(),
            url: url.clone(),
            height,
            bitrate: Some(bitrate),
            http_headers: HashMap::new(),
        };

        let mut formats = vec![
            rendition(true, false, Some(1080), 4_000_000),
            rendition(false, true, None, 128_000),
        ];
        if self.combined {
            let mut combined = rendition(true, true, Some(360), 700_000);
            if !self.length_known {
                combined.content_length = None;
            }
            formats.push(combined);
        }
        formats
    }

    fn resolved(&self) -> ResolvedMedia {
        ResolvedMedia {
            id: self.id.clone(),
            details: self.details.clone(),
            format: select_combined_format(self.formats()),
        }
    }
}

fn fnv1a(data: &[u8]) -> u64 {
    data.iter().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

/// Resolver over a catalog of simulated media.
#[derive(Debug, Clone)]
pub struct SimulatedResolver {
    seed: u64,
    response_delay: Duration,
    catalog: HashMap<MediaId, SimulatedMedia>,
    rejected: HashSet<MediaId>,
    unavailable: bool,
}

impl SimulatedResolver {
    /// Resolver with seed 42 and no delay.
    pub fn new() -> Self {
        Self {
            seed: 42,
            response_delay: Duration::ZERO,
            catalog: HashMap::new(),
            rejected: HashSet::new(),
            unavailable: false,
        }
    }

    /// Sets the seed for generated media.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets simulated resolution latency.
    pub fn with_response_delay(mut self, delay: Duration) -> Self {
        self.response_delay = delay;
        self
    }

    /// Adds or replaces a catalog entry.
    pub fn with_media(mut self, media: SimulatedMedia) -> Self {
        self.catalog.insert(media.id.clone(), media);
        self
    }

    /// Makes `id` fail as rejected by the source.
    pub fn with_rejected(mut self, id: MediaId) -> Self {
        self.rejected.insert(id);
        self
    }

    /// Makes every resolution fail as if the source were down.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// The item `id` resolves to, generated if not in the catalog.
    pub fn media(&self, id: &MediaId) -> SimulatedMedia {
        self.catalog
            .get(id)
            .cloned()
            .unwrap_or_else(|| SimulatedMedia::generate(id, self.seed))
    }
}

impl Default for SimulatedResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceResolver for SimulatedResolver {
    async fn resolve(&self, id: &MediaId) -> Result<ResolvedMedia, ResolveError> {
        if !self.response_delay.is_zero() {
            tokio::time::sleep(self.response_delay).await;
        }
        if self.unavailable {
            return Err(ResolveError::Unavailable {
                reason: "simulated source outage".to_string(),
            });
        }
        if self.rejected.contains(id) {
            return Err(ResolveError::Rejected {
                id: id.clone(),
                reason: "Video unavailable".to_string(),
            });
        }

        debug!("Simulated resolution of {}", id);
        Ok(self.media(id).resolved())
    }
}

//! Short-lived cache of successful resolutions.
//!
//! A player reissues a stream request on every seek; without a cache each of
//! those pays a full resolver round-trip. Entries expire after a TTL because
//! upstream URLs are signed and eventually stop working.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use tracing::debug;

use super::{ResolveError, ResolvedMedia, SourceResolver};
use crate::identifier::MediaId;

/// LRU + TTL cache in front of another resolver. Failures are never cached.
#[derive(Debug)]
pub struct CachedResolver<R> {
    inner: R,
    ttl: Duration,
    entries: Mutex<LruCache<MediaId, (Instant, ResolvedMedia)>>,
}

impl<R: SourceResolver> CachedResolver<R> {
    /// Wraps `inner`, keeping at most `capacity` entries for `ttl` each.
    pub fn new(inner: R, capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Number of live (possibly expired, not yet evicted) entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn lookup(&self, id: &MediaId) -> Option<ResolvedMedia> {
        let mut entries = self.entries.lock();
        let cached = entries
            .get(id)
            .map(|(stored_at, media)| (stored_at.elapsed() < self.ttl, media.clone()));

        match cached {
            Some((true, media)) => Some(media),
            Some((false, _)) => {
                entries.pop(id);
                None
            }
            None => None,
        }
    }
}

#[async_trait]
impl<R: SourceResolver> SourceResolver for CachedResolver<R> {
    async fn resolve(&self, id: &MediaId) -> Result<ResolvedMedia, ResolveError> {
        if let Some(media) = self.lookup(id) {
            debug!("Resolver cache hit for {}", id);
            return Ok(media);
        }

        let media = self.inner.resolve(id).await?;
        self.entries
            .lock()
            .put(id.clone(), (Instant::now(), media.clone()));
        Ok(media)
    }
}

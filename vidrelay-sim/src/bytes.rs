//! Seekable synthetic media bytes.
//!
//! Content is the ChaCha8 keystream for a per-media seed, so any byte range
//! can be regenerated independently and compared against what a client
//! received.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;
use url::Url;
use vidrelay_core::resolver::FormatDescriptor;
use vidrelay_core::upstream::{ByteSource, ByteSpan, ByteStream, UpstreamError};

/// URL scheme understood by [`InMemoryByteSource`].
pub const SIM_SCHEME: &str = "sim";

/// Bytes `[offset, offset + len)` of the synthetic content for `seed`.
pub fn synthetic_bytes(seed: u64, offset: u64, len: usize) -> Vec<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_word_pos(u128::from(offset / 4));

    let skip = (offset % 4) as usize;
    let mut buf = vec![0u8; skip + len];
    rng.fill_bytes(&mut buf);
    buf.drain(..skip);
    buf
}

/// Location of synthetic content: `sim://media/{id}?seed={seed}&len={len}`.
pub fn sim_url(id: &str, seed: u64, len: u64) -> Option<Url> {
    let mut url = Url::parse(&format!("{SIM_SCHEME}://media/{id}")).ok()?;
    url.query_pairs_mut()
        .append_pair("seed", &seed.to_string())
        .append_pair("len", &len.to_string());
    Some(url)
}

fn parse_sim_url(url: &Url) -> Option<(u64, u64)> {
    if url.scheme() != SIM_SCHEME {
        return None;
    }
    let mut seed = None;
    let mut len = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "seed" => seed = value.parse().ok(),
            "len" => len = value.parse().ok(),
            _ => {}
        }
    }
    Some((seed?, len?))
}

/// Injected misbehavior of an opened stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamFault {
    /// Deliver every byte
    #[default]
    None,
    /// Fail with a transport error after this many bytes
    ErrorAfter(u64),
    /// End cleanly, but early, after this many bytes
    EndAfter(u64),
}

/// Serves `sim://` formats from memory with optional latency and faults.
#[derive(Debug, Clone)]
pub struct InMemoryByteSource {
    chunk_size: usize,
    chunk_delay: Duration,
    fault: StreamFault,
    refuse_open: bool,
    opened: Arc<AtomicUsize>,
    live: Arc<AtomicUsize>,
    produced: Arc<AtomicUsize>,
}

impl InMemoryByteSource {
    /// Source with 64 KiB chunks and no latency.
    pub fn new() -> Self {
        Self {
            chunk_size: 64 * 1024,
            chunk_delay: Duration::ZERO,
            fault: StreamFault::None,
            refuse_open: false,
            opened: Arc::new(AtomicUsize::new(0)),
            live: Arc::new(AtomicUsize::new(0)),
            produced: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Sets the size of emitted chunks.
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    /// Sleeps this long before each chunk.
    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = delay;
        self
    }

    /// Injects a fault into every opened stream.
    pub fn with_fault(mut self, fault: StreamFault) -> Self {
        self.fault = fault;
        self
    }

    /// Refuses every open as if upstream were unreachable.
    pub fn refusing(mut self) -> Self {
        self.refuse_open = true;
        self
    }

    /// Number of streams opened so far.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::Relaxed)
    }

    /// Opened streams that are neither exhausted nor dropped.
    pub fn live_streams(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }

    /// Chunks generated across all streams.
    pub fn chunks_produced(&self) -> usize {
        self.produced.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryByteSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps [`InMemoryByteSource::live_streams`] accurate; dropped with the
/// stream state.
struct LiveGuard(Arc<AtomicUsize>);

impl LiveGuard {
    fn new(live: &Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::Relaxed);
        Self(Arc::clone(live))
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

struct Cursor {
    seed: u64,
    next: u64,
    end: u64,
    emitted: u64,
    failed: bool,
    produced: Arc<AtomicUsize>,
    _live: LiveGuard,
}

#[async_trait]
impl ByteSource for InMemoryByteSource {
    async fn open(
        &self,
        format: &FormatDescriptor,
        span: Option<ByteSpan>,
    ) -> Result<ByteStream, UpstreamError> {
        let (seed, total) = format
            .url
            .as_ref()
            .and_then(parse_sim_url)
            .ok_or(UpstreamError::MissingUrl)?;

        if self.refuse_open {
            return Err(UpstreamError::Connect {
                reason: "simulated upstream refused connection".to_string(),
            });
        }

        let (start, end) = match span {
            Some(span) if span.start >= total => {
                return Err(UpstreamError::Status { status: 416 });
            }
            Some(span) => (span.start, span.end.min(total.saturating_sub(1)) + 1),
            None => (0, total),
        };
        self.opened.fetch_add(1, Ordering::Relaxed);
        debug!("Simulated upstream serving {}..{} of {}", start, end, total);

        let chunk_size = self.chunk_size as u64;
        let delay = self.chunk_delay;
        let fault = self.fault;
        let cursor = Cursor {
            seed,
            next: start,
            end,
            emitted: 0,
            failed: false,
            produced: Arc::clone(&self.produced),
            _live: LiveGuard::new(&self.live),
        };

        let stream = stream::unfold(cursor, move |mut cursor| async move {
            if cursor.failed || cursor.next >= cursor.end {
                return None;
            }

            let mut len = chunk_size.min(cursor.end - cursor.next);
            match fault {
                StreamFault::ErrorAfter(limit) if cursor.emitted >= limit => {
                    cursor.failed = true;
                    let err = UpstreamError::Transport {
                        reason: "simulated upstream failure".to_string(),
                    };
                    return Some((Err(err), cursor));
                }
                StreamFault::EndAfter(limit) if cursor.emitted >= limit => return None,
                StreamFault::ErrorAfter(limit) | StreamFault::EndAfter(limit) => {
                    len = len.min(limit - cursor.emitted);
                }
                StreamFault::None => {}
            }

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let chunk = synthetic_bytes(cursor.seed, cursor.next, len as usize);
            cursor.next += len;
            cursor.emitted += len;
            cursor.produced.fetch_add(1, Ordering::Relaxed);
            Some((Ok(Bytes::from(chunk)), cursor))
        });

        Ok(Box::pin(stream))
    }
}

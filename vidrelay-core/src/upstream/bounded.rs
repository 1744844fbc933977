//! Exact-length enforcement for upstream streams.

use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use futures::{Stream, StreamExt};

use super::{ByteStream, UpstreamError};

/// Yields exactly `expected` bytes from the inner stream.
///
/// Surplus bytes are cut off and the inner stream is dropped as soon as the
/// limit is reached. An inner stream that ends early produces a final
/// [`UpstreamError::Truncated`] so the HTTP layer aborts the connection
/// instead of ending a response shorter than its `Content-Length`.
pub struct BoundedStream {
    inner: Option<ByteStream>,
    expected: u64,
    remaining: u64,
}

impl BoundedStream {
    /// Bounds `inner` to `expected` bytes.
    pub fn new(inner: ByteStream, expected: u64) -> Self {
        Self {
            inner: Some(inner),
            expected,
            remaining: expected,
        }
    }

    /// Boxes the bounded stream.
    pub fn boxed(self) -> ByteStream {
        Box::pin(self)
    }
}

impl Stream for BoundedStream {
    type Item = Result<Bytes, UpstreamError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.remaining == 0 {
            self.inner = None;
            return Poll::Ready(None);
        }

        let Some(inner) = self.inner.as_mut() else {
            return Poll::Ready(None);
        };

        match ready!(inner.poll_next_unpin(cx)) {
            Some(Ok(mut chunk)) => {
                if chunk.len() as u64 > self.remaining {
                    chunk.truncate(self.remaining as usize);
                }
                self.remaining -= chunk.len() as u64;
                Poll::Ready(Some(Ok(chunk)))
            }
            Some(Err(e)) => {
                self.inner = None;
                Poll::Ready(Some(Err(e)))
            }
            None => {
                self.inner = None;
                let received = self.expected - self.remaining;
                Poll::Ready(Some(Err(UpstreamError::Truncated {
                    expected: self.expected,
                    received,
                })))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::stream;

    use super::*;

    fn chunks(parts: &[&'static [u8]]) -> ByteStream {
        let items: Vec<Result<Bytes, UpstreamError>> = parts
            .iter()
            .map(|p| Ok(Bytes::from_static(*p)))
            .collect();
        Box::pin(stream::iter(items))
    }

    async fn collect(stream: BoundedStream) -> (Vec<u8>, Option<UpstreamError>) {
        let mut data = Vec::new();
        let mut stream = Box::pin(stream);
        while let Some(item) = stream.next().await {
            match item {
                Ok(chunk) => data.extend_from_slice(&chunk),
                Err(e) => return (data, Some(e)),
            }
        }
        (data, None)
    }

    #[tokio::test]
    async fn test_exact_length_passes_through() {
        let bounded = BoundedStream::new(chunks(&[b"abc", b"def"]), 6);
        let (data, err) = collect(bounded).await;
        assert_eq!(data, b"abcdef");
        assert!(err.is_none());
    }

    #[tokio::test]
    async fn test_surplus_is_cut_off() {
        let bounded = BoundedStream::new(chunks(&[b"abc", b"def", b"ghi"]), 4);
        let (data, err) = collect(bounded).await;
        assert_eq!(data, b"abcd");
        assert!(err.is_none());
    }

    #[tokio::test]
    async fn test_short_upstream_reports_truncation() {
        let bounded = BoundedStream::new(chunks(&[b"abc"]), 10);
        let (data, err) = collect(bounded).await;
        assert_eq!(data, b"abc");
        assert!(matches!(
            err,
            Some(UpstreamError::Truncated {
                expected: 10,
                received: 3
            })
        ));
    }
}

//! Shared helpers for integration tests.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, Bytes, to_bytes};
use axum::http::{Method, Request, header};
use axum::response::Response;
use tower::ServiceExt;
use vidrelay_core::{MediaId, StreamProxy};
use vidrelay_sim::{InMemoryByteSource, SimulatedMedia, SimulatedResolver};
use vidrelay_web::{AppState, build_router};

pub const VIDEO_ID: &str = "dQw4w9WgXcQ";

pub fn video_id() -> MediaId {
    MediaId::parse(VIDEO_ID).unwrap()
}

/// Simulated media of exactly `size` bytes.
pub fn media_of_size(size: u64) -> SimulatedMedia {
    let mut media = SimulatedMedia::generate(&video_id(), 42);
    media.size = size;
    media
}

pub fn router(resolver: SimulatedResolver, source: InMemoryByteSource) -> Router {
    let proxy = StreamProxy::new(Arc::new(resolver), Arc::new(source));
    build_router(AppState::new(proxy, "does-not-exist"))
}

/// Router serving one 1000-byte video.
pub fn kilobyte_router() -> Router {
    router(
        SimulatedResolver::new().with_media(media_of_size(1000)),
        InMemoryByteSource::new().with_chunk_size(64),
    )
}

pub async fn send(app: Router, method: Method, uri: &str, range: Option<&str>) -> Response {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(range) = range {
        request = request.header(header::RANGE, range);
    }
    app.oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn body(response: Response) -> Result<Bytes, axum::Error> {
    to_bytes(response.into_body(), usize::MAX).await
}

pub fn header_str<'a>(response: &'a Response, name: header::HeaderName) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

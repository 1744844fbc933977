//! Upstream reads follow the client: lazy pulls and release on disconnect.

use std::time::Duration;

use axum::http::{Method, StatusCode};
use futures::StreamExt;
use vidrelay_sim::{InMemoryByteSource, SimulatedResolver};

use crate::fixtures::{media_of_size, router, send};

const STREAM: &str = "/api/stream/dQw4w9WgXcQ";

fn resolver() -> SimulatedResolver {
    SimulatedResolver::new().with_media(media_of_size(1000))
}

#[tokio::test]
async fn test_client_disconnect_releases_upstream() {
    let source = InMemoryByteSource::new().with_chunk_size(100);
    let response = send(router(resolver(), source.clone()), Method::GET, STREAM, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let mut data = response.into_body().into_data_stream();
    let first = data.next().await.unwrap().unwrap();
    assert_eq!(first.len(), 100);
    assert_eq!(source.live_streams(), 1);

    drop(data);
    assert_eq!(source.live_streams(), 0);
    assert!(source.chunks_produced() < 10);
}

#[tokio::test]
async fn test_dropped_partial_response_releases_upstream() {
    let source = InMemoryByteSource::new().with_chunk_size(50);
    let response = send(
        router(resolver(), source.clone()),
        Method::GET,
        STREAM,
        Some("bytes=200-799"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(source.live_streams(), 1);

    drop(response);
    assert_eq!(source.live_streams(), 0);
}

#[tokio::test]
async fn test_upstream_is_pulled_at_client_pace() {
    let source = InMemoryByteSource::new()
        .with_chunk_size(100)
        .with_chunk_delay(Duration::from_millis(1));
    let response = send(router(resolver(), source.clone()), Method::GET, STREAM, None).await;
    let mut data = response.into_body().into_data_stream();

    for pulled in 1..=5 {
        data.next().await.unwrap().unwrap();
        // Upstream must not run ahead of an idle reader.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(
            source.chunks_produced() <= pulled + 1,
            "{} chunks produced after {} pulled",
            source.chunks_produced(),
            pulled
        );
    }
}

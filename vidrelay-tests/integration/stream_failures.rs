//! Failures before and after the stream response head.

use axum::http::{Method, StatusCode, header};
use vidrelay_sim::{InMemoryByteSource, SimulatedResolver, StreamFault};

use crate::fixtures::{body, header_str, media_of_size, router, send, video_id};

const STREAM: &str = "/api/stream/dQw4w9WgXcQ";
const STREAM_FAILED: &[u8] = br#"{"error":"Failed to stream video"}"#;

fn resolver() -> SimulatedResolver {
    SimulatedResolver::new().with_media(media_of_size(1000))
}

#[tokio::test]
async fn test_mid_stream_error_aborts_body_after_head() {
    let source = InMemoryByteSource::new()
        .with_chunk_size(100)
        .with_fault(StreamFault::ErrorAfter(300));
    let response = send(router(resolver(), source), Method::GET, STREAM, Some("bytes=0-999")).await;

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(header_str(&response, header::CONTENT_LENGTH), Some("1000"));
    assert!(body(response).await.is_err());
}

#[tokio::test]
async fn test_early_upstream_end_is_not_silently_truncated() {
    let source = InMemoryByteSource::new().with_fault(StreamFault::EndAfter(400));
    let response = send(router(resolver(), source), Method::GET, STREAM, None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body(response).await.is_err());
}

#[tokio::test]
async fn test_refused_upstream_is_pre_header_failure() {
    let source = InMemoryByteSource::new().refusing();
    let response = send(router(resolver(), source), Method::GET, STREAM, Some("bytes=0-99")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(&body(response).await.unwrap()[..], STREAM_FAILED);
}

#[tokio::test]
async fn test_resolution_failures_do_not_leak_details() {
    let rejected = SimulatedResolver::new().with_rejected(video_id());
    let response = send(router(rejected, InMemoryByteSource::new()), Method::GET, STREAM, None).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(&body(response).await.unwrap()[..], STREAM_FAILED);

    let down = SimulatedResolver::new().unavailable();
    let response = send(router(down, InMemoryByteSource::new()), Method::GET, STREAM, None).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(&body(response).await.unwrap()[..], STREAM_FAILED);
}

#[tokio::test]
async fn test_split_only_media_cannot_stream() {
    let mut media = media_of_size(1000);
    media.combined = false;
    let app = router(
        SimulatedResolver::new().with_media(media),
        InMemoryByteSource::new(),
    );

    let response = send(app, Method::GET, STREAM, None).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_invalid_identifier_is_bad_request() {
    let app = router(resolver(), InMemoryByteSource::new());
    let response = send(app, Method::GET, "/api/stream/not-an-id", None).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        &body(response).await.unwrap()[..],
        br#"{"error":"Invalid YouTube URL"}"#
    );
}

//! Range semantics of `/api/stream/{id}` over a 1000-byte resource.

use axum::http::{Method, StatusCode, header};
use vidrelay_sim::{InMemoryByteSource, SimulatedResolver, synthetic_bytes};

use crate::fixtures::{body, header_str, kilobyte_router, media_of_size, router, send};

const STREAM: &str = "/api/stream/dQw4w9WgXcQ";

fn seed() -> u64 {
    media_of_size(1000).seed
}

#[tokio::test]
async fn test_bounded_range_is_partial() {
    let response = send(kilobyte_router(), Method::GET, STREAM, Some("bytes=100-199")).await;

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        header_str(&response, header::CONTENT_RANGE),
        Some("bytes 100-199/1000")
    );
    assert_eq!(header_str(&response, header::CONTENT_LENGTH), Some("100"));
    assert_eq!(header_str(&response, header::ACCEPT_RANGES), Some("bytes"));
    assert_eq!(header_str(&response, header::CONTENT_TYPE), Some("video/mp4"));

    let data = body(response).await.unwrap();
    assert_eq!(&data[..], &synthetic_bytes(seed(), 100, 100)[..]);
}

#[tokio::test]
async fn test_open_ended_range_runs_to_last_byte() {
    let response = send(kilobyte_router(), Method::GET, STREAM, Some("bytes=500-")).await;

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        header_str(&response, header::CONTENT_RANGE),
        Some("bytes 500-999/1000")
    );
    assert_eq!(header_str(&response, header::CONTENT_LENGTH), Some("500"));
    assert_eq!(body(response).await.unwrap().len(), 500);
}

#[tokio::test]
async fn test_no_range_is_full_body() {
    let response = send(kilobyte_router(), Method::GET, STREAM, None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, header::CONTENT_LENGTH), Some("1000"));
    assert!(response.headers().get(header::CONTENT_RANGE).is_none());

    let data = body(response).await.unwrap();
    assert_eq!(&data[..], &synthetic_bytes(seed(), 0, 1000)[..]);
}

#[tokio::test]
async fn test_range_past_end_is_unsatisfiable() {
    let response = send(kilobyte_router(), Method::GET, STREAM, Some("bytes=1000-")).await;

    assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(
        header_str(&response, header::CONTENT_RANGE),
        Some("bytes */1000")
    );
    let data = body(response).await.unwrap();
    assert_eq!(&data[..], br#"{"error":"Range not satisfiable"}"#);
}

#[tokio::test]
async fn test_end_past_length_is_clamped() {
    let response = send(kilobyte_router(), Method::GET, STREAM, Some("bytes=900-5000")).await;

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        header_str(&response, header::CONTENT_RANGE),
        Some("bytes 900-999/1000")
    );
    assert_eq!(body(response).await.unwrap().len(), 100);
}

#[tokio::test]
async fn test_suffix_range_serves_tail() {
    let response = send(kilobyte_router(), Method::GET, STREAM, Some("bytes=-100")).await;

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        header_str(&response, header::CONTENT_RANGE),
        Some("bytes 900-999/1000")
    );
    let data = body(response).await.unwrap();
    assert_eq!(&data[..], &synthetic_bytes(seed(), 900, 100)[..]);
}

#[tokio::test]
async fn test_invalid_and_multi_ranges_are_ignored() {
    for range in ["bytes=200-100", "bytes=0-1,5-9", "items=0-10", "garbage"] {
        let response = send(kilobyte_router(), Method::GET, STREAM, Some(range)).await;
        assert_eq!(response.status(), StatusCode::OK, "range {range}");
        assert_eq!(header_str(&response, header::CONTENT_LENGTH), Some("1000"));
    }
}

#[tokio::test]
async fn test_unknown_length_ignores_range() {
    let mut media = media_of_size(1000);
    media.length_known = false;
    let app = router(
        SimulatedResolver::new().with_media(media),
        InMemoryByteSource::new(),
    );

    let response = send(app, Method::GET, STREAM, Some("bytes=100-199")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::CONTENT_LENGTH).is_none());
    assert!(response.headers().get(header::CONTENT_RANGE).is_none());
    assert_eq!(body(response).await.unwrap().len(), 1000);
}

#[tokio::test]
async fn test_head_matches_get_without_body() {
    let source = InMemoryByteSource::new();
    let app = router(
        SimulatedResolver::new().with_media(media_of_size(1000)),
        source.clone(),
    );

    let response = send(app, Method::HEAD, STREAM, Some("bytes=100-199")).await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        header_str(&response, header::CONTENT_RANGE),
        Some("bytes 100-199/1000")
    );
    assert_eq!(header_str(&response, header::CONTENT_LENGTH), Some("100"));
    assert_eq!(source.opened(), 0);
}

#[tokio::test]
async fn test_concurrent_ranges_are_independent() {
    let source = InMemoryByteSource::new().with_chunk_size(16);
    let app = router(
        SimulatedResolver::new().with_media(media_of_size(1000)),
        source.clone(),
    );

    let (a, b) = tokio::join!(
        send(app.clone(), Method::GET, STREAM, Some("bytes=0-499")),
        send(app, Method::GET, STREAM, Some("bytes=500-999")),
    );
    let (a, b) = (body(a).await.unwrap(), body(b).await.unwrap());

    let mut joined = a.to_vec();
    joined.extend_from_slice(&b);
    assert_eq!(joined, synthetic_bytes(seed(), 0, 1000));
    assert_eq!(source.opened(), 2);
}

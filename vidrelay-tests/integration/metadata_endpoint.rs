//! `/api/video-info/{id}` against the simulated resolver.

use axum::http::{Method, StatusCode};
use vidrelay_sim::{InMemoryByteSource, SimulatedResolver};

use crate::fixtures::{body, media_of_size, router, send, video_id};

const INFO: &str = "/api/video-info/dQw4w9WgXcQ";

async fn fetch_json(resolver: SimulatedResolver, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = send(router(resolver, InMemoryByteSource::new()), Method::GET, uri, None).await;
    let status = response.status();
    let data = body(response).await.unwrap();
    (status, serde_json::from_slice(&data).unwrap())
}

#[tokio::test]
async fn test_info_fields() {
    let media = media_of_size(1000);
    let (status, json) = fetch_json(SimulatedResolver::new().with_media(media.clone()), INFO).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], media.details.title.as_str());
    assert_eq!(json["author"], media.details.author.as_str());
    assert_eq!(json["lengthSeconds"], media.details.length_seconds);
    assert_eq!(json["description"], media.details.description.as_str());
    assert_eq!(
        json["thumbnail"],
        "https://img.youtube.com/vi/dQw4w9WgXcQ/hqdefault.jpg"
    );
}

#[tokio::test]
async fn test_missing_combined_format_is_500() {
    let mut media = media_of_size(1000);
    media.combined = false;
    let (status, json) = fetch_json(SimulatedResolver::new().with_media(media), INFO).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Failed to fetch video info");
    assert!(json.get("title").is_none());
}

#[tokio::test]
async fn test_invalid_identifier() {
    let (status, json) = fetch_json(SimulatedResolver::new(), "/api/video-info/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid YouTube URL");
}

#[tokio::test]
async fn test_rejected_identifier_is_generic_500() {
    let (status, json) =
        fetch_json(SimulatedResolver::new().with_rejected(video_id()), INFO).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Failed to fetch video info");
}

#[tokio::test]
async fn test_repeated_requests_are_idempotent() {
    let (_, first) = fetch_json(SimulatedResolver::new(), INFO).await;
    let (_, second) = fetch_json(SimulatedResolver::new(), INFO).await;
    assert_eq!(first, second);
}

//! HTTP client to relay to simulated upstream, over a real socket.

use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::header::{CONTENT_LENGTH, CONTENT_RANGE, RANGE};
use tokio::net::TcpListener;
use vidrelay_core::{MediaId, RelayConfig, RuntimeMode};
use vidrelay_player::{
    ControllerConfig, HttpMetadataClient, MemoryStore, MetadataSource, PlaybackState,
    PlaylistStore, SessionController, SessionParts, ShortcutHub,
};
use vidrelay_sim::{SimulatedMediaFactory, SimulatedResolver, synthetic_bytes};
use vidrelay_web::{AppState, build_proxy, build_router, serve};

async fn spawn_relay() -> SocketAddr {
    let config = RelayConfig::for_testing();
    let proxy = build_proxy(RuntimeMode::Development, &config).unwrap();
    let app = build_router(AppState::new(proxy, "does-not-exist"));

    let listener = TcpListener::bind(config.server.socket_addr()).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, app));
    addr
}

#[tokio::test]
async fn test_ranged_get_over_socket() {
    let addr = spawn_relay().await;
    let id = MediaId::parse("dQw4w9WgXcQ").unwrap();
    let media = SimulatedResolver::new().media(&id);

    let response = reqwest::Client::new()
        .get(format!("http://{addr}/api/stream/{id}"))
        .header(RANGE, "bytes=1024-2047")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.headers()[CONTENT_LENGTH], "1024");
    assert_eq!(
        response.headers()[CONTENT_RANGE],
        format!("bytes 1024-2047/{}", media.size).as_str()
    );

    let body = response.bytes().await.unwrap();
    assert_eq!(&body[..], &synthetic_bytes(media.seed, 1024, 1024)[..]);
}

#[tokio::test]
async fn test_metadata_client_against_relay() {
    let addr = spawn_relay().await;
    let client = HttpMetadataClient::with_client(reqwest::Client::new(), &format!("http://{addr}"));
    let id = MediaId::parse("dQw4w9WgXcQ").unwrap();

    let info = client.video_info(&id).await.unwrap();
    assert_eq!(info.title, SimulatedResolver::new().media(&id).details.title);

    let response = reqwest::get(format!("http://{addr}/api/video-info/not-valid"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid YouTube URL");
}

#[tokio::test]
async fn test_session_plays_from_live_relay() {
    let addr = spawn_relay().await;
    let base = format!("http://{addr}");
    let factory = SimulatedMediaFactory::new();
    let parts = SessionParts {
        store: PlaylistStore::new(Arc::new(MemoryStore::new()), "youtube-playlist"),
        metadata: Arc::new(HttpMetadataClient::with_client(reqwest::Client::new(), &base)),
        media: Arc::new(factory.clone()),
        hub: ShortcutHub::new(),
        controller: ControllerConfig::default(),
    };

    let mut session = SessionController::new(parts);
    session
        .load_video("https://youtu.be/dQw4w9WgXcQ")
        .await
        .unwrap();

    assert_eq!(session.playback_state(), PlaybackState::Playing);
    let stream_url = factory.last().unwrap().source_url();
    assert_eq!(stream_url, format!("{base}/api/stream/dQw4w9WgXcQ"));

    let head = reqwest::Client::new().head(&stream_url).send().await.unwrap();
    assert_eq!(head.status(), StatusCode::OK);
    assert!(head.headers().contains_key(CONTENT_LENGTH));
}

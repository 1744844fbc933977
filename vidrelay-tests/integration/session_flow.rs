//! Player session over the simulated relay: load, switch, remove, restore.

use std::sync::Arc;

use vidrelay_core::MediaId;
use vidrelay_core::config::ClientConfig;
use vidrelay_player::session::EMPTY_PLAYER_MESSAGE;
use vidrelay_player::{
    ControllerConfig, Key, KeyInput, MediaElement, MemoryStore, PlaybackState, PlaylistStore,
    SessionController, SessionParts, ShortcutHub, Surface, TrackBounds,
};
use vidrelay_sim::{
    ResolverMetadataSource, SimulatedMedia, SimulatedMediaFactory, SimulatedResolver,
};

const FIRST: &str = "dQw4w9WgXcQ";
const SECOND: &str = "9bZkp7q2_0M";

struct Harness {
    parts: SessionParts,
    factory: SimulatedMediaFactory,
    hub: ShortcutHub,
}

impl Harness {
    fn new(resolver: SimulatedResolver) -> Self {
        Self::with_store(resolver, Arc::new(MemoryStore::new()))
    }

    fn with_store(resolver: SimulatedResolver, store: Arc<MemoryStore>) -> Self {
        let factory = SimulatedMediaFactory::new().with_duration(100.0);
        let hub = ShortcutHub::new();
        let parts = SessionParts {
            store: PlaylistStore::from_config(store, &ClientConfig::default()),
            metadata: Arc::new(ResolverMetadataSource::new(
                Arc::new(resolver),
                "http://relay.test",
            )),
            media: Arc::new(factory.clone()),
            hub: hub.clone(),
            controller: ControllerConfig::default(),
        };
        Self {
            parts,
            factory,
            hub,
        }
    }

    fn session(&self) -> SessionController {
        SessionController::new(self.parts.clone())
    }
}

fn id(raw: &str) -> MediaId {
    MediaId::parse(raw).unwrap()
}

#[tokio::test]
async fn test_url_shapes_collapse_to_one_entry() {
    let harness = Harness::new(SimulatedResolver::new());
    let mut session = harness.session();

    for url in [
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
        "https://youtu.be/dQw4w9WgXcQ",
        "https://www.youtube.com/embed/dQw4w9WgXcQ",
    ] {
        session.load_video(url).await.unwrap();
    }

    assert_eq!(session.playlist().ids(), vec![id(FIRST)]);
    assert_eq!(session.active(), Some(&id(FIRST)));
    assert_eq!(session.playback_state(), PlaybackState::Playing);
    assert_eq!(
        harness.factory.last().unwrap().source_url(),
        "http://relay.test/api/stream/dQw4w9WgXcQ"
    );
}

#[tokio::test]
async fn test_invalid_input_changes_nothing() {
    let harness = Harness::new(SimulatedResolver::new());
    let mut session = harness.session();

    let err = session.load_video("   ").await.unwrap_err();
    assert_eq!(err.user_message(), "Please enter a YouTube URL");
    let err = session.load_video("https://example.com/video").await.unwrap_err();
    assert_eq!(err.user_message(), "Invalid YouTube URL. Please enter a valid URL.");

    assert!(session.playlist().is_empty());
    assert!(matches!(session.surface(), Surface::Empty));
    assert!(harness.factory.created().is_empty());
}

#[tokio::test]
async fn test_switch_moves_shortcuts_to_new_video() {
    let harness = Harness::new(SimulatedResolver::new());
    let mut session = harness.session();

    session.load_video(FIRST).await.unwrap();
    let first_registration = session.controller().unwrap().registration().id();
    session.load_video(SECOND).await.unwrap();

    let second_registration = session.controller().unwrap().registration().id();
    assert_ne!(first_registration, second_registration);
    assert_eq!(harness.hub.active(), Some(second_registration));

    let created = harness.factory.created();
    let (mut first, second) = (created[0].clone(), created[1].clone());
    first.drain_events();

    assert!(session.handle_key(KeyInput::new(Key::Space)));
    assert!(second.is_paused());
    assert!(first.drain_events().is_empty());

    // Newest first; switching does not reorder.
    assert_eq!(session.playlist().ids(), vec![id(SECOND), id(FIRST)]);
    session.play_video(id(FIRST)).await;
    assert_eq!(session.playlist().ids(), vec![id(SECOND), id(FIRST)]);
}

#[tokio::test]
async fn test_remove_promotes_then_empties() {
    let harness = Harness::new(SimulatedResolver::new());
    let mut session = harness.session();
    session.load_video(FIRST).await.unwrap();
    session.load_video(SECOND).await.unwrap();

    session.remove_video(&id(SECOND)).await;
    assert_eq!(session.active(), Some(&id(FIRST)));
    assert!(matches!(session.surface(), Surface::Ready { .. }));

    session.remove_video(&id(FIRST)).await;
    assert_eq!(session.active(), None);
    assert_eq!(session.surface().placeholder(), Some(EMPTY_PLAYER_MESSAGE));
    assert_eq!(harness.hub.active(), None);
}

#[tokio::test]
async fn test_playlist_survives_restart() {
    let store = Arc::new(MemoryStore::new());
    let harness = Harness::with_store(SimulatedResolver::new(), store.clone());
    let mut session = harness.session();
    session.load_video(FIRST).await.unwrap();
    session.load_video(SECOND).await.unwrap();
    let saved = session.playlist().ids();
    drop(session);

    let restarted = Harness::with_store(SimulatedResolver::new(), store);
    let session = SessionController::start(restarted.parts.clone()).await;

    assert_eq!(session.playlist().ids(), saved);
    assert_eq!(session.active(), Some(&id(SECOND)));
    assert!(matches!(session.surface(), Surface::Ready { .. }));
}

#[tokio::test]
async fn test_drag_holds_fill_and_resumes() {
    let harness = Harness::new(SimulatedResolver::new());
    let mut session = harness.session();
    session.load_video(FIRST).await.unwrap();
    let element = harness.factory.last().unwrap();
    let bounds = TrackBounds {
        left: 0.0,
        width: 200.0,
    };

    let controller = session.controller_mut().unwrap();
    controller.seek_pointer_down(50.0, bounds);
    controller.seek_pointer_move(100.0, bounds);
    controller.sync();
    assert!(controller.is_seeking());
    assert_eq!(controller.view().progress, 0.5);

    controller.seek_pointer_up();
    controller.sync();
    assert_eq!(controller.state(), PlaybackState::Playing);
    assert_eq!(element.current_time(), 50.0);
    assert_eq!(element.seeks(), vec![25.0, 50.0]);

    element.advance(10.0);
    session.sync();
    assert_eq!(session.controller().unwrap().view().readout, "1:00 / 1:40");
}

#[tokio::test]
async fn test_failed_metadata_shows_fallback_link() {
    let harness = Harness::new(SimulatedResolver::new().with_rejected(id(FIRST)));
    let mut session = harness.session();
    session.load_video(FIRST).await.unwrap();

    match session.surface() {
        Surface::Failed { id: failed, fallback_url } => {
            assert_eq!(failed, &id(FIRST));
            assert_eq!(fallback_url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        }
        other => panic!("unexpected surface: {other:?}"),
    }
    assert_eq!(session.playback_state(), PlaybackState::Error);
    assert_eq!(session.playlist().len(), 1);
    assert!(!session.handle_key(KeyInput::new(Key::Space)));
}

#[tokio::test]
async fn test_split_only_media_shows_fallback_link() {
    let mut media = SimulatedMedia::generate(&id(FIRST), 42);
    media.combined = false;
    let harness = Harness::new(SimulatedResolver::new().with_media(media));
    let mut session = harness.session();
    session.load_video(FIRST).await.unwrap();

    match session.surface() {
        Surface::Failed { fallback_url, .. } => {
            assert_eq!(fallback_url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        }
        other => panic!("unexpected surface: {other:?}"),
    }
    assert_eq!(session.surface().placeholder(), Some("Unable to load video."));
    assert!(harness.factory.created().is_empty());
}

#[tokio::test]
async fn test_element_error_stops_playback() {
    let harness = Harness::new(SimulatedResolver::new());
    let mut session = harness.session();
    session.load_video(FIRST).await.unwrap();

    harness.factory.last().unwrap().fail();
    session.sync();
    assert_eq!(session.playback_state(), PlaybackState::Error);
}

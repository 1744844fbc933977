//! Playlist/session controller.
//!
//! Owns the playlist, the active identifier and the player surface. The
//! surface belongs to the active identifier: switching drops the previous
//! controller, and with it its shortcut registration, before the next one
//! is built.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};
use vidrelay_core::{IdentifierError, MediaId, VideoInfo};

use crate::client::MetadataSource;
use crate::controller::{ControllerConfig, PlaybackController, PlaybackState};
use crate::media::MediaFactory;
use crate::playlist::{Playlist, PlaylistEntry, PlaylistView};
use crate::shortcuts::{KeyInput, ShortcutHub};
use crate::storage::PlaylistStore;

/// Shown when nothing is selected.
pub const EMPTY_PLAYER_MESSAGE: &str =
    "Paste a YouTube URL and click \"Load Video\" to start watching";

/// Errors surfaced to the user by session actions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Input did not yield an identifier.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] IdentifierError),
}

impl SessionError {
    /// Message for the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            SessionError::InvalidInput(IdentifierError::Empty) => "Please enter a YouTube URL",
            SessionError::InvalidInput(_) => "Invalid YouTube URL. Please enter a valid URL.",
        }
    }
}

/// What the player area shows.
#[derive(Debug)]
pub enum Surface {
    /// Nothing selected
    Empty,
    /// Metadata request in flight
    Loading { id: MediaId },
    /// Player bound to the stream
    Ready {
        id: MediaId,
        info: VideoInfo,
        controller: PlaybackController,
    },
    /// Loading failed; terminal until another video is played
    Failed { id: MediaId, fallback_url: String },
}

impl Surface {
    /// Placeholder text for surfaces without a player.
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            Surface::Empty => Some(EMPTY_PLAYER_MESSAGE),
            Surface::Loading { .. } => Some("Loading video..."),
            Surface::Failed { .. } => Some("Unable to load video."),
            Surface::Ready { .. } => None,
        }
    }
}

/// Collaborators of a session.
#[derive(Clone)]
pub struct SessionParts {
    pub store: PlaylistStore,
    pub metadata: Arc<dyn MetadataSource>,
    pub media: Arc<dyn MediaFactory>,
    pub hub: ShortcutHub,
    pub controller: ControllerConfig,
}

/// Tracks the active identifier, drives load sequences and the queue.
pub struct SessionController {
    playlist: Playlist,
    active: Option<MediaId>,
    surface: Surface,
    parts: SessionParts,
}

impl SessionController {
    /// Empty session; call [`SessionController::restore`] to load saved
    /// state.
    pub fn new(parts: SessionParts) -> Self {
        Self {
            playlist: Playlist::new(),
            active: None,
            surface: Surface::Empty,
            parts,
        }
    }

    /// Builds a session and restores the saved playlist, playing its first
    /// entry when there is one.
    pub async fn start(parts: SessionParts) -> Self {
        let mut session = Self::new(parts);
        session.restore().await;
        session
    }

    /// Reloads the saved playlist and plays its first entry.
    pub async fn restore(&mut self) {
        self.playlist = self.parts.store.load().await;
        info!("Restored playlist with {} entries", self.playlist.len());
        if let Some(first) = self.playlist.first().map(|entry| entry.id.clone()) {
            self.play_video(first).await;
        }
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn active(&self) -> Option<&MediaId> {
        self.active.as_ref()
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Bound controller, when the surface is ready.
    pub fn controller(&self) -> Option<&PlaybackController> {
        match &self.surface {
            Surface::Ready { controller, .. } => Some(controller),
            _ => None,
        }
    }

    pub fn controller_mut(&mut self) -> Option<&mut PlaybackController> {
        match &mut self.surface {
            Surface::Ready { controller, .. } => Some(controller),
            _ => None,
        }
    }

    /// Combined state of the surface and its controller.
    pub fn playback_state(&self) -> PlaybackState {
        match &self.surface {
            Surface::Empty => PlaybackState::Idle,
            Surface::Loading { .. } => PlaybackState::Loading,
            Surface::Failed { .. } => PlaybackState::Error,
            Surface::Ready { controller, .. } => controller.state(),
        }
    }

    /// Adds the identifier found in `raw_input` as newest (if absent) and
    /// plays it.
    ///
    /// # Errors
    /// - `SessionError::InvalidInput` - Blank input or no identifier found;
    ///   nothing is changed
    pub async fn load_video(&mut self, raw_input: &str) -> Result<(), SessionError> {
        let id = MediaId::extract(raw_input)?;

        let entry = PlaylistEntry::new(id.clone(), raw_input.trim());
        if self.playlist.insert_newest(entry) {
            self.persist().await;
        }

        self.play_video(id).await;
        Ok(())
    }

    /// Makes `id` active and runs its load sequence. Queue order is not
    /// touched.
    pub async fn play_video(&mut self, id: MediaId) {
        // Dropping the old surface disposes its shortcut listener.
        self.surface = Surface::Loading { id: id.clone() };
        self.active = Some(id.clone());

        let fetched = self.parts.metadata.video_info(&id).await;
        self.surface = match fetched {
            Ok(info) => self.build_ready(id, info),
            Err(e) => {
                warn!("Failed to load video {}: {}", id, e);
                Surface::Failed {
                    fallback_url: id.watch_url(),
                    id,
                }
            }
        };
    }

    fn build_ready(&self, id: MediaId, info: VideoInfo) -> Surface {
        let registration = match self.parts.hub.register() {
            Ok(registration) => registration,
            Err(e) => {
                warn!("Cannot bind player for {}: {}", id, e);
                return Surface::Failed {
                    fallback_url: id.watch_url(),
                    id,
                };
            }
        };

        let stream_url = self.parts.metadata.stream_url(&id);
        let surface = self.parts.media.create(&stream_url);
        let mut controller = PlaybackController::new(surface, registration, self.parts.controller);
        controller.sync();

        info!("Playing {} ({})", id, info.title);
        Surface::Ready {
            id,
            info,
            controller,
        }
    }

    /// Deletes `id`. Removing the active entry plays the new first entry,
    /// or resets to the empty placeholder.
    pub async fn remove_video(&mut self, id: &MediaId) {
        if self.playlist.remove(id).is_none() {
            return;
        }
        self.persist().await;

        if self.active.as_ref() != Some(id) {
            return;
        }
        match self.playlist.first().map(|entry| entry.id.clone()) {
            Some(next) => self.play_video(next).await,
            None => {
                self.surface = Surface::Empty;
                self.active = None;
            }
        }
    }

    /// Queue projection with the active row marked.
    pub fn render_playlist(&self) -> PlaylistView {
        self.playlist.render(self.active.as_ref())
    }

    /// Routes a key press to the controller owning the listener slot.
    pub fn handle_key(&mut self, input: KeyInput) -> bool {
        let hub = self.parts.hub.clone();
        match self.controller_mut() {
            Some(controller) if hub.is_active(controller.registration()) => {
                controller.handle_key(input)
            }
            _ => false,
        }
    }

    /// Applies pending media events of the bound controller.
    pub fn sync(&mut self) {
        if let Some(controller) = self.controller_mut() {
            controller.sync();
        }
    }

    async fn persist(&self) {
        if let Err(e) = self.parts.store.save(&self.playlist).await {
            warn!("Failed to save playlist: {}", e);
        }
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("entries", &self.playlist.len())
            .field("active", &self.active)
            .field("surface", &self.surface)
            .finish()
    }
}

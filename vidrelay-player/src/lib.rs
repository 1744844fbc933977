//! vidrelay player - headless client for the relay
//!
//! The client half of vidrelay without a rendering toolkit: a playback
//! controller bound to an abstract media element, the single shortcut
//! listener slot, control auto-hiding, the persisted playlist and the
//! session controller that ties them to the relay's metadata API.

pub mod autohide;
pub mod client;
pub mod controller;
pub mod media;
pub mod playlist;
pub mod session;
pub mod shortcuts;
pub mod storage;

#[cfg(test)]
mod test_support;

pub use client::{HttpMetadataClient, MetadataError, MetadataSource};
pub use controller::{
    ControllerConfig, ControlsView, DragState, PlayIcon, PlaybackController, PlaybackState,
    TrackBounds, format_readout, format_time,
};
pub use media::{FullscreenHost, MediaElement, MediaEvent, MediaFactory, MediaSurface};
pub use playlist::{Playlist, PlaylistEntry, PlaylistRow, PlaylistView};
pub use session::{SessionController, SessionError, SessionParts, Surface};
pub use shortcuts::{Key, KeyInput, ShortcutAction, ShortcutError, ShortcutHub, ShortcutRegistration};
pub use storage::{FileStore, KeyValueStore, MemoryStore, PlaylistStore, StorageError};

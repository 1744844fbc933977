//! Keyboard shortcuts and the process-wide listener slot.
//!
//! Only one player may listen for shortcuts at a time. A
//! [`ShortcutRegistration`] owns the slot and releases it on drop, so tearing
//! down a player surface disposes its listener without a separate step.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

/// Errors from the shortcut hub.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShortcutError {
    /// A listener is still registered.
    #[error("shortcut listener {active} is still registered")]
    AlreadyRegistered {
        /// Id of the live registration
        active: u64,
    },
}

/// Keys the player reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Space,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Char(char),
}

/// A key press together with where focus was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    /// Focus is inside a text input; shortcuts are suppressed
    pub in_text_input: bool,
}

impl KeyInput {
    /// Key pressed outside any text field.
    pub fn new(key: Key) -> Self {
        Self {
            key,
            in_text_input: false,
        }
    }

    /// Key pressed while typing into a text field.
    pub fn typed(key: Key) -> Self {
        Self {
            key,
            in_text_input: true,
        }
    }
}

/// Seek and volume steps applied by shortcuts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShortcutSteps {
    pub short_seek: Duration,
    pub long_seek: Duration,
    pub volume: f64,
}

impl Default for ShortcutSteps {
    fn default() -> Self {
        Self {
            short_seek: Duration::from_secs(5),
            long_seek: Duration::from_secs(10),
            volume: 0.1,
        }
    }
}

/// What a shortcut asks the controller to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShortcutAction {
    TogglePlay,
    /// Relative seek in seconds
    SeekBy(f64),
    /// Relative volume change
    VolumeBy(f64),
    ToggleMute,
    ToggleFullscreen,
}

impl ShortcutAction {
    /// Maps a key press to an action, `None` for unbound keys and for keys
    /// typed into text inputs.
    pub fn from_input(input: KeyInput, steps: &ShortcutSteps) -> Option<Self> {
        if input.in_text_input {
            return None;
        }

        let short = steps.short_seek.as_secs_f64();
        let long = steps.long_seek.as_secs_f64();
        let action = match input.key {
            Key::Space => Self::TogglePlay,
            Key::ArrowLeft => Self::SeekBy(-short),
            Key::ArrowRight => Self::SeekBy(short),
            Key::ArrowUp => Self::VolumeBy(steps.volume),
            Key::ArrowDown => Self::VolumeBy(-steps.volume),
            Key::Char(c) => match c.to_ascii_lowercase() {
                'k' => Self::TogglePlay,
                'j' => Self::SeekBy(-long),
                'l' => Self::SeekBy(long),
                'm' => Self::ToggleMute,
                'f' => Self::ToggleFullscreen,
                _ => return None,
            },
        };
        Some(action)
    }
}

#[derive(Debug, Default)]
struct HubState {
    active: Option<u64>,
    next_id: u64,
}

/// Process-wide slot for the single shortcut listener.
#[derive(Debug, Clone, Default)]
pub struct ShortcutHub {
    state: Arc<Mutex<HubState>>,
}

impl ShortcutHub {
    /// Creates an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the listener slot.
    ///
    /// # Errors
    /// - `ShortcutError::AlreadyRegistered` - Previous registration not yet dropped
    pub fn register(&self) -> Result<ShortcutRegistration, ShortcutError> {
        let mut state = self.state.lock();
        if let Some(active) = state.active {
            return Err(ShortcutError::AlreadyRegistered { active });
        }

        state.next_id += 1;
        let id = state.next_id;
        state.active = Some(id);
        debug!("Shortcut listener {} registered", id);

        Ok(ShortcutRegistration {
            id,
            hub: Arc::clone(&self.state),
        })
    }

    /// Id of the live registration, if any.
    pub fn active(&self) -> Option<u64> {
        self.state.lock().active
    }

    /// Whether `registration` currently owns the slot.
    pub fn is_active(&self, registration: &ShortcutRegistration) -> bool {
        self.active() == Some(registration.id)
    }
}

/// Owned listener registration; dropping it frees the slot.
#[derive(Debug)]
pub struct ShortcutRegistration {
    id: u64,
    hub: Arc<Mutex<HubState>>,
}

impl ShortcutRegistration {
    /// Registration id, unique per hub.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for ShortcutRegistration {
    fn drop(&mut self) {
        let mut state = self.hub.lock();
        if state.active == Some(self.id) {
            state.active = None;
            debug!("Shortcut listener {} disposed", self.id);
        }
    }
}

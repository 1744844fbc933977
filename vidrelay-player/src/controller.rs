//! Playback controller bound to a single media element.
//!
//! User intent and element events meet here. Commands go to the element
//! immediately; what the controls display follows the element's confirmed
//! state, except while the user drags the seek bar, when the drag position
//! is authoritative and element time updates are not rendered.

use std::time::Duration;

use tracing::{debug, warn};
use vidrelay_core::config::ClientConfig;

use crate::autohide::{HideTicket, HideTimer};
use crate::media::{FullscreenHost, MediaElement, MediaEvent, MediaSurface};
use crate::shortcuts::{KeyInput, ShortcutAction, ShortcutRegistration, ShortcutSteps};

/// An in-progress drag on the seek bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    /// Playback was running when the drag started
    pub was_playing: bool,
    /// Nothing had played yet when the drag started
    pub from_ready: bool,
    /// Last pointer position along the track, `[0, 1]`
    pub fraction: f64,
}

/// Lifecycle of the player surface.
///
/// `Idle`, `Loading` and `Error` before a surface exists are reported by
/// the session; a bound controller moves between the rest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackState {
    Idle,
    Loading,
    Ready,
    Playing,
    Paused,
    Seeking(DragState),
    Error,
}

/// Horizontal extent of the seek track in pointer coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackBounds {
    pub left: f64,
    pub width: f64,
}

impl TrackBounds {
    /// Pointer offset as a clamped fraction of the track.
    pub fn fraction(&self, pointer_x: f64) -> f64 {
        if self.width <= 0.0 || !pointer_x.is_finite() {
            return 0.0;
        }
        ((pointer_x - self.left) / self.width).clamp(0.0, 1.0)
    }
}

/// Icon on the play/pause control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayIcon {
    Play,
    Pause,
}

/// Everything the controls render.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlsView {
    pub icon: PlayIcon,
    /// Fill of the progress bar, `[0, 1]`
    pub progress: f64,
    /// `"{current} / {total}"`
    pub readout: String,
    /// Volume slider position, `0..=100`
    pub volume_slider: u8,
    pub muted: bool,
    pub fullscreen: bool,
    pub controls_visible: bool,
}

/// Tunables of a controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerConfig {
    pub steps: ShortcutSteps,
    pub hide_controls_after: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            steps: ShortcutSteps::default(),
            hide_controls_after: Duration::from_secs(2),
        }
    }
}

impl From<&ClientConfig> for ControllerConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            steps: ShortcutSteps {
                short_seek: config.short_seek,
                long_seek: config.long_seek,
                volume: config.volume_step,
            },
            hide_controls_after: config.hide_controls_after,
        }
    }
}

/// State machine over one media element.
pub struct PlaybackController {
    element: Box<dyn MediaElement>,
    fullscreen: Box<dyn FullscreenHost>,
    registration: ShortcutRegistration,
    state: PlaybackState,
    duration: Option<f64>,
    displayed_time: f64,
    volume: f64,
    restore_volume: f64,
    muted: bool,
    hide: HideTimer,
    pending_hide: Option<HideTicket>,
    steps: ShortcutSteps,
}

impl PlaybackController {
    /// Binds a controller to a fresh surface. `registration` is the
    /// shortcut listener this controller owns for its lifetime.
    pub fn new(
        surface: MediaSurface,
        registration: ShortcutRegistration,
        config: ControllerConfig,
    ) -> Self {
        let MediaSurface {
            element,
            fullscreen,
        } = surface;
        let volume = element.volume().clamp(0.0, 1.0);
        let muted = element.is_muted();

        Self {
            element,
            fullscreen,
            registration,
            state: PlaybackState::Ready,
            duration: None,
            displayed_time: 0.0,
            volume,
            restore_volume: if volume > 0.0 { volume } else { 1.0 },
            muted,
            hide: HideTimer::new(config.hide_controls_after),
            pending_hide: None,
            steps: config.steps,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Playback confirmed running.
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn is_seeking(&self) -> bool {
        matches!(self.state, PlaybackState::Seeking(_))
    }

    pub fn element(&self) -> &dyn MediaElement {
        self.element.as_ref()
    }

    pub fn registration(&self) -> &ShortcutRegistration {
        &self.registration
    }

    /// Applies every event the element fired since the last sync.
    pub fn sync(&mut self) {
        for event in self.element.drain_events() {
            self.apply_event(event);
        }
    }

    /// Applies one element event.
    pub fn apply_event(&mut self, event: MediaEvent) {
        let seeking = self.is_seeking();
        match event {
            MediaEvent::Play => {
                if !seeking && self.state != PlaybackState::Playing {
                    self.state = PlaybackState::Playing;
                    self.pending_hide = self.hide.activity(true);
                }
            }
            MediaEvent::Pause | MediaEvent::Ended => {
                if !seeking {
                    self.state = PlaybackState::Paused;
                }
                self.hide.force_visible();
            }
            MediaEvent::TimeUpdate(time) => {
                if !seeking && time.is_finite() {
                    self.displayed_time = time.max(0.0);
                }
            }
            MediaEvent::DurationChange(duration) => {
                if duration.is_finite() && duration > 0.0 {
                    self.duration = Some(duration);
                }
            }
            MediaEvent::VolumeChange { volume, muted } => {
                self.volume = volume.clamp(0.0, 1.0);
                if self.volume > 0.0 {
                    self.restore_volume = self.volume;
                }
                self.muted = muted;
            }
            MediaEvent::Error => {
                warn!("Media element reported an error for {}", self.element.source());
                self.state = PlaybackState::Error;
                self.hide.force_visible();
            }
        }
    }

    /// Play/pause control, media surface click and the `space`/`k` keys.
    pub fn toggle_play(&mut self) {
        match self.state {
            PlaybackState::Seeking(_) | PlaybackState::Error => {}
            PlaybackState::Playing => self.element.pause(),
            _ => self.element.play(),
        }
    }

    /// Pointer pressed on the seek track: start a drag and jump there.
    pub fn seek_pointer_down(&mut self, pointer_x: f64, bounds: TrackBounds) {
        if self.state == PlaybackState::Error {
            return;
        }
        let (was_playing, from_ready) = match self.state {
            PlaybackState::Seeking(drag) => (drag.was_playing, drag.from_ready),
            state => (
                state == PlaybackState::Playing,
                state == PlaybackState::Ready,
            ),
        };
        self.element.pause();
        self.state = PlaybackState::Seeking(DragState {
            was_playing,
            from_ready,
            fraction: 0.0,
        });
        self.drag_to(bounds.fraction(pointer_x));
    }

    /// Pointer moved while pressed.
    pub fn seek_pointer_move(&mut self, pointer_x: f64, bounds: TrackBounds) {
        if self.is_seeking() {
            self.drag_to(bounds.fraction(pointer_x));
        }
    }

    /// Pointer released: end the drag, resuming if playback was running.
    pub fn seek_pointer_up(&mut self) {
        let PlaybackState::Seeking(drag) = self.state else {
            return;
        };
        self.state = if drag.from_ready {
            PlaybackState::Ready
        } else {
            PlaybackState::Paused
        };
        if drag.was_playing {
            self.element.play();
        }
        debug!("Seek drag ended at {:.3}", drag.fraction);
    }

    fn drag_to(&mut self, fraction: f64) {
        if let PlaybackState::Seeking(drag) = &mut self.state {
            drag.fraction = fraction;
        }
        if let Some(duration) = self.duration {
            self.displayed_time = fraction * duration;
            self.element.set_current_time(self.displayed_time);
        }
    }

    /// Relative seek, clamped to `[0, duration]`.
    pub fn seek_by(&mut self, delta_seconds: f64) {
        if self.is_seeking() {
            return;
        }
        let mut target = (self.element.current_time() + delta_seconds).max(0.0);
        if let Some(duration) = self.duration {
            target = target.min(duration);
        }
        self.displayed_time = target;
        self.element.set_current_time(target);
    }

    /// Volume slider moved, `0..=100`.
    pub fn set_volume_slider(&mut self, value: u8) {
        self.set_volume(f64::from(value.min(100)) / 100.0);
    }

    /// Relative volume change, clamped to `[0, 1]`.
    pub fn adjust_volume(&mut self, delta: f64) {
        self.set_volume(self.volume + delta);
    }

    fn set_volume(&mut self, volume: f64) {
        let volume = volume.clamp(0.0, 1.0);
        self.volume = volume;
        self.element.set_volume(volume);
        if volume > 0.0 {
            self.restore_volume = volume;
            if self.muted {
                self.muted = false;
                self.element.set_muted(false);
            }
        }
    }

    /// Mute control and the `m` key.
    pub fn toggle_mute(&mut self) {
        if self.muted {
            self.muted = false;
            self.volume = self.restore_volume;
            self.element.set_volume(self.volume);
            self.element.set_muted(false);
        } else {
            self.muted = true;
            self.element.set_muted(true);
        }
    }

    /// Fullscreen control and the `f` key.
    pub fn toggle_fullscreen(&mut self) {
        if self.fullscreen.is_fullscreen() {
            self.fullscreen.exit_fullscreen();
        } else {
            self.fullscreen.request_fullscreen();
        }
    }

    /// Routes a key press. Returns whether it was bound.
    pub fn handle_key(&mut self, input: KeyInput) -> bool {
        let Some(action) = ShortcutAction::from_input(input, &self.steps) else {
            return false;
        };
        match action {
            ShortcutAction::TogglePlay => self.toggle_play(),
            ShortcutAction::SeekBy(delta) => self.seek_by(delta),
            ShortcutAction::VolumeBy(delta) => self.adjust_volume(delta),
            ShortcutAction::ToggleMute => self.toggle_mute(),
            ShortcutAction::ToggleFullscreen => self.toggle_fullscreen(),
        }
        true
    }

    /// Pointer moved over the player. Schedule the returned ticket and pass
    /// it to [`PlaybackController::hide_ticket_fired`] when it elapses.
    pub fn pointer_activity(&mut self) -> Option<HideTicket> {
        self.pending_hide = None;
        let playing = self.is_playing();
        self.hide.activity(playing)
    }

    /// Ticket armed when playback started without pointer activity, e.g.
    /// from the keyboard or autoplay. Schedule it like one from
    /// [`PlaybackController::pointer_activity`].
    pub fn take_hide_ticket(&mut self) -> Option<HideTicket> {
        self.pending_hide.take()
    }

    /// A hide ticket elapsed. Returns whether the controls were hidden.
    pub fn hide_ticket_fired(&mut self, ticket: HideTicket) -> bool {
        let playing = self.is_playing();
        self.hide.fire(ticket, playing)
    }

    /// Current projection for the controls.
    pub fn view(&self) -> ControlsView {
        let progress = match (self.state, self.duration) {
            (PlaybackState::Seeking(drag), _) => drag.fraction,
            (_, Some(duration)) => (self.displayed_time / duration).clamp(0.0, 1.0),
            (_, None) => 0.0,
        };
        let volume_slider = if self.muted {
            0
        } else {
            (self.volume * 100.0).round() as u8
        };

        ControlsView {
            icon: if self.is_playing() {
                PlayIcon::Pause
            } else {
                PlayIcon::Play
            },
            progress,
            readout: format_readout(self.displayed_time, self.duration),
            volume_slider,
            muted: self.muted,
            fullscreen: self.fullscreen.is_fullscreen(),
            controls_visible: self.hide.is_visible(),
        }
    }
}

impl std::fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("source", &self.element.source())
            .field("state", &self.state)
            .field("duration", &self.duration)
            .field("displayed_time", &self.displayed_time)
            .field("registration", &self.registration.id())
            .finish()
    }
}

/// Formats seconds as `m:ss`, or `h:mm:ss` from one hour up.
///
/// Negative and non-finite values render as `0:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }
    let total = seconds.floor() as u64;
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

/// `"{current} / {total}"`.
pub fn format_readout(current: f64, duration: Option<f64>) -> String {
    format!(
        "{} / {}",
        format_time(current),
        format_time(duration.unwrap_or(0.0))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shortcuts::{Key, ShortcutHub};
    use crate::test_support::FakeElement;

    const TRACK: TrackBounds = TrackBounds {
        left: 100.0,
        width: 200.0,
    };

    fn controller() -> (PlaybackController, FakeElement) {
        let (surface, element) = FakeElement::surface("http://relay/api/stream/dQw4w9WgXcQ");
        let hub = ShortcutHub::new();
        let registration = hub.register().unwrap();
        let mut controller =
            PlaybackController::new(surface, registration, ControllerConfig::default());
        controller.apply_event(MediaEvent::DurationChange(200.0));
        (controller, element)
    }

    fn playing() -> (PlaybackController, FakeElement) {
        let (mut controller, element) = controller();
        controller.toggle_play();
        controller.sync();
        assert_eq!(controller.state(), PlaybackState::Playing);
        (controller, element)
    }

    #[test]
    fn test_icon_follows_confirmed_state() {
        let (mut controller, _element) = controller();
        controller.toggle_play();

        // Requested but not confirmed yet
        assert_eq!(controller.view().icon, PlayIcon::Play);
        controller.sync();
        assert_eq!(controller.view().icon, PlayIcon::Pause);
    }

    #[test]
    fn test_drag_ignores_time_updates_and_resumes() {
        let (mut controller, element) = playing();

        controller.seek_pointer_down(150.0, TRACK);
        assert!(controller.is_seeking());
        assert!(element.is_paused());
        assert_eq!(element.current_time(), 50.0);

        controller.seek_pointer_move(250.0, TRACK);
        controller.apply_event(MediaEvent::TimeUpdate(3.0));
        controller.sync();

        let view = controller.view();
        assert_eq!(view.progress, 0.75);
        assert_eq!(view.readout, "2:30 / 3:20");

        controller.seek_pointer_up();
        controller.sync();
        assert_eq!(element.current_time(), 150.0);
        assert_eq!(controller.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_drag_from_ready_returns_to_ready() {
        let (mut controller, element) = controller();
        controller.seek_pointer_down(300.0, TRACK);
        controller.seek_pointer_up();
        controller.sync();

        assert_eq!(controller.state(), PlaybackState::Ready);
        assert!(element.is_paused());
        assert_eq!(element.current_time(), 200.0);
    }

    #[test]
    fn test_drag_from_paused_stays_paused() {
        let (mut controller, element) = playing();
        controller.toggle_play();
        controller.sync();
        assert_eq!(controller.state(), PlaybackState::Paused);

        controller.seek_pointer_down(200.0, TRACK);
        controller.seek_pointer_move(150.0, TRACK);
        controller.seek_pointer_up();
        controller.sync();

        assert_eq!(controller.state(), PlaybackState::Paused);
        assert!(element.is_paused());
        assert_eq!(element.current_time(), 50.0);
    }

    #[test]
    fn test_pointer_outside_track_clamps() {
        let (mut controller, element) = controller();
        controller.seek_pointer_down(0.0, TRACK);
        assert_eq!(element.current_time(), 0.0);
        controller.seek_pointer_move(1000.0, TRACK);
        assert_eq!(element.current_time(), 200.0);
    }

    #[test]
    fn test_time_updates_render_outside_drag() {
        let (mut controller, _element) = controller();
        controller.apply_event(MediaEvent::TimeUpdate(50.0));
        let view = controller.view();
        assert_eq!(view.progress, 0.25);
        assert_eq!(view.readout, "0:50 / 3:20");
    }

    #[test]
    fn test_keyboard_seek_clamps_to_duration() {
        let (mut controller, element) = controller();
        controller.handle_key(KeyInput::new(Key::ArrowLeft));
        assert_eq!(element.current_time(), 0.0);

        element.set_time(195.0);
        controller.handle_key(KeyInput::new(Key::Char('l')));
        assert_eq!(element.current_time(), 200.0);

        element.set_time(100.0);
        controller.handle_key(KeyInput::new(Key::Char('j')));
        assert_eq!(element.current_time(), 90.0);
    }

    #[test]
    fn test_volume_keys_clamp() {
        let (mut controller, element) = controller();
        controller.handle_key(KeyInput::new(Key::ArrowUp));
        assert_eq!(element.volume(), 1.0);

        for _ in 0..15 {
            controller.handle_key(KeyInput::new(Key::ArrowDown));
        }
        assert_eq!(element.volume(), 0.0);
        assert_eq!(controller.view().volume_slider, 0);
    }

    #[test]
    fn test_mute_drives_slider_and_restores() {
        let (mut controller, element) = controller();
        controller.set_volume_slider(40);

        controller.toggle_mute();
        assert!(element.is_muted());
        assert_eq!(controller.view().volume_slider, 0);

        controller.toggle_mute();
        assert!(!element.is_muted());
        assert_eq!(controller.view().volume_slider, 40);
    }

    #[test]
    fn test_volume_key_while_muted_steps_from_stored_volume() {
        let (mut controller, element) = controller();
        controller.set_volume_slider(80);
        controller.toggle_mute();

        controller.handle_key(KeyInput::new(Key::ArrowUp));
        assert!(!element.is_muted());
        assert!((element.volume() - 0.9).abs() < 1e-9);
        assert_eq!(controller.view().volume_slider, 90);

        controller.toggle_mute();
        controller.handle_key(KeyInput::new(Key::ArrowDown));
        assert!(!controller.view().muted);
        assert!((element.volume() - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_slider_above_zero_unmutes() {
        let (mut controller, element) = controller();
        controller.toggle_mute();
        controller.set_volume_slider(70);

        assert!(!element.is_muted());
        assert!(!controller.view().muted);
        assert_eq!(element.volume(), 0.7);
    }

    #[test]
    fn test_fullscreen_toggles_container() {
        let (mut controller, element) = controller();
        controller.handle_key(KeyInput::new(Key::Char('f')));
        assert!(element.is_fullscreen());
        assert!(controller.view().fullscreen);
        controller.toggle_fullscreen();
        assert!(!element.is_fullscreen());
    }

    #[test]
    fn test_keys_in_text_inputs_are_ignored() {
        let (mut controller, element) = controller();
        assert!(!controller.handle_key(KeyInput::typed(Key::Space)));
        controller.sync();
        assert!(element.is_paused());
    }

    #[test]
    fn test_controls_hide_only_while_playing() {
        let (mut controller, _element) = playing();
        let ticket = controller.pointer_activity().unwrap();
        assert!(controller.hide_ticket_fired(ticket));
        assert!(!controller.view().controls_visible);

        let ticket = controller.pointer_activity().unwrap();
        controller.toggle_play();
        controller.sync();
        assert!(controller.view().controls_visible);
        assert!(!controller.hide_ticket_fired(ticket));
    }

    #[test]
    fn test_keyboard_play_arms_hide_ticket() {
        let (mut controller, _element) = controller();
        assert!(controller.pointer_activity().is_none());

        controller.handle_key(KeyInput::new(Key::Char('k')));
        controller.sync();
        assert!(controller.is_playing());

        let ticket = controller.take_hide_ticket().unwrap();
        assert!(controller.take_hide_ticket().is_none());
        assert!(controller.hide_ticket_fired(ticket));
        assert!(!controller.view().controls_visible);
    }

    #[test]
    fn test_pointer_activity_supersedes_play_ticket() {
        let (mut controller, _element) = controller();
        controller.toggle_play();
        controller.sync();

        let armed = controller.take_hide_ticket().unwrap();
        let fresh = controller.pointer_activity().unwrap();
        assert!(!controller.hide_ticket_fired(armed));
        assert!(controller.view().controls_visible);
        assert!(controller.hide_ticket_fired(fresh));
    }

    #[test]
    fn test_element_error_enters_error_state() {
        let (mut controller, _element) = controller();
        controller.apply_event(MediaEvent::Error);
        assert_eq!(controller.state(), PlaybackState::Error);
        controller.toggle_play();
        assert_eq!(controller.state(), PlaybackState::Error);
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(59.9), "0:59");
        assert_eq!(format_time(213.0), "3:33");
        assert_eq!(format_time(3600.0), "1:00:00");
        assert_eq!(format_time(3725.0), "1:02:05");
        assert_eq!(format_time(f64::NAN), "0:00");
        assert_eq!(format_time(f64::INFINITY), "0:00");
        assert_eq!(format_readout(5.0, None), "0:05 / 0:00");
    }
}

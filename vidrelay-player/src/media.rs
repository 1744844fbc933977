//! Seams between the controller and the platform media element.
//!
//! The controller never owns playback itself. It issues commands to a
//! [`MediaElement`] and learns what actually happened from the
//! [`MediaEvent`]s the element reports back, in order.

/// Events a media element reports after the fact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaEvent {
    /// Playback actually started
    Play,
    /// Playback actually paused
    Pause,
    /// Playback reached the end
    Ended,
    /// Playback position moved, in seconds
    TimeUpdate(f64),
    /// Total duration became known or changed, in seconds
    DurationChange(f64),
    /// Volume or mute flag changed
    VolumeChange {
        /// Current volume in `[0, 1]`
        volume: f64,
        /// Current mute flag
        muted: bool,
    },
    /// The element failed to load or decode the stream
    Error,
}

/// Commands accepted by a bound media element.
///
/// Commands are requests; their outcome arrives as events from
/// [`MediaElement::drain_events`].
pub trait MediaElement: Send {
    /// Stream URL the element is bound to.
    fn source(&self) -> &str;

    /// Requests playback.
    fn play(&mut self);

    /// Requests a pause.
    fn pause(&mut self);

    /// Whether the element is currently paused.
    fn is_paused(&self) -> bool;

    /// Current playback position in seconds.
    fn current_time(&self) -> f64;

    /// Moves the playback position. The element issues a ranged request.
    fn set_current_time(&mut self, seconds: f64);

    /// Total duration in seconds, once metadata has loaded.
    fn duration(&self) -> Option<f64>;

    /// Current volume in `[0, 1]`.
    fn volume(&self) -> f64;

    /// Sets the volume, `[0, 1]`.
    fn set_volume(&mut self, volume: f64);

    /// Whether audio is muted.
    fn is_muted(&self) -> bool;

    /// Sets the mute flag.
    fn set_muted(&mut self, muted: bool);

    /// Takes the events fired since the last call, oldest first.
    fn drain_events(&mut self) -> Vec<MediaEvent>;
}

/// The container that can enter and leave fullscreen.
pub trait FullscreenHost: Send {
    /// Whether the container is currently fullscreen.
    fn is_fullscreen(&self) -> bool;

    /// Requests fullscreen on the container.
    fn request_fullscreen(&mut self);

    /// Leaves fullscreen.
    fn exit_fullscreen(&mut self);
}

/// A freshly created player surface for one stream.
pub struct MediaSurface {
    pub element: Box<dyn MediaElement>,
    pub fullscreen: Box<dyn FullscreenHost>,
}

/// Creates player surfaces bound to stream URLs.
pub trait MediaFactory: Send + Sync {
    /// Builds an element (with autoplay requested) for `stream_url`.
    fn create(&self, stream_url: &str) -> MediaSurface;
}

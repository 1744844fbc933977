//! Media element that plays on a virtual clock.
//!
//! Nothing is decoded. Time moves only when the test calls
//! [`SimulatedMediaElement::advance`], which makes end-of-stream and
//! progress updates deterministic.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;
use vidrelay_player::{FullscreenHost, MediaElement, MediaEvent, MediaFactory, MediaSurface};

#[derive(Debug)]
struct ElementState {
    paused: bool,
    time: f64,
    duration: Option<f64>,
    volume: f64,
    muted: bool,
    fullscreen: bool,
    seeks: Vec<f64>,
    events: Vec<MediaEvent>,
}

impl ElementState {
    fn emit(&mut self, event: MediaEvent) {
        self.events.push(event);
    }
}

/// Handle to a simulated element. Clones share state.
#[derive(Debug, Clone)]
pub struct SimulatedMediaElement {
    source: Arc<str>,
    state: Arc<Mutex<ElementState>>,
}

impl SimulatedMediaElement {
    /// Paused element for `source`. A known duration is reported as an
    /// initial `DurationChange`.
    pub fn new(source: &str, duration: Option<f64>) -> Self {
        let mut events = Vec::new();
        if let Some(duration) = duration {
            events.push(MediaEvent::DurationChange(duration));
        }
        Self {
            source: Arc::from(source),
            state: Arc::new(Mutex::new(ElementState {
                paused: true,
                time: 0.0,
                duration,
                volume: 1.0,
                muted: false,
                fullscreen: false,
                seeks: Vec::new(),
                events,
            })),
        }
    }

    /// Moves the clock forward while playing. Reaching the duration pauses
    /// and reports `Ended`.
    pub fn advance(&self, seconds: f64) {
        let mut state = self.state.lock();
        if state.paused {
            return;
        }

        let mut time = state.time + seconds;
        let ended = state.duration.is_some_and(|d| time >= d);
        if let Some(duration) = state.duration {
            time = time.min(duration);
        }
        state.time = time;
        state.emit(MediaEvent::TimeUpdate(time));
        if ended {
            state.paused = true;
            state.emit(MediaEvent::Pause);
            state.emit(MediaEvent::Ended);
        }
    }

    /// Reports a load or decode failure.
    pub fn fail(&self) {
        let mut state = self.state.lock();
        state.paused = true;
        state.emit(MediaEvent::Error);
    }

    /// Positions requested through `set_current_time`, in order.
    pub fn seeks(&self) -> Vec<f64> {
        self.state.lock().seeks.clone()
    }

    pub fn source_url(&self) -> String {
        self.source.to_string()
    }
}

impl MediaElement for SimulatedMediaElement {
    fn source(&self) -> &str {
        &self.source
    }

    fn play(&mut self) {
        let mut state = self.state.lock();
        if state.paused {
            state.paused = false;
            state.emit(MediaEvent::Play);
        }
    }

    fn pause(&mut self) {
        let mut state = self.state.lock();
        if !state.paused {
            state.paused = true;
            state.emit(MediaEvent::Pause);
        }
    }

    fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    fn current_time(&self) -> f64 {
        self.state.lock().time
    }

    fn set_current_time(&mut self, seconds: f64) {
        let mut state = self.state.lock();
        let upper = state.duration.unwrap_or(f64::MAX);
        let time = seconds.clamp(0.0, upper);
        state.time = time;
        state.seeks.push(time);
        state.emit(MediaEvent::TimeUpdate(time));
    }

    fn duration(&self) -> Option<f64> {
        self.state.lock().duration
    }

    fn volume(&self) -> f64 {
        self.state.lock().volume
    }

    fn set_volume(&mut self, volume: f64) {
        let mut state = self.state.lock();
        state.volume = volume.clamp(0.0, 1.0);
        let (volume, muted) = (state.volume, state.muted);
        state.emit(MediaEvent::VolumeChange { volume, muted });
    }

    fn is_muted(&self) -> bool {
        self.state.lock().muted
    }

    fn set_muted(&mut self, muted: bool) {
        let mut state = self.state.lock();
        state.muted = muted;
        let volume = state.volume;
        state.emit(MediaEvent::VolumeChange { volume, muted });
    }

    fn drain_events(&mut self) -> Vec<MediaEvent> {
        std::mem::take(&mut self.state.lock().events)
    }
}

impl FullscreenHost for SimulatedMediaElement {
    fn is_fullscreen(&self) -> bool {
        self.state.lock().fullscreen
    }

    fn request_fullscreen(&mut self) {
        self.state.lock().fullscreen = true;
    }

    fn exit_fullscreen(&mut self) {
        self.state.lock().fullscreen = false;
    }
}

/// Creates autoplaying simulated elements and keeps handles to them.
#[derive(Debug, Clone, Default)]
pub struct SimulatedMediaFactory {
    duration: Option<f64>,
    created: Arc<Mutex<Vec<SimulatedMediaElement>>>,
}

impl SimulatedMediaFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Duration every created element reports.
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    /// All elements created so far, oldest first.
    pub fn created(&self) -> Vec<SimulatedMediaElement> {
        self.created.lock().clone()
    }

    /// Most recently created element.
    pub fn last(&self) -> Option<SimulatedMediaElement> {
        self.created.lock().last().cloned()
    }
}

impl MediaFactory for SimulatedMediaFactory {
    fn create(&self, stream_url: &str) -> MediaSurface {
        debug!("Creating simulated element for {}", stream_url);
        let element = SimulatedMediaElement::new(stream_url, self.duration);
        let mut surface = MediaSurface {
            element: Box::new(element.clone()),
            fullscreen: Box::new(element.clone()),
        };
        surface.element.play();
        self.created.lock().push(element);
        surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_reaches_end() {
        let mut element = SimulatedMediaElement::new("sim", Some(10.0));
        element.play();
        element.advance(4.0);
        element.advance(20.0);

        let events = element.drain_events();
        assert_eq!(
            events,
            vec![
                MediaEvent::DurationChange(10.0),
                MediaEvent::Play,
                MediaEvent::TimeUpdate(4.0),
                MediaEvent::TimeUpdate(10.0),
                MediaEvent::Pause,
                MediaEvent::Ended,
            ]
        );
        assert!(element.is_paused());
    }

    #[test]
    fn test_paused_clock_does_not_move() {
        let element = SimulatedMediaElement::new("sim", None);
        element.advance(5.0);
        assert_eq!(element.current_time(), 0.0);
    }

    #[test]
    fn test_seek_is_clamped_to_duration() {
        let mut element = SimulatedMediaElement::new("sim", Some(30.0));
        element.set_current_time(45.0);
        element.set_current_time(-2.0);
        assert_eq!(element.seeks(), vec![30.0, 0.0]);
    }

    #[test]
    fn test_factory_autoplays() {
        let factory = SimulatedMediaFactory::new().with_duration(60.0);
        let surface = factory.create("http://relay/api/stream/dQw4w9WgXcQ");

        assert!(!surface.element.is_paused());
        assert_eq!(factory.created().len(), 1);
        assert_eq!(
            factory.last().unwrap().source_url(),
            "http://relay/api/stream/dQw4w9WgXcQ"
        );
    }
}

//! Shared fakes for unit tests.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::media::{FullscreenHost, MediaElement, MediaEvent, MediaFactory, MediaSurface};

#[derive(Debug)]
struct FakeState {
    paused: bool,
    time: f64,
    volume: f64,
    muted: bool,
    fullscreen: bool,
    events: Vec<MediaEvent>,
}

/// Element that confirms every state change with the matching event.
#[derive(Debug, Clone)]
pub struct FakeElement {
    source: Arc<str>,
    state: Arc<Mutex<FakeState>>,
}

impl FakeElement {
    pub fn surface(source: &str) -> (MediaSurface, FakeElement) {
        let element = FakeElement {
            source: Arc::from(source),
            state: Arc::new(Mutex::new(FakeState {
                paused: true,
                time: 0.0,
                volume: 1.0,
                muted: false,
                fullscreen: false,
                events: Vec::new(),
            })),
        };
        let surface = MediaSurface {
            element: Box::new(element.clone()),
            fullscreen: Box::new(element.clone()),
        };
        (surface, element)
    }

    pub fn set_time(&self, seconds: f64) {
        self.state.lock().time = seconds;
    }

    pub fn source_url(&self) -> String {
        self.source.to_string()
    }
}

impl MediaElement for FakeElement {
    fn source(&self) -> &str {
        &self.source
    }

    fn play(&mut self) {
        let mut state = self.state.lock();
        if state.paused {
            state.paused = false;
            state.events.push(MediaEvent::Play);
        }
    }

    fn pause(&mut self) {
        let mut state = self.state.lock();
        if !state.paused {
            state.paused = true;
            state.events.push(MediaEvent::Pause);
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
        state.time = seconds;
        state.events.push(MediaEvent::TimeUpdate(seconds));
    }

    fn duration(&self) -> Option<f64> {
        None
    }

    fn volume(&self) -> f64 {
        self.state.lock().volume
    }

    fn set_volume(&mut self, volume: f64) {
        let mut state = self.state.lock();
        state.volume = volume;
        let muted = state.muted;
        state.events.push(MediaEvent::VolumeChange { volume, muted });
    }

    fn is_muted(&self) -> bool {
        self.state.lock().muted
    }

    fn set_muted(&mut self, muted: bool) {
        let mut state = self.state.lock();
        state.muted = muted;
        let volume = state.volume;
        state.events.push(MediaEvent::VolumeChange { volume, muted });
    }

    fn drain_events(&mut self) -> Vec<MediaEvent> {
        std::mem::take(&mut self.state.lock().events)
    }
}

impl FullscreenHost for FakeElement {
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

/// Factory remembering every element it created.
#[derive(Debug, Clone, Default)]
pub struct FakeFactory {
    created: Arc<Mutex<Vec<FakeElement>>>,
}

impl FakeFactory {
    pub fn created(&self) -> Vec<FakeElement> {
        self.created.lock().clone()
    }

    pub fn last(&self) -> Option<FakeElement> {
        self.created.lock().last().cloned()
    }
}

impl MediaFactory for FakeFactory {
    fn create(&self, stream_url: &str) -> MediaSurface {
        let (mut surface, element) = FakeElement::surface(stream_url);
        surface.element.play();
        self.created.lock().push(element);
        surface
    }
}

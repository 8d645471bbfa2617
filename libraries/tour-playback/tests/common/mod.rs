//! Shared test helpers
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};
use tour_playback::{
    BackendEvent, BackendMessage, EngineConfig, KeyValueStore, MediaBackend, NotificationKind,
    Notifier, PlaybackSession, Quality, RequestId, Track,
};

static INIT: Once = Once::new();

/// Initialize logging once per test binary
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// Call made by the engine on the media backend
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Load {
        request: RequestId,
        locator: String,
        quality: Quality,
    },
    Play(RequestId),
    Pause,
    Seek(f64),
    SetVolume(f32),
    SetRate(f32),
}

/// Mock backend that only records what it was asked to do
#[derive(Clone, Default)]
pub struct RecordingBackend {
    calls: Arc<Mutex<Vec<BackendCall>>>,
}

impl RecordingBackend {
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn pause_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, BackendCall::Pause))
            .count()
    }

    /// Load requests in call order
    pub fn loads(&self) -> Vec<(RequestId, String, Quality)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::Load {
                    request,
                    locator,
                    quality,
                } => Some((request, locator, quality)),
                _ => None,
            })
            .collect()
    }

    /// Play requests in call order
    pub fn plays(&self) -> Vec<RequestId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::Play(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    pub fn last_volume(&self) -> Option<f32> {
        self.calls().into_iter().rev().find_map(|call| match call {
            BackendCall::SetVolume(volume) => Some(volume),
            _ => None,
        })
    }

    pub fn last_rate(&self) -> Option<f32> {
        self.calls().into_iter().rev().find_map(|call| match call {
            BackendCall::SetRate(rate) => Some(rate),
            _ => None,
        })
    }

    fn record(&self, call: BackendCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl MediaBackend for RecordingBackend {
    fn load(&mut self, request: RequestId, locator: &str, quality: Quality) {
        self.record(BackendCall::Load {
            request,
            locator: locator.to_string(),
            quality,
        });
    }

    fn play(&mut self, request: RequestId) {
        self.record(BackendCall::Play(request));
    }

    fn pause(&mut self) {
        self.record(BackendCall::Pause);
    }

    fn seek(&mut self, position: f64) {
        self.record(BackendCall::Seek(position));
    }

    fn set_volume(&mut self, volume: f32) {
        self.record(BackendCall::SetVolume(volume));
    }

    fn set_rate(&mut self, rate: f32) {
        self.record(BackendCall::SetRate(rate));
    }
}

/// Notifier that collects notifications
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    notifications: Arc<Mutex<Vec<(NotificationKind, String)>>>,
}

impl RecordingNotifier {
    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.notifications
            .lock()
            .unwrap()
            .iter()
            .map(|(kind, _)| *kind)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) {
        self.notifications
            .lock()
            .unwrap()
            .push((kind, message.to_string()));
    }
}

/// Key-value store whose contents stay inspectable after being handed over
#[derive(Clone, Default)]
pub struct SharedStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl SharedStore {
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }
}

impl KeyValueStore for SharedStore {
    fn get(&self, key: &str) -> Option<String> {
        self.raw(key)
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.lock().unwrap().insert(key.to_string(), value);
    }
}

pub fn create_test_track(id: &str) -> Track {
    Track::new(
        id,
        format!("https://cdn.example.com/{id}.mp3"),
        format!("Stop {id}"),
    )
}

pub fn create_session() -> (PlaybackSession, RecordingBackend, RecordingNotifier) {
    create_session_with(EngineConfig::default())
}

pub fn create_session_with(
    config: EngineConfig,
) -> (PlaybackSession, RecordingBackend, RecordingNotifier) {
    init_tracing();
    let backend = RecordingBackend::default();
    let notifier = RecordingNotifier::default();
    let session = PlaybackSession::new(
        &config,
        Box::new(backend.clone()),
        Box::new(notifier.clone()),
    );
    (session, backend, notifier)
}

/// Deliver a backend event for the session's current load attempt
pub fn deliver(session: &mut PlaybackSession, event: BackendEvent) {
    let request = session.current_request();
    session.handle_backend_message(BackendMessage::new(request, event));
}

/// Load a track and drive it to `Playing`
pub fn start_playing(session: &mut PlaybackSession, track: Track, duration: f64) {
    session.load_and_play(track);
    deliver(session, BackendEvent::Ready { duration });
    deliver(session, BackendEvent::PlayStarted);
}

pub fn tick(session: &mut PlaybackSession, position: f64) {
    deliver(
        session,
        BackendEvent::Tick {
            position,
            duration: None,
        },
    );
}

pub fn ids(tracks: &[&Track]) -> Vec<String> {
    tracks.iter().map(|t| t.id.clone()).collect()
}

//! Media backend capability
//!
//! The engine never decodes audio itself. The embedding platform (browser
//! audio element, native player, simulated backend in tests) implements
//! [`MediaBackend`] and reports back through a [`BackendEventSender`].

use crate::types::{Quality, RequestId};
use tokio::sync::mpsc;

/// Platform media player driven by the engine
///
/// All calls are fire-and-forget. Anything that completes later (load,
/// play) is reported as a [`BackendMessage`] tagged with the request id it
/// was issued for. Volume and rate must be safe to set at any time, even
/// before a source is loaded.
pub trait MediaBackend: Send {
    /// Start resolving/buffering a source
    ///
    /// Completion is reported as [`BackendEvent::Ready`] or
    /// [`BackendEvent::Error`].
    fn load(&mut self, request: RequestId, locator: &str, quality: Quality);

    /// Request playback of the loaded source
    ///
    /// May be refused by the platform; the outcome is reported as
    /// [`BackendEvent::PlayStarted`] or [`BackendEvent::PlayRejected`].
    fn play(&mut self, request: RequestId);

    /// Pause playback (assumed to never fail)
    fn pause(&mut self);

    /// Seek to a position, in seconds
    fn seek(&mut self, position: f64);

    /// Set output volume in `[0, 1]` (already accounts for mute)
    fn set_volume(&mut self, volume: f32);

    /// Set playback rate (1.0 = normal speed)
    fn set_rate(&mut self, rate: f32);
}

/// Event reported by the media backend
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    /// Source loaded; duration in seconds (0 if unknown)
    Ready { duration: f64 },

    /// A play request succeeded
    PlayStarted,

    /// A play request was refused
    PlayRejected(String),

    /// Periodic position report while playing
    Tick {
        position: f64,
        /// Updated duration, when the backend learns it late
        duration: Option<f64>,
    },

    /// Playback reached the end of the source
    Ended,

    /// Source could not be loaded or playback broke down
    Error(String),
}

/// Backend event tagged with the load attempt it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct BackendMessage {
    pub request: RequestId,
    pub event: BackendEvent,
}

impl BackendMessage {
    pub fn new(request: RequestId, event: BackendEvent) -> Self {
        Self { request, event }
    }
}

/// Sending half handed to the backend implementation
pub type BackendEventSender = mpsc::UnboundedSender<BackendMessage>;

/// Receiving half handed to the engine
pub type BackendEventReceiver = mpsc::UnboundedReceiver<BackendMessage>;

/// Create the channel a backend uses to report events to the engine
pub fn backend_channel() -> (BackendEventSender, BackendEventReceiver) {
    mpsc::unbounded_channel()
}

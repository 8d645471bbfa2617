//! Tour Playback - Audio Playback Engine
//!
//! Platform-agnostic playback engine for audio tours.
//!
//! This crate provides:
//! - A single playback session with an explicit state machine
//!   (Idle, Loading, Playing, Paused, Ended, Error)
//! - FIFO queue with optional autoplay continuation
//! - Bounded, deduplicated playback history (default 20 tracks)
//! - Per-track and per-tour progress tracking
//! - Sleep timer that pauses playback on expiry
//! - Volume (0.0-1.0, mute/unmute) and playback rate control
//! - Persistence hooks for settings and progress
//!
//! # Architecture
//!
//! `tour-playback` never decodes audio:
//! - The platform player is a [`MediaBackend`] driven by the engine
//! - Backend completions come back as [`BackendMessage`]s tagged with the
//!   load attempt they belong to, so superseded loads are ignored
//! - Failures reach the user through a [`Notifier`]
//! - Durable storage is any [`KeyValueStore`]
//!
//! [`PlaybackSession`] is the synchronous state machine;
//! [`PlaybackEngine`] runs it in a tokio task and exposes a
//! [`PlaybackHandle`] plus an observable [`PlaybackSnapshot`].
//!
//! # Example: Engine Setup
//!
//! ```rust,no_run
//! use tour_playback::{
//!     backend_channel, EngineConfig, MediaBackend, PlaybackEngine, Quality, RequestId, Track,
//! };
//!
//! struct SilentBackend;
//!
//! impl MediaBackend for SilentBackend {
//!     fn load(&mut self, _request: RequestId, _locator: &str, _quality: Quality) {}
//!     fn play(&mut self, _request: RequestId) {}
//!     fn pause(&mut self) {}
//!     fn seek(&mut self, _position: f64) {}
//!     fn set_volume(&mut self, _volume: f32) {}
//!     fn set_rate(&mut self, _rate: f32) {}
//! }
//!
//! # async fn run() -> tour_playback::Result<()> {
//! // The backend keeps `events_tx` to report readiness, ticks and errors
//! let (_events_tx, events_rx) = backend_channel();
//!
//! let engine = PlaybackEngine::builder(EngineConfig::default(), SilentBackend, events_rx)
//!     .start()?;
//! let player = engine.handle();
//!
//! player.load_and_play(
//!     Track::new("gate", "https://cdn.example.com/gate.mp3", "Main Gate").with_tour("old-town"),
//! )?;
//! player.set_volume(0.8)?;
//! player.start_sleep_timer(30)?;
//!
//! let snapshot = player.snapshot();
//! println!("{} {:.0}%", snapshot.state, snapshot.progress_percent);
//!
//! engine.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
mod engine;
mod error;
pub mod events;
mod history;
pub mod notify;
mod progress;
mod queue;
mod session;
mod sleep_timer;
mod snapshot;
pub mod store;
pub mod types;

// Public exports
pub use backend::{
    backend_channel, BackendEvent, BackendEventReceiver, BackendEventSender, BackendMessage,
    MediaBackend,
};
pub use config::EngineConfig;
pub use engine::{EngineBuilder, PlaybackCommand, PlaybackEngine, PlaybackHandle};
pub use error::{NotificationKind, PlaybackError, Result};
pub use events::PlaybackEvent;
pub use history::History;
pub use notify::{LogNotifier, Notifier};
pub use progress::{ProgressStore, TourProgress};
pub use queue::Queue;
pub use session::PlaybackSession;
pub use sleep_timer::{SleepTimer, TickOutcome};
pub use snapshot::{PlaybackSnapshot, SleepTimerStatus};
pub use store::{KeyValueStore, MemoryStore, PersistedState};
pub use types::{PlaybackSettings, PlaybackState, Quality, RequestId, SettingsUpdate, Track};

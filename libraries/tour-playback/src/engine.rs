//! Playback engine
//!
//! Runs a [`PlaybackSession`] inside a single tokio task. User commands,
//! backend messages and sleep-timer ticks are all funneled into that task,
//! so every operation runs to completion before the next one starts.
//!
//! ```text
//!  PlaybackHandle ──commands──┐
//!  MediaBackend ───messages───┼──> engine task ──> watch<PlaybackSnapshot>
//!  sleep ticker ───ticks──────┘        │      └──> broadcast<PlaybackEvent>
//!                                      └──> MediaBackend calls
//! ```

use crate::{
    backend::{BackendEventReceiver, MediaBackend},
    config::EngineConfig,
    error::{PlaybackError, Result},
    events::PlaybackEvent,
    notify::{LogNotifier, Notifier},
    session::PlaybackSession,
    snapshot::PlaybackSnapshot,
    store::{self, KeyValueStore},
    types::{SettingsUpdate, Track},
};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

/// Capacity of the UI event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Commands sent to the engine task
#[derive(Debug, Clone)]
pub enum PlaybackCommand {
    /// Make a track current and start it
    LoadAndPlay(Track),

    /// Pause when playing, resume when paused, replay when ended
    TogglePlayPause,

    /// Resume playback, or replay a finished track
    Play,

    /// Pause playback
    Pause,

    /// Stop playback and clear the current track
    Stop,

    /// Seek to position (in seconds)
    Seek(f64),

    /// Set volume (0.0-1.0)
    SetVolume(f32),

    /// Toggle mute
    ToggleMute,

    /// Skip forward (seconds, configured default if `None`)
    SkipForward(Option<f64>),

    /// Skip backward (seconds, configured default if `None`)
    SkipBackward(Option<f64>),

    /// Play head of queue
    PlayNext,

    /// Play previous track from history
    PlayPrevious,

    /// Set playback rate
    SetPlaybackRate(f32),

    /// Add track to queue
    AddToQueue(Track),

    /// Remove track from queue by id
    RemoveFromQueue(String),

    /// Clear queue
    ClearQueue,

    /// Arm sleep timer (minutes)
    StartSleepTimer(u32),

    /// Disarm sleep timer
    CancelSleepTimer,

    /// Merge partial settings
    UpdateSettings(SettingsUpdate),

    /// Show or hide the mini-player
    SetMiniPlayerVisible(bool),
}

/// Assembles a [`PlaybackEngine`] from its collaborators
pub struct EngineBuilder {
    config: EngineConfig,
    backend: Box<dyn MediaBackend>,
    backend_events: BackendEventReceiver,
    notifier: Box<dyn Notifier>,
    store: Option<Box<dyn KeyValueStore>>,
}

impl EngineBuilder {
    /// Use a custom notification surface (default: [`LogNotifier`])
    #[must_use]
    pub fn notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    /// Restore from and save to a key-value store
    #[must_use]
    pub fn store(mut self, store: impl KeyValueStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    /// Spawn the engine task
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self) -> Result<PlaybackEngine> {
        self.config.validate()?;

        let mut session = PlaybackSession::new(&self.config, self.backend, self.notifier);

        if let Some(store) = self.store.as_deref() {
            match store::load_state(store) {
                Ok(state) => {
                    debug!("Restored persisted playback state");
                    session.restore_state(state);
                }
                Err(e) => warn!("Ignoring unreadable persisted state: {}", e),
            }
        }

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(session.snapshot());
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (sleep_tx, sleep_rx) = mpsc::unbounded_channel();

        let engine_loop = EngineLoop {
            session,
            commands: command_rx,
            backend_events: self.backend_events,
            shutdown: shutdown_rx,
            sleep_tx,
            sleep_rx,
            sleep_ticker: None,
            tick_period: Duration::from_millis(self.config.sleep_tick_interval_ms),
            skip_seconds: self.config.skip_seconds,
            store: self.store,
            snapshot_tx,
            events_tx: events_tx.clone(),
        };

        let task = tokio::spawn(engine_loop.run());

        Ok(PlaybackEngine {
            handle: PlaybackHandle {
                commands: command_tx,
                snapshot: snapshot_rx,
                events: events_tx,
            },
            shutdown_tx: Some(shutdown_tx),
            task,
        })
    }
}

/// The single playback engine of the application
///
/// Construct once at startup and pass [`PlaybackHandle`]s to whoever needs
/// to drive or observe playback. Call [`PlaybackEngine::shutdown`] on exit;
/// dropping the engine also stops the task.
pub struct PlaybackEngine {
    handle: PlaybackHandle,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl PlaybackEngine {
    /// Start building an engine around a media backend
    ///
    /// `backend_events` is the receiving half of the channel the backend
    /// reports on (see [`crate::backend_channel`]).
    pub fn builder(
        config: EngineConfig,
        backend: impl MediaBackend + 'static,
        backend_events: BackendEventReceiver,
    ) -> EngineBuilder {
        EngineBuilder {
            config,
            backend: Box::new(backend),
            backend_events,
            notifier: Box::new(LogNotifier),
            store: None,
        }
    }

    /// Handle for issuing commands and observing state
    pub fn handle(&self) -> PlaybackHandle {
        self.handle.clone()
    }

    /// Stop the engine and wait for teardown to finish
    ///
    /// Cancels the sleep timer countdown, detaches from backend events,
    /// pauses the backend and flushes persisted state.
    pub async fn shutdown(mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }

        if let Err(e) = (&mut self.task).await {
            warn!("Playback engine task failed: {}", e);
        }
    }
}

/// Cloneable handle to the engine
///
/// Operations are queued and applied in order; they only fail once the
/// engine has shut down.
#[derive(Clone)]
pub struct PlaybackHandle {
    commands: mpsc::UnboundedSender<PlaybackCommand>,
    snapshot: watch::Receiver<PlaybackSnapshot>,
    events: broadcast::Sender<PlaybackEvent>,
}

impl PlaybackHandle {
    /// Queue a raw command
    pub fn send(&self, command: PlaybackCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| PlaybackError::EngineClosed)
    }

    pub fn load_and_play(&self, track: Track) -> Result<()> {
        self.send(PlaybackCommand::LoadAndPlay(track))
    }

    pub fn toggle_play_pause(&self) -> Result<()> {
        self.send(PlaybackCommand::TogglePlayPause)
    }

    pub fn play(&self) -> Result<()> {
        self.send(PlaybackCommand::Play)
    }

    pub fn pause(&self) -> Result<()> {
        self.send(PlaybackCommand::Pause)
    }

    pub fn stop(&self) -> Result<()> {
        self.send(PlaybackCommand::Stop)
    }

    pub fn seek(&self, time: f64) -> Result<()> {
        self.send(PlaybackCommand::Seek(time))
    }

    pub fn set_volume(&self, volume: f32) -> Result<()> {
        self.send(PlaybackCommand::SetVolume(volume))
    }

    pub fn toggle_mute(&self) -> Result<()> {
        self.send(PlaybackCommand::ToggleMute)
    }

    pub fn skip_forward(&self, seconds: Option<f64>) -> Result<()> {
        self.send(PlaybackCommand::SkipForward(seconds))
    }

    pub fn skip_backward(&self, seconds: Option<f64>) -> Result<()> {
        self.send(PlaybackCommand::SkipBackward(seconds))
    }

    pub fn play_next(&self) -> Result<()> {
        self.send(PlaybackCommand::PlayNext)
    }

    pub fn play_previous(&self) -> Result<()> {
        self.send(PlaybackCommand::PlayPrevious)
    }

    pub fn set_playback_rate(&self, rate: f32) -> Result<()> {
        self.send(PlaybackCommand::SetPlaybackRate(rate))
    }

    pub fn add_to_queue(&self, track: Track) -> Result<()> {
        self.send(PlaybackCommand::AddToQueue(track))
    }

    pub fn remove_from_queue(&self, track_id: impl Into<String>) -> Result<()> {
        self.send(PlaybackCommand::RemoveFromQueue(track_id.into()))
    }

    pub fn clear_queue(&self) -> Result<()> {
        self.send(PlaybackCommand::ClearQueue)
    }

    pub fn start_sleep_timer(&self, minutes: u32) -> Result<()> {
        self.send(PlaybackCommand::StartSleepTimer(minutes))
    }

    pub fn cancel_sleep_timer(&self) -> Result<()> {
        self.send(PlaybackCommand::CancelSleepTimer)
    }

    pub fn update_playback_settings(&self, update: SettingsUpdate) -> Result<()> {
        self.send(PlaybackCommand::UpdateSettings(update))
    }

    pub fn set_mini_player_visible(&self, visible: bool) -> Result<()> {
        self.send(PlaybackCommand::SetMiniPlayerVisible(visible))
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Watch the snapshot for changes
    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.snapshot.clone()
    }

    /// Receive discrete playback events from now on
    pub fn events(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }
}

/// Running countdown task of an armed sleep timer
struct SleepTicker {
    generation: u64,
    task: JoinHandle<()>,
}

struct EngineLoop {
    session: PlaybackSession,
    commands: mpsc::UnboundedReceiver<PlaybackCommand>,
    backend_events: BackendEventReceiver,
    shutdown: oneshot::Receiver<()>,
    sleep_tx: mpsc::UnboundedSender<u64>,
    sleep_rx: mpsc::UnboundedReceiver<u64>,
    sleep_ticker: Option<SleepTicker>,
    tick_period: Duration,
    skip_seconds: f64,
    store: Option<Box<dyn KeyValueStore>>,
    snapshot_tx: watch::Sender<PlaybackSnapshot>,
    events_tx: broadcast::Sender<PlaybackEvent>,
}

impl EngineLoop {
    async fn run(mut self) {
        info!("Playback engine started");

        loop {
            tokio::select! {
                _ = &mut self.shutdown => break,
                command = self.commands.recv() => match command {
                    Some(command) => self.apply(command),
                    None => break,
                },
                Some(message) = self.backend_events.recv() => {
                    self.session.handle_backend_message(message);
                }
                Some(generation) = self.sleep_rx.recv() => {
                    self.session.tick_sleep_timer(generation);
                }
            }

            self.sync_sleep_ticker();
            self.publish();
        }

        self.teardown();
    }

    fn apply(&mut self, command: PlaybackCommand) {
        debug!(?command, "Applying command");

        match command {
            PlaybackCommand::LoadAndPlay(track) => self.session.load_and_play(track),
            PlaybackCommand::TogglePlayPause => self.session.toggle_play_pause(),
            PlaybackCommand::Play => self.session.play(),
            PlaybackCommand::Pause => self.session.pause(),
            PlaybackCommand::Stop => {
                self.session.stop();
                self.persist_progress();
            }
            PlaybackCommand::Seek(time) => self.session.seek(time),
            PlaybackCommand::SetVolume(volume) => self.session.set_volume(volume),
            PlaybackCommand::ToggleMute => self.session.toggle_mute(),
            PlaybackCommand::SkipForward(seconds) => self
                .session
                .skip_forward(seconds.unwrap_or(self.skip_seconds)),
            PlaybackCommand::SkipBackward(seconds) => self
                .session
                .skip_backward(seconds.unwrap_or(self.skip_seconds)),
            PlaybackCommand::PlayNext => self.session.play_next(),
            PlaybackCommand::PlayPrevious => self.session.play_previous(),
            PlaybackCommand::SetPlaybackRate(rate) => self.session.set_playback_rate(rate),
            PlaybackCommand::AddToQueue(track) => self.session.add_to_queue(track),
            PlaybackCommand::RemoveFromQueue(track_id) => {
                self.session.remove_from_queue(&track_id);
            }
            PlaybackCommand::ClearQueue => self.session.clear_queue(),
            PlaybackCommand::StartSleepTimer(minutes) => {
                self.session.start_sleep_timer(minutes);
            }
            PlaybackCommand::CancelSleepTimer => self.session.cancel_sleep_timer(),
            PlaybackCommand::UpdateSettings(update) => {
                self.session.update_settings(update);
                self.persist_settings();
            }
            PlaybackCommand::SetMiniPlayerVisible(visible) => {
                self.session.set_mini_player_visible(visible);
            }
        }
    }

    /// Keep the countdown task in line with the session's sleep timer
    ///
    /// The old task is aborted as soon as the timer disarms or is re-armed.
    fn sync_sleep_ticker(&mut self) {
        let wanted = self.session.sleep_timer().active_generation();
        let running = self.sleep_ticker.as_ref().map(|ticker| ticker.generation);

        if wanted == running {
            return;
        }

        if let Some(ticker) = self.sleep_ticker.take() {
            ticker.task.abort();
            debug!(generation = ticker.generation, "Sleep ticker stopped");
        }

        if let Some(generation) = wanted {
            let period = self.tick_period;
            let sleep_tx = self.sleep_tx.clone();

            let task = tokio::spawn(async move {
                let mut interval = time::interval_at(Instant::now() + period, period);
                loop {
                    interval.tick().await;
                    if sleep_tx.send(generation).is_err() {
                        break;
                    }
                }
            });

            debug!(generation, "Sleep ticker started");
            self.sleep_ticker = Some(SleepTicker { generation, task });
        }
    }

    fn publish(&mut self) {
        let mut progress_changed = false;

        for event in self.session.drain_events() {
            progress_changed |= event.affects_progress();
            // No subscribers is fine
            let _ = self.events_tx.send(event);
        }

        if progress_changed {
            self.persist_progress();
        }

        self.snapshot_tx.send_replace(self.session.snapshot());
    }

    fn persist_settings(&mut self) {
        if let Some(store) = self.store.as_deref_mut() {
            if let Err(e) = store::save_settings(store, self.session.settings()) {
                warn!("Failed to persist playback settings: {}", e);
            }
        }
    }

    fn persist_progress(&mut self) {
        if let Some(store) = self.store.as_deref_mut() {
            let progress = self.session.progress();
            if let Err(e) =
                store::save_progress(store, progress.track_positions(), progress.tours())
            {
                warn!("Failed to persist playback progress: {}", e);
            }
        }
    }

    fn teardown(&mut self) {
        if let Some(ticker) = self.sleep_ticker.take() {
            ticker.task.abort();
        }

        self.session.dispose();
        self.backend_events.close();

        if let Some(store) = self.store.as_deref_mut() {
            if let Err(e) = store::save_state(store, &self.session.export_state()) {
                warn!("Failed to persist playback state: {}", e);
            }
        }

        self.publish();
        info!("Playback engine stopped");
    }
}

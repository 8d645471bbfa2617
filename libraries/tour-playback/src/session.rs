//! Playback session - core orchestration
//!
//! Owns the current track and transport state, and coordinates queue,
//! history, progress, sleep timer and settings. Synchronous: the engine
//! feeds it user operations and backend messages one at a time.

use crate::{
    backend::{BackendEvent, BackendMessage, MediaBackend},
    config::EngineConfig,
    error::PlaybackError,
    events::PlaybackEvent,
    history::History,
    notify::Notifier,
    progress::ProgressStore,
    queue::Queue,
    sleep_timer::{SleepTimer, TickOutcome},
    snapshot::{progress_percent, PlaybackSnapshot, SleepTimerStatus},
    store::PersistedState,
    types::{PlaybackSettings, PlaybackState, RequestId, SettingsUpdate, Track},
};
use tracing::{debug, info, warn};

/// Single live playback session
///
/// Invariants:
/// - `position` stays within `[0, duration]` whenever `duration > 0`
/// - `state == Idle` exactly when there is no current track
///
/// Every load attempt gets a fresh [`RequestId`]; backend messages tagged
/// with any other id are stale and dropped.
pub struct PlaybackSession {
    // State
    state: PlaybackState,
    current_track: Option<Track>,
    position: f64,
    duration: f64,
    request: RequestId,
    awaiting_ready: bool,

    // Output
    volume: f32,
    muted: bool,
    rate: f32,

    // Siblings
    queue: Queue,
    history: History,
    progress: ProgressStore,
    sleep_timer: SleepTimer,
    settings: PlaybackSettings,
    mini_player_visible: bool,

    // Collaborators
    backend: Box<dyn MediaBackend>,
    notifier: Box<dyn Notifier>,

    // Event queue for UI synchronization
    pending_events: Vec<PlaybackEvent>,
}

impl PlaybackSession {
    /// Create new session
    ///
    /// Initial volume and rate are pushed to the backend right away.
    pub fn new(
        config: &EngineConfig,
        backend: Box<dyn MediaBackend>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        let mut session = Self {
            state: PlaybackState::Idle,
            current_track: None,
            position: 0.0,
            duration: 0.0,
            request: RequestId::default(),
            awaiting_ready: false,
            volume: config.initial_volume.clamp(0.0, 1.0),
            muted: false,
            rate: config.initial_rate,
            queue: Queue::new(),
            history: History::new(config.history_size),
            progress: ProgressStore::new(),
            sleep_timer: SleepTimer::new(),
            settings: config.settings.clone(),
            mini_player_visible: false,
            backend,
            notifier,
            pending_events: Vec::new(),
        };

        session.apply_volume();
        session.backend.set_rate(session.rate);
        session
    }

    // ===== Playback Control =====

    /// Make `track` current and start loading it
    ///
    /// Supersedes any load or play request still in flight.
    pub fn load_and_play(&mut self, track: Track) {
        let previous_track_id = self.current_track.as_ref().map(|t| t.id.clone());

        self.request = self.request.next();
        self.awaiting_ready = true;
        self.position = 0.0;
        self.duration = track
            .estimated_duration
            .filter(|d| d.is_finite() && *d > 0.0)
            .unwrap_or(0.0);

        info!(track_id = %track.id, request = %self.request, "Loading track");
        self.backend.load(
            self.request,
            &track.source_locator,
            self.settings.preferred_quality,
        );

        self.history.push(track.clone());
        self.emit(PlaybackEvent::TrackChanged {
            track_id: track.id.clone(),
            previous_track_id,
        });

        self.current_track = Some(track);
        self.mini_player_visible = true;
        self.set_state(PlaybackState::Loading);
    }

    /// Pause when playing, resume when paused
    ///
    /// A finished track starts over from the beginning.
    pub fn toggle_play_pause(&mut self) {
        if self.current_track.is_none() {
            debug!("toggle_play_pause ignored: no active track");
            return;
        }

        match self.state {
            PlaybackState::Playing => self.pause(),
            PlaybackState::Paused | PlaybackState::Ended => self.play(),
            state => debug!(%state, "toggle_play_pause ignored"),
        }
    }

    /// Resume a paused track, or replay a finished one from the start
    ///
    /// The state turns `Playing` immediately; a later rejection from the
    /// backend reverts it to `Paused`. A track paused before its source was
    /// ready goes back to `Loading` and starts once the backend is ready.
    pub fn play(&mut self) {
        if self.current_track.is_none() {
            return;
        }

        match self.state {
            PlaybackState::Paused if self.awaiting_ready => {
                self.set_state(PlaybackState::Loading);
            }
            PlaybackState::Paused => {
                self.backend.play(self.request);
                self.set_state(PlaybackState::Playing);
            }
            PlaybackState::Ended => {
                debug!(request = %self.request, "Replaying finished track");
                self.position = 0.0;
                self.backend.seek(0.0);
                self.backend.play(self.request);
                self.set_state(PlaybackState::Playing);
            }
            _ => {}
        }
    }

    /// Pause playback
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.backend.pause();
            self.set_state(PlaybackState::Paused);
        }
    }

    /// Stop playback
    ///
    /// Clears current track (but not queue or history) and returns to `Idle`
    pub fn stop(&mut self) {
        if self.current_track.is_none() {
            return;
        }

        self.backend.pause();
        self.reset_to_idle();
    }

    /// Play the head of the queue
    pub fn play_next(&mut self) {
        match self.queue.pop_next() {
            Some(track) => {
                self.emit_queue_changed();
                self.load_and_play(track);
            }
            None => debug!("play_next ignored: queue is empty"),
        }
    }

    /// Play the track before the current one in history
    pub fn play_previous(&mut self) {
        match self.history.get(1).cloned() {
            Some(track) => self.load_and_play(track),
            None => debug!("play_previous ignored: no earlier track in history"),
        }
    }

    // ===== Seek =====

    /// Seek to position in seconds, clamped to the track
    pub fn seek(&mut self, time: f64) {
        if !self.is_media_loaded() {
            debug!("seek ignored: nothing loaded");
            return;
        }
        if !time.is_finite() {
            warn!(time, "seek ignored: position is not a number");
            return;
        }

        let target = self.clamp_position(time);
        self.backend.seek(target);
        self.position = target;
    }

    /// Jump ahead by `seconds`
    pub fn skip_forward(&mut self, seconds: f64) {
        self.seek(self.position + seconds);
    }

    /// Jump back by `seconds`
    pub fn skip_backward(&mut self, seconds: f64) {
        self.seek(self.position - seconds);
    }

    // ===== Volume & Rate =====

    /// Set volume, clamped to [0, 1]
    pub fn set_volume(&mut self, volume: f32) {
        if volume.is_nan() {
            warn!("set_volume ignored: volume is not a number");
            return;
        }

        self.volume = volume.clamp(0.0, 1.0);
        self.apply_volume();
        self.emit_volume_changed();
    }

    /// Toggle mute state (volume level is preserved)
    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
        self.apply_volume();
        self.emit_volume_changed();
    }

    /// Set playback rate, applied to the backend immediately
    ///
    /// Any positive rate is accepted; 0.5 to 2.0 in quarter steps is what
    /// the UI offers.
    pub fn set_playback_rate(&mut self, rate: f32) {
        if !(rate.is_finite() && rate > 0.0) {
            warn!(rate, "set_playback_rate ignored: rate must be positive");
            return;
        }

        self.rate = rate;
        self.backend.set_rate(rate);
        self.emit(PlaybackEvent::RateChanged { rate });
    }

    // ===== Queue Management =====

    /// Add track to the end of the queue
    pub fn add_to_queue(&mut self, track: Track) {
        self.queue.push(track);
        self.emit_queue_changed();
    }

    /// Remove every queued entry of a track
    pub fn remove_from_queue(&mut self, track_id: &str) {
        if self.queue.remove_by_id(track_id) > 0 {
            self.emit_queue_changed();
        }
    }

    /// Clear entire queue
    pub fn clear_queue(&mut self) {
        if !self.queue.is_empty() {
            self.queue.clear();
            self.emit_queue_changed();
        }
    }

    // ===== Sleep Timer =====

    /// Arm the sleep timer, replacing any running one
    ///
    /// Returns the generation the countdown has to tick with, or `None`
    /// if `minutes` is zero.
    pub fn start_sleep_timer(&mut self, minutes: u32) -> Option<u64> {
        if minutes == 0 {
            warn!("start_sleep_timer ignored: zero minutes");
            return None;
        }

        let seconds = minutes.saturating_mul(60);
        let generation = self.sleep_timer.arm(seconds);
        info!(seconds, "Sleep timer started");
        self.emit(PlaybackEvent::SleepTimerStarted { seconds });
        Some(generation)
    }

    /// Disarm the sleep timer (no-op if not running)
    pub fn cancel_sleep_timer(&mut self) {
        if self.sleep_timer.cancel() {
            info!("Sleep timer cancelled");
            self.emit(PlaybackEvent::SleepTimerCancelled);
        }
    }

    /// Advance the sleep timer by one second
    ///
    /// On expiry the backend is paused; track and queue are left alone.
    /// A track still loading is held paused instead of starting.
    pub fn tick_sleep_timer(&mut self, generation: u64) -> TickOutcome {
        let outcome = self.sleep_timer.tick(generation);

        if outcome == TickOutcome::Expired {
            info!(state = %self.state, "Sleep timer expired, pausing playback");
            self.backend.pause();
            if matches!(self.state, PlaybackState::Playing | PlaybackState::Loading) {
                self.set_state(PlaybackState::Paused);
            }
            self.emit(PlaybackEvent::SleepTimerExpired);
        }

        outcome
    }

    // ===== Settings =====

    /// Merge a partial settings update
    ///
    /// Quality changes take effect on the next `load_and_play`.
    pub fn update_settings(&mut self, update: SettingsUpdate) {
        self.settings.merge(update);
        self.emit(PlaybackEvent::SettingsChanged {
            settings: self.settings.clone(),
        });
    }

    pub fn set_mini_player_visible(&mut self, visible: bool) {
        self.mini_player_visible = visible;
    }

    // ===== Backend Events =====

    /// Fold one backend message into the session
    pub fn handle_backend_message(&mut self, message: BackendMessage) {
        if message.request != self.request {
            debug!(
                request = %message.request,
                current = %self.request,
                event = ?message.event,
                "Discarding stale backend message"
            );
            return;
        }

        match message.event {
            BackendEvent::Ready { duration } => self.on_ready(duration),
            BackendEvent::PlayStarted => self.on_play_started(),
            BackendEvent::PlayRejected(reason) => self.on_play_rejected(reason),
            BackendEvent::Tick { position, duration } => self.on_tick(position, duration),
            BackendEvent::Ended => self.on_ended(),
            BackendEvent::Error(reason) => self.on_error(reason),
        }
    }

    fn on_ready(&mut self, duration: f64) {
        if !self.awaiting_ready {
            debug!(state = %self.state, "Ready ignored");
            return;
        }

        self.awaiting_ready = false;
        if duration.is_finite() && duration > 0.0 {
            self.duration = duration;
        }
        self.position = self.clamp_position(self.position);

        if self.state == PlaybackState::Loading {
            debug!(request = %self.request, duration = self.duration, "Source ready, requesting play");
            self.backend.play(self.request);
        } else {
            debug!(state = %self.state, duration = self.duration, "Source ready, holding");
        }
    }

    fn on_play_started(&mut self) {
        match self.state {
            PlaybackState::Loading => self.set_state(PlaybackState::Playing),
            // Play resolved after the sleep timer paused us
            PlaybackState::Paused => self.backend.pause(),
            _ => {}
        }
    }

    fn on_play_rejected(&mut self, reason: String) {
        match self.state {
            PlaybackState::Loading | PlaybackState::Playing => {
                self.set_state(PlaybackState::Paused);
                self.surface(PlaybackError::PlaybackRejected(reason));
            }
            PlaybackState::Paused => self.surface(PlaybackError::PlaybackRejected(reason)),
            state => debug!(%state, "PlayRejected ignored"),
        }
    }

    fn on_tick(&mut self, position: f64, duration: Option<f64>) {
        if !matches!(self.state, PlaybackState::Playing | PlaybackState::Paused) {
            return;
        }
        if !position.is_finite() {
            return;
        }

        if let Some(duration) = duration.filter(|d| d.is_finite() && *d > 0.0) {
            self.duration = duration;
        }
        self.position = self.clamp_position(position);
        self.record_progress();
    }

    fn on_ended(&mut self) {
        if !matches!(self.state, PlaybackState::Playing | PlaybackState::Paused) {
            debug!(state = %self.state, "Ended ignored");
            return;
        }

        if self.duration > 0.0 {
            self.position = self.duration;
        }
        self.record_progress();
        self.set_state(PlaybackState::Ended);

        if let Some(track) = self.current_track.clone() {
            info!(track_id = %track.id, "Track finished");

            if let Some(tour_id) = track.tour_id.as_deref() {
                if self.progress.complete_segment(tour_id, &track.id) {
                    self.emit(PlaybackEvent::SegmentCompleted {
                        tour_id: tour_id.to_string(),
                        track_id: track.id.clone(),
                    });
                }
            }

            self.emit(PlaybackEvent::TrackFinished { track_id: track.id });
        }

        if self.settings.autoplay && !self.queue.is_empty() {
            self.play_next();
        }
    }

    fn on_error(&mut self, reason: String) {
        match self.state {
            PlaybackState::Idle | PlaybackState::Error => {}
            state if state == PlaybackState::Loading || self.awaiting_ready => {
                self.fail_load(reason);
            }
            _ => {
                // Source broke after it loaded; keep it for a retry
                self.surface(PlaybackError::Playback(reason));
                self.set_state(PlaybackState::Paused);
            }
        }
    }

    fn fail_load(&mut self, reason: String) {
        self.surface(PlaybackError::Load(reason));
        self.set_state(PlaybackState::Error);
        self.reset_to_idle();
    }

    // ===== State Queries =====

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current_track.as_ref()
    }

    /// Position in seconds
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Duration in seconds (0 if unknown)
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn progress_percent(&self) -> f64 {
        progress_percent(self.position, self.duration)
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Volume actually sent to the backend
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.volume
        }
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn progress(&self) -> &ProgressStore {
        &self.progress
    }

    pub fn sleep_timer(&self) -> &SleepTimer {
        &self.sleep_timer
    }

    pub fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    pub fn is_mini_player_visible(&self) -> bool {
        self.mini_player_visible
    }

    /// Id of the load attempt currently honored
    pub fn current_request(&self) -> RequestId {
        self.request
    }

    /// Observable copy of the whole session
    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            current_track: self.current_track.clone(),
            state: self.state,
            position: self.position,
            duration: self.duration,
            progress_percent: self.progress_percent(),
            volume: self.volume,
            muted: self.muted,
            rate: self.rate,
            queue: self.queue.to_vec(),
            history: self.history.to_vec(),
            sleep_timer: SleepTimerStatus {
                active: self.sleep_timer.is_active(),
                remaining_seconds: self.sleep_timer.remaining_seconds(),
            },
            settings: self.settings.clone(),
            is_mini_player_visible: self.mini_player_visible,
        }
    }

    // ===== Persistence Hooks =====

    /// Settings and progress worth keeping across restarts
    pub fn export_state(&self) -> PersistedState {
        PersistedState {
            settings: self.settings.clone(),
            track_progress: self.progress.track_positions().clone(),
            tour_progress: self.progress.tours().clone(),
        }
    }

    /// Restore settings and progress saved by a previous run
    pub fn restore_state(&mut self, state: PersistedState) {
        self.settings = state.settings;
        self.progress
            .restore(state.track_progress, state.tour_progress);
    }

    // ===== Teardown =====

    /// Disarm timers and silence the backend
    pub fn dispose(&mut self) {
        self.sleep_timer.cancel();
        if matches!(self.state, PlaybackState::Playing | PlaybackState::Loading) {
            self.backend.pause();
        }
    }

    // ===== Event Queue =====

    /// Take all events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    // ===== Internal =====

    fn is_media_loaded(&self) -> bool {
        self.current_track.is_some()
            && !self.awaiting_ready
            && matches!(
                self.state,
                PlaybackState::Playing | PlaybackState::Paused | PlaybackState::Ended
            )
    }

    fn clamp_position(&self, time: f64) -> f64 {
        let time = time.max(0.0);
        if self.duration > 0.0 {
            time.min(self.duration)
        } else {
            time
        }
    }

    fn record_progress(&mut self) {
        if let Some(track) = &self.current_track {
            self.progress.record_position(
                &track.id,
                track.tour_id.as_deref(),
                self.position,
                self.duration,
            );
        }
    }

    fn reset_to_idle(&mut self) {
        // Late messages for the abandoned attempt must not revive it
        self.request = self.request.next();
        self.awaiting_ready = false;
        self.current_track = None;
        self.position = 0.0;
        self.duration = 0.0;
        self.mini_player_visible = false;
        self.set_state(PlaybackState::Idle);
    }

    fn apply_volume(&mut self) {
        let volume = self.effective_volume();
        self.backend.set_volume(volume);
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state != state {
            debug!(from = %self.state, to = %state, "State transition");
            self.state = state;
            self.emit(PlaybackEvent::StateChanged { state });
        }
    }

    fn surface(&mut self, error: PlaybackError) {
        let Some(kind) = error.notification_kind() else {
            return;
        };

        let message = error.to_string();
        warn!(?kind, "{}", message);
        self.notifier.notify(kind, &message);
        self.emit(PlaybackEvent::Error { kind, message });
    }

    fn emit(&mut self, event: PlaybackEvent) {
        self.pending_events.push(event);
    }

    fn emit_queue_changed(&mut self) {
        self.emit(PlaybackEvent::QueueChanged {
            length: self.queue.len(),
        });
    }

    fn emit_volume_changed(&mut self) {
        self.emit(PlaybackEvent::VolumeChanged {
            volume: self.volume,
            is_muted: self.muted,
        });
    }
}

//! Simulated media backend
//!
//! Stands in for a real audio output in headless runs. Sources are looked
//! up in an in-memory catalog of locator -> length; a device task advances
//! the playhead on a fixed step and reports back like a platform player
//! would (ready, play started, position ticks, ended, errors).

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tour_playback::{
    BackendEvent, BackendEventSender, BackendMessage, MediaBackend, Quality, RequestId,
};
use tracing::{debug, trace};

/// Timing of the simulated device
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationOptions {
    /// How often the playhead advances and reports its position
    pub step: Duration,

    /// Media seconds played per wall-clock second at rate 1.0
    pub speed: f64,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            step: Duration::from_millis(250),
            speed: 1.0,
        }
    }
}

#[derive(Debug)]
enum Control {
    Load { request: RequestId, locator: String },
    Play(RequestId),
    Pause,
    Seek(f64),
    Volume(f32),
    Rate(f32),
}

/// [`MediaBackend`] forwarding every call to a simulated device task
///
/// The device task ends once the backend is dropped.
pub struct SimulatedBackend {
    control: mpsc::UnboundedSender<Control>,
}

impl SimulatedBackend {
    /// Spawn the device task
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        catalog: HashMap<String, f64>,
        events: BackendEventSender,
        options: SimulationOptions,
    ) -> (Self, JoinHandle<()>) {
        let (control_tx, control_rx) = mpsc::unbounded_channel();

        let device = Device {
            catalog,
            events,
            options,
            source: None,
            rate: 1.0,
        };
        let task = tokio::spawn(device.run(control_rx));

        (
            Self {
                control: control_tx,
            },
            task,
        )
    }

    fn send(&self, control: Control) {
        // Device only stops once we are dropped
        let _ = self.control.send(control);
    }
}

impl MediaBackend for SimulatedBackend {
    fn load(&mut self, request: RequestId, locator: &str, quality: Quality) {
        debug!(%request, locator, ?quality, "Simulated load");
        self.send(Control::Load {
            request,
            locator: locator.to_string(),
        });
    }

    fn play(&mut self, request: RequestId) {
        self.send(Control::Play(request));
    }

    fn pause(&mut self) {
        self.send(Control::Pause);
    }

    fn seek(&mut self, position: f64) {
        self.send(Control::Seek(position));
    }

    fn set_volume(&mut self, volume: f32) {
        self.send(Control::Volume(volume));
    }

    fn set_rate(&mut self, rate: f32) {
        self.send(Control::Rate(rate));
    }
}

/// Source currently held by the device
#[derive(Debug)]
struct LoadedSource {
    request: RequestId,
    duration: f64,
    position: f64,
    playing: bool,
}

struct Device {
    catalog: HashMap<String, f64>,
    events: BackendEventSender,
    options: SimulationOptions,
    source: Option<LoadedSource>,
    rate: f32,
}

impl Device {
    async fn run(mut self, mut control: mpsc::UnboundedReceiver<Control>) {
        let step = self.options.step;
        let mut interval = time::interval_at(Instant::now() + step, step);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = control.recv() => match command {
                    Some(command) => self.apply(command),
                    None => break,
                },
                _ = interval.tick() => self.advance(),
            }
        }

        debug!("Simulated device stopped");
    }

    fn apply(&mut self, command: Control) {
        trace!(?command, "Simulated device command");

        match command {
            Control::Load { request, locator } => match self.catalog.get(&locator).copied() {
                Some(duration) => {
                    self.source = Some(LoadedSource {
                        request,
                        duration,
                        position: 0.0,
                        playing: false,
                    });
                    self.report(request, BackendEvent::Ready { duration });
                }
                None => {
                    self.source = None;
                    self.report(
                        request,
                        BackendEvent::Error(format!("Source not found: {locator}")),
                    );
                }
            },
            Control::Play(request) => {
                let Some(source) = self.source.as_mut() else {
                    return;
                };
                if source.request != request {
                    debug!(%request, current = %source.request, "Play for replaced source ignored");
                    return;
                }
                source.playing = true;
                self.report(request, BackendEvent::PlayStarted);
            }
            Control::Pause => {
                if let Some(source) = self.source.as_mut() {
                    source.playing = false;
                }
            }
            Control::Seek(position) => {
                if let Some(source) = self.source.as_mut() {
                    source.position = position.clamp(0.0, source.duration);
                }
            }
            Control::Volume(volume) => debug!(volume, "Simulated volume"),
            Control::Rate(rate) => self.rate = rate,
        }
    }

    fn advance(&mut self) {
        let step = self.options.step.as_secs_f64() * self.options.speed * f64::from(self.rate);
        let Some(source) = self.source.as_mut().filter(|s| s.playing) else {
            return;
        };

        source.position = (source.position + step).min(source.duration);
        let request = source.request;
        let position = source.position;
        let ended = position >= source.duration;
        if ended {
            source.playing = false;
        }

        self.report(
            request,
            BackendEvent::Tick {
                position,
                duration: None,
            },
        );
        if ended {
            self.report(request, BackendEvent::Ended);
        }
    }

    fn report(&self, request: RequestId, event: BackendEvent) {
        // Nobody listening once the engine is gone
        let _ = self.events.send(BackendMessage::new(request, event));
    }
}

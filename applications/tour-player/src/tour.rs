//! Drives one tour through the playback engine until it is over

use tokio::sync::broadcast::error::RecvError;
use tour_playback::{
    NotificationKind, PlaybackEvent, PlaybackHandle, PlaybackSnapshot, PlaybackState, Track,
};
use tracing::{info, warn};

/// Why following a tour stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourOutcome {
    /// Last stop finished (or could not be loaded)
    Completed,

    /// Sleep timer paused playback
    SleepTimerExpired,

    /// Engine shut down underneath us
    EngineStopped,
}

/// Start the first stop and queue the rest
pub fn start(player: &PlaybackHandle, tracks: Vec<Track>) -> tour_playback::Result<()> {
    let mut tracks = tracks.into_iter();

    if let Some(first) = tracks.next() {
        player.load_and_play(first)?;
    }
    for track in tracks {
        player.add_to_queue(track)?;
    }

    Ok(())
}

/// Log playback until the tour is over
///
/// Stops whose audio fails to load are skipped.
pub async fn follow(player: &PlaybackHandle) -> TourOutcome {
    let mut events = player.events();
    let mut snapshots = player.subscribe();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(PlaybackEvent::SleepTimerExpired) => {
                    info!("Sleep timer expired");
                    return TourOutcome::SleepTimerExpired;
                }
                Ok(PlaybackEvent::Error { kind: NotificationKind::LoadError, message }) => {
                    // The Idle snapshot for this failure may be seen before
                    // play_next lands. It only reads as finished when the
                    // queue is already empty, i.e. the failed stop was last.
                    warn!("Skipping stop: {}", message);
                    if player.play_next().is_err() {
                        return TourOutcome::EngineStopped;
                    }
                }
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event log fell behind"),
                Err(RecvError::Closed) => return TourOutcome::EngineStopped,
            },
            changed = snapshots.changed() => {
                if changed.is_err() {
                    return TourOutcome::EngineStopped;
                }
                if is_finished(&snapshots.borrow_and_update()) {
                    return TourOutcome::Completed;
                }
            }
        }
    }
}

/// Nothing is playing and nothing will start on its own
fn is_finished(snapshot: &PlaybackSnapshot) -> bool {
    match snapshot.state {
        PlaybackState::Ended => snapshot.queue.is_empty() || !snapshot.settings.autoplay,
        PlaybackState::Idle => snapshot.queue.is_empty(),
        _ => false,
    }
}

fn log_event(event: &PlaybackEvent) {
    match event {
        PlaybackEvent::TrackChanged { track_id, .. } => info!(track_id, "Now playing"),
        PlaybackEvent::StateChanged { state } => info!(%state, "Playback state"),
        PlaybackEvent::SegmentCompleted { tour_id, track_id } => {
            info!(tour_id, track_id, "Stop completed");
        }
        PlaybackEvent::SleepTimerStarted { seconds } => info!(seconds, "Sleep timer started"),
        PlaybackEvent::Error { message, .. } => warn!("{}", message),
        other => tracing::debug!(event = ?other, "Playback event"),
    }
}

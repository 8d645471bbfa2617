//! Playback Events
//!
//! Discrete notifications for UI synchronization. Continuous values
//! (position, duration) are only carried by the snapshot.

use crate::error::NotificationKind;
use crate::types::{PlaybackSettings, PlaybackState};
use serde::{Deserialize, Serialize};

/// Events emitted by the playback session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Playback state changed
    StateChanged {
        /// The new playback state
        state: PlaybackState,
    },

    /// A new track became current
    TrackChanged {
        /// ID of the new (current) track
        track_id: String,
        /// ID of the previous track (if any)
        previous_track_id: Option<String>,
    },

    /// Track played to its end
    TrackFinished {
        /// ID of the finished track
        track_id: String,
    },

    /// A tour stop was completed for the first time
    SegmentCompleted { tour_id: String, track_id: String },

    /// Queue changed (tracks added/removed/consumed)
    QueueChanged {
        /// New queue length
        length: usize,
    },

    /// Volume changed
    VolumeChanged {
        /// New volume in [0, 1]
        volume: f32,
        /// Whether audio is muted
        is_muted: bool,
    },

    /// Playback rate changed
    RateChanged { rate: f32 },

    /// Playback settings were updated
    SettingsChanged { settings: PlaybackSettings },

    /// Sleep timer armed
    SleepTimerStarted { seconds: u32 },

    /// Sleep timer disarmed by the user
    SleepTimerCancelled,

    /// Sleep timer ran out and paused playback
    SleepTimerExpired,

    /// Failure surfaced to the user
    Error {
        kind: NotificationKind,
        message: String,
    },
}

impl PlaybackEvent {
    /// Whether progress worth persisting changed with this event
    pub fn affects_progress(&self) -> bool {
        matches!(
            self,
            PlaybackEvent::TrackFinished { .. } | PlaybackEvent::SegmentCompleted { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_completion_events_affect_progress() {
        assert!(PlaybackEvent::TrackFinished {
            track_id: "t1".into()
        }
        .affects_progress());
        assert!(!PlaybackEvent::QueueChanged { length: 2 }.affects_progress());
        assert!(!PlaybackEvent::SleepTimerExpired.affects_progress());
    }

    #[test]
    fn events_serialize_for_the_ui() {
        let event = PlaybackEvent::StateChanged {
            state: PlaybackState::Paused,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"StateChanged":{"state":"Paused"}}"#);
    }
}

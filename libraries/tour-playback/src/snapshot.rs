//! Read-only view of the engine for observers

use crate::types::{PlaybackSettings, PlaybackState, Track};
use serde::{Deserialize, Serialize};

/// Sleep timer as seen by the UI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepTimerStatus {
    pub active: bool,
    pub remaining_seconds: Option<u32>,
}

/// Observable engine state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSnapshot {
    pub current_track: Option<Track>,
    pub state: PlaybackState,
    pub position: f64,
    pub duration: f64,
    pub progress_percent: f64,
    pub volume: f32,
    pub muted: bool,
    pub rate: f32,
    pub queue: Vec<Track>,
    pub history: Vec<Track>,
    pub sleep_timer: SleepTimerStatus,
    pub settings: PlaybackSettings,
    pub is_mini_player_visible: bool,
}

/// Percentage of the track played, 0 when the duration is unknown
pub fn progress_percent(position: f64, duration: f64) -> f64 {
    if duration > 0.0 {
        position / duration * 100.0
    } else {
        0.0
    }
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self {
            current_track: None,
            state: PlaybackState::Idle,
            position: 0.0,
            duration: 0.0,
            progress_percent: 0.0,
            volume: 1.0,
            muted: false,
            rate: 1.0,
            queue: Vec::new(),
            history: Vec::new(),
            sleep_timer: SleepTimerStatus::default(),
            settings: PlaybackSettings::default(),
            is_mini_player_visible: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_of_known_duration() {
        assert_eq!(progress_percent(25.0, 100.0), 25.0);
        assert_eq!(progress_percent(100.0, 100.0), 100.0);
    }

    #[test]
    fn percent_is_zero_without_duration() {
        assert_eq!(progress_percent(12.0, 0.0), 0.0);
    }
}

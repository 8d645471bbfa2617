//! Playback history tracking
//!
//! Maintains a bounded, deduplicated history of played tracks for
//! "previous" functionality

use crate::types::Track;
use std::collections::VecDeque;

/// Default number of remembered tracks
pub const DEFAULT_HISTORY_SIZE: usize = 20;

/// Playback history with bounded size
///
/// Most recent track is at the front. Each track id appears at most once:
/// re-playing a track moves it to the front.
#[derive(Debug, Clone)]
pub struct History {
    /// History buffer (most recent = front)
    tracks: VecDeque<Track>,

    /// Maximum history size
    max_size: usize,
}

impl History {
    /// Create new history with specified maximum size
    pub fn new(max_size: usize) -> Self {
        Self {
            tracks: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    /// Record a played track
    ///
    /// Any older entry with the same id is removed. If history is full,
    /// the oldest track is discarded.
    pub fn push(&mut self, track: Track) {
        self.tracks.retain(|t| t.id != track.id);
        self.tracks.push_front(track);
        self.tracks.truncate(self.max_size);
    }

    /// Most recent track (normally the current one)
    pub fn most_recent(&self) -> Option<&Track> {
        self.tracks.front()
    }

    /// Track at `index`, 0 being the most recent
    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// All history tracks, most recent first
    pub fn get_all(&self) -> Vec<&Track> {
        self.tracks.iter().collect()
    }

    /// Owned copy of the history, for snapshots
    pub fn to_vec(&self) -> Vec<Track> {
        self.tracks.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}

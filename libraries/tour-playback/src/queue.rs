//! Pending-track queue
//!
//! Plain FIFO: insertion order is playback order. The same track may be
//! queued more than once.

use crate::types::Track;
use std::collections::VecDeque;

/// Ordered list of tracks waiting to be played
///
/// ```text
/// Currently Playing: Stop 1
/// ─────────────────────────────
/// Queue (head plays next):
///   - Stop 2
///   - Stop 3
///   - Stop 2   (duplicates allowed)
/// ```
#[derive(Debug, Clone, Default)]
pub struct Queue {
    tracks: VecDeque<Track>,
}

impl Queue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self {
            tracks: VecDeque::new(),
        }
    }

    /// Add track to the end of the queue
    pub fn push(&mut self, track: Track) {
        self.tracks.push_back(track);
    }

    /// Add several tracks to the end of the queue, keeping their order
    pub fn extend(&mut self, tracks: impl IntoIterator<Item = Track>) {
        self.tracks.extend(tracks);
    }

    /// Remove every entry with the given track id
    ///
    /// Returns the number of entries removed
    pub fn remove_by_id(&mut self, id: &str) -> usize {
        let before = self.tracks.len();
        self.tracks.retain(|track| track.id != id);
        before - self.tracks.len()
    }

    /// Take the head of the queue
    pub fn pop_next(&mut self) -> Option<Track> {
        self.tracks.pop_front()
    }

    /// Peek at the head without removing it
    pub fn peek_next(&self) -> Option<&Track> {
        self.tracks.front()
    }

    /// Clear entire queue
    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    /// All queued tracks in playback order
    pub fn get_all(&self) -> Vec<&Track> {
        self.tracks.iter().collect()
    }

    /// Owned copy of the queue, for snapshots
    pub fn to_vec(&self) -> Vec<Track> {
        self.tracks.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

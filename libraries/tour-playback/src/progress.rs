//! Per-track and per-tour listening progress
//!
//! In-memory only. Persisting across restarts goes through
//! [`crate::store`].

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Progress through one tour
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourProgress {
    /// Position in the most recently played stop, in seconds
    pub last_position: f64,

    /// Ids of stops that were played to the end
    pub completed_segments: BTreeSet<String>,

    /// Duration of the most recently played stop, in seconds
    pub total_duration: f64,
}

/// Track and tour progress maps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStore {
    tracks: HashMap<String, f64>,
    tours: HashMap<String, TourProgress>,
}

impl ProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a position tick for a track and, if given, its tour
    pub fn record_position(
        &mut self,
        track_id: &str,
        tour_id: Option<&str>,
        position: f64,
        duration: f64,
    ) {
        self.tracks.insert(track_id.to_string(), position);

        if let Some(tour_id) = tour_id {
            let tour = self.tours.entry(tour_id.to_string()).or_default();
            tour.last_position = position;
            tour.total_duration = duration;
        }
    }

    /// Mark a stop as completed within its tour (idempotent)
    ///
    /// Returns `true` if the segment was not completed before
    pub fn complete_segment(&mut self, tour_id: &str, track_id: &str) -> bool {
        self.tours
            .entry(tour_id.to_string())
            .or_default()
            .completed_segments
            .insert(track_id.to_string())
    }

    /// Last known position of a track
    pub fn track_position(&self, track_id: &str) -> Option<f64> {
        self.tracks.get(track_id).copied()
    }

    /// Progress of a tour
    pub fn tour(&self, tour_id: &str) -> Option<&TourProgress> {
        self.tours.get(tour_id)
    }

    pub fn track_positions(&self) -> &HashMap<String, f64> {
        &self.tracks
    }

    pub fn tours(&self) -> &HashMap<String, TourProgress> {
        &self.tours
    }

    /// Replace contents with previously persisted maps
    pub fn restore(&mut self, tracks: HashMap<String, f64>, tours: HashMap<String, TourProgress>) {
        self.tracks = tracks;
        self.tours = tours;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_position_overwritten_on_each_tick() {
        let mut progress = ProgressStore::new();
        progress.record_position("t1", None, 12.0, 100.0);
        progress.record_position("t1", None, 13.0, 100.0);

        assert_eq!(progress.track_position("t1"), Some(13.0));
        assert!(progress.tours().is_empty());
    }

    #[test]
    fn tour_tracks_last_position_and_duration() {
        let mut progress = ProgressStore::new();
        progress.record_position("t1", Some("tour-A"), 25.0, 100.0);
        progress.record_position("t1", Some("tour-A"), 50.0, 100.0);

        let tour = progress.tour("tour-A").unwrap();
        assert_eq!(tour.last_position, 50.0);
        assert_eq!(tour.total_duration, 100.0);
        assert!(tour.completed_segments.is_empty());
    }

    #[test]
    fn completing_segment_is_idempotent() {
        let mut progress = ProgressStore::new();

        assert!(progress.complete_segment("tour-A", "t1"));
        assert!(!progress.complete_segment("tour-A", "t1"));
        assert!(progress.complete_segment("tour-A", "t2"));

        let tour = progress.tour("tour-A").unwrap();
        assert_eq!(tour.completed_segments.len(), 2);
    }
}

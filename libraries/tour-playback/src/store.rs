//! Persistence hooks
//!
//! The engine does not own durable storage. It can export its settings and
//! progress as a [`PersistedState`] and write it to any [`KeyValueStore`]
//! the platform provides (local storage, preferences file, ...).

use crate::error::Result;
use crate::progress::TourProgress;
use crate::types::PlaybackSettings;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const SETTINGS_KEY: &str = "playback.settings";
pub const TRACK_PROGRESS_KEY: &str = "playback.track_progress";
pub const TOUR_PROGRESS_KEY: &str = "playback.tour_progress";

/// String key-value storage provided by the platform
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
}

/// In-memory store, mainly for tests and headless runs
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }
}

/// Everything that survives a restart
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub settings: PlaybackSettings,
    pub track_progress: HashMap<String, f64>,
    pub tour_progress: HashMap<String, TourProgress>,
}

/// Write settings only
pub fn save_settings(store: &mut dyn KeyValueStore, settings: &PlaybackSettings) -> Result<()> {
    store.set(SETTINGS_KEY, serde_json::to_string(settings)?);
    Ok(())
}

/// Write track and tour progress only
pub fn save_progress(
    store: &mut dyn KeyValueStore,
    track_progress: &HashMap<String, f64>,
    tour_progress: &HashMap<String, TourProgress>,
) -> Result<()> {
    store.set(TRACK_PROGRESS_KEY, serde_json::to_string(track_progress)?);
    store.set(TOUR_PROGRESS_KEY, serde_json::to_string(tour_progress)?);
    Ok(())
}

/// Write the full persisted state under the fixed keys
pub fn save_state(store: &mut dyn KeyValueStore, state: &PersistedState) -> Result<()> {
    save_settings(store, &state.settings)?;
    save_progress(store, &state.track_progress, &state.tour_progress)
}

/// Read persisted state; missing keys fall back to defaults
pub fn load_state(store: &dyn KeyValueStore) -> Result<PersistedState> {
    let mut state = PersistedState::default();

    if let Some(raw) = store.get(SETTINGS_KEY) {
        state.settings = serde_json::from_str(&raw)?;
    }
    if let Some(raw) = store.get(TRACK_PROGRESS_KEY) {
        state.track_progress = serde_json::from_str(&raw)?;
    }
    if let Some(raw) = store.get(TOUR_PROGRESS_KEY) {
        state.tour_progress = serde_json::from_str(&raw)?;
    }

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlaybackError;
    use crate::types::Quality;

    #[test]
    fn empty_store_loads_defaults() {
        let store = MemoryStore::new();
        let state = load_state(&store).unwrap();
        assert_eq!(state, PersistedState::default());
    }

    #[test]
    fn saved_state_is_read_back() {
        let mut store = MemoryStore::new();
        let mut state = PersistedState::default();
        state.settings.preferred_quality = Quality::High;
        state.track_progress.insert("t1".into(), 42.5);
        state.tour_progress.insert(
            "tour-A".into(),
            TourProgress {
                last_position: 42.5,
                completed_segments: ["t0".to_string()].into(),
                total_duration: 90.0,
            },
        );

        save_state(&mut store, &state).unwrap();
        assert!(store.get(SETTINGS_KEY).unwrap().contains("\"high\""));

        assert_eq!(load_state(&store).unwrap(), state);
    }

    #[test]
    fn corrupt_entry_is_a_persistence_error() {
        let mut store = MemoryStore::new();
        store.set(SETTINGS_KEY, "{not json".into());

        let err = load_state(&store).unwrap_err();
        assert!(matches!(err, PlaybackError::Persistence(_)));
    }
}

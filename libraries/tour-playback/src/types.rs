//! Core types for playback management

use serde::{Deserialize, Serialize};
use std::fmt;

/// Track information supplied by the tour catalog
///
/// Immutable once constructed. The engine never fetches or validates
/// catalog data, it only plays what it is handed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Unique track identifier from the catalog
    pub id: String,

    /// Locator handed to the media backend (URL or file path)
    pub source_locator: String,

    /// Track title
    pub title: String,

    /// Tour this track is a stop of (optional)
    #[serde(default)]
    pub tour_id: Option<String>,

    /// Duration estimate from the catalog, in seconds (optional)
    #[serde(default)]
    pub estimated_duration: Option<f64>,
}

impl Track {
    /// Create a track that does not belong to a tour
    pub fn new(
        id: impl Into<String>,
        source_locator: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_locator: source_locator.into(),
            title: title.into(),
            tour_id: None,
            estimated_duration: None,
        }
    }

    /// Attach the track to a tour
    #[must_use]
    pub fn with_tour(mut self, tour_id: impl Into<String>) -> Self {
        self.tour_id = Some(tour_id.into());
        self
    }

    /// Attach a catalog duration estimate (seconds)
    #[must_use]
    pub fn with_estimated_duration(mut self, seconds: f64) -> Self {
        self.estimated_duration = Some(seconds);
        self
    }
}

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// No track loaded
    Idle,

    /// Backend is resolving/buffering the source
    Loading,

    /// Currently playing
    Playing,

    /// Paused mid-track
    Paused,

    /// Reached the end of the current track
    Ended,

    /// Load failed (transient, folds into `Idle`)
    Error,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Loading => "loading",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
            PlaybackState::Ended => "ended",
            PlaybackState::Error => "error",
        };
        f.write_str(name)
    }
}

/// Preferred stream quality, applied on the next load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    Standard,
    High,
}

/// User-configurable playback settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSettings {
    /// Quality requested from the backend on load
    #[serde(default, alias = "preferred_quality")]
    pub preferred_quality: Quality,

    /// Continue with the next queued track when one ends
    #[serde(default = "default_autoplay")]
    pub autoplay: bool,
}

fn default_autoplay() -> bool {
    true
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            preferred_quality: Quality::Standard,
            autoplay: default_autoplay(),
        }
    }
}

impl PlaybackSettings {
    /// Shallow-merge a partial update into these settings
    pub fn merge(&mut self, update: SettingsUpdate) {
        if let Some(quality) = update.preferred_quality {
            self.preferred_quality = quality;
        }
        if let Some(autoplay) = update.autoplay {
            self.autoplay = autoplay;
        }
    }
}

/// Partial settings update (unset fields are left untouched)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    #[serde(default)]
    pub preferred_quality: Option<Quality>,
    #[serde(default)]
    pub autoplay: Option<bool>,
}

/// Identifier of one load attempt
///
/// Every `load_and_play` allocates a fresh, strictly increasing id. Backend
/// messages carry the id of the attempt they belong to so completions of
/// superseded attempts can be discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RequestId(u64);

impl RequestId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    pub(crate) fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

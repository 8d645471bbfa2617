//! Tour manifest files
//!
//! A manifest lists the stops of one tour in walking order:
//!
//! ```json
//! {
//!   "id": "old-town",
//!   "title": "Old Town Walk",
//!   "stops": [
//!     { "id": "gate", "title": "Main Gate", "audio": "audio/gate.mp3", "duration": 95.0 }
//!   ]
//! }
//! ```

use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tour_playback::Track;

/// One narrated stop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourStop {
    pub id: String,
    pub title: String,

    /// Audio locator handed to the backend
    pub audio: String,

    /// Length in seconds, if known up front
    #[serde(default)]
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourManifest {
    pub id: String,
    pub title: String,
    pub stops: Vec<TourStop>,
}

impl TourManifest {
    /// Read and validate a manifest from a JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tour manifest {}", path.display()))?;
        let manifest: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid tour manifest {}", path.display()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.stops.is_empty(), "Tour '{}' has no stops", self.id);

        let mut seen = HashSet::new();
        for stop in &self.stops {
            ensure!(
                seen.insert(stop.id.as_str()),
                "Tour '{}' lists stop '{}' twice",
                self.id,
                stop.id
            );
        }

        Ok(())
    }

    /// Stops as playable tracks, in walking order
    pub fn tracks(&self) -> Vec<Track> {
        self.stops
            .iter()
            .map(|stop| {
                let track = Track::new(&stop.id, &stop.audio, &stop.title).with_tour(&self.id);
                match stop.duration {
                    Some(duration) => track.with_estimated_duration(duration),
                    None => track,
                }
            })
            .collect()
    }
}

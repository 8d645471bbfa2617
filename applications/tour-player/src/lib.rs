//! Tour Player Library
//!
//! Headless driver for the tour playback engine: reads tour manifests,
//! plays them through a simulated backend and keeps progress in a JSON
//! state file.
//!
//! This library exposes the building blocks for testing purposes.

pub mod file_store;
pub mod manifest;
pub mod simulated;
pub mod tour;

pub use file_store::JsonFileStore;
pub use manifest::{TourManifest, TourStop};
pub use simulated::{SimulatedBackend, SimulationOptions};
pub use tour::TourOutcome;

//! Error types for playback management

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Backend could not resolve or buffer the source
    #[error("Failed to load track: {0}")]
    Load(String),

    /// Platform refused to start playback (e.g. autoplay restriction)
    #[error("Playback was rejected: {0}")]
    PlaybackRejected(String),

    /// Source failed after it had started playing
    #[error("Playback failed: {0}")]
    Playback(String),

    /// The engine task has shut down
    #[error("Playback engine is closed")]
    EngineClosed,

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Persisted state could not be encoded or decoded
    #[error("Persistence error: {0}")]
    Persistence(#[from] serde_json::Error),
}

impl PlaybackError {
    /// Notification kind for errors that are surfaced to the user
    pub fn notification_kind(&self) -> Option<NotificationKind> {
        match self {
            PlaybackError::Load(_) => Some(NotificationKind::LoadError),
            PlaybackError::PlaybackRejected(_) | PlaybackError::Playback(_) => {
                Some(NotificationKind::PlaybackError)
            }
            _ => None,
        }
    }
}

/// Kind of user-facing notification raised by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    /// Loading the source failed
    LoadError,

    /// Starting playback failed
    PlaybackError,
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surfaced_errors_map_to_notifications() {
        assert_eq!(
            PlaybackError::Load("404".into()).notification_kind(),
            Some(NotificationKind::LoadError)
        );
        assert_eq!(
            PlaybackError::PlaybackRejected("NotAllowedError".into()).notification_kind(),
            Some(NotificationKind::PlaybackError)
        );
        assert_eq!(
            PlaybackError::Playback("network".into()).notification_kind(),
            Some(NotificationKind::PlaybackError)
        );
        assert_eq!(PlaybackError::EngineClosed.notification_kind(), None);
    }
}

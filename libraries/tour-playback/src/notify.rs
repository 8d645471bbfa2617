//! Notification surface
//!
//! The engine reports user-facing failures through a single `notify`
//! capability; rendering is up to the UI.

use crate::error::NotificationKind;
use tracing::warn;

/// Receives user-facing playback failures
pub trait Notifier: Send {
    fn notify(&self, kind: NotificationKind, message: &str);
}

/// Notifier that only writes to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) {
        warn!(?kind, "{}", message);
    }
}

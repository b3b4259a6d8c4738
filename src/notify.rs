//! User-visible notifications raised by background operations.

use std::fmt;
use std::sync::Mutex;

/// Something the user should be told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A save to storage failed. The local edit is kept.
    SaveFailed { what: String, error: String },
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::SaveFailed { what, error } => {
                write!(f, "could not save {what}: {error}")
            }
        }
    }
}

/// Receives notifications for display.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        tracing::warn!("{notification}");
    }
}

/// Keeps notifications in memory, for inspection.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    received: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the notifications received so far.
    pub fn received(&self) -> Vec<Notification> {
        self.received
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        if let Ok(mut received) = self.received.lock() {
            received.push(notification);
        }
    }
}

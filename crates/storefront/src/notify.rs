//! User-facing notifications.
//!
//! The cart service reports failures as short messages pushed to a
//! [`NotificationSink`]. Delivery is fire-and-forget.

use std::sync::{Mutex, PoisonError};

/// How prominently a notification should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Warning,
    Error,
}

/// A message delivered to a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
}

/// Somewhere to surface user-visible messages.
pub trait NotificationSink: Send + Sync {
    fn push(&self, message: &str, severity: Severity);
}

/// Records notifications so callers can display or inspect them later.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    entries: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything pushed so far, oldest first.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages pushed so far, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.notifications()
            .into_iter()
            .map(|n| n.message)
            .collect()
    }

    /// Remove and return everything pushed so far.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.entries.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl NotificationSink for MemoryNotifier {
    fn push(&self, message: &str, severity: Severity) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Notification {
                message: message.to_string(),
                severity,
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_notifier_records_in_order() {
        let notifier = MemoryNotifier::new();
        notifier.push("first", Severity::Error);
        notifier.push("second", Severity::Warning);

        assert_eq!(notifier.messages(), vec!["first", "second"]);
        assert_eq!(notifier.notifications()[0].severity, Severity::Error);
    }

    #[test]
    fn test_drain_empties() {
        let notifier = MemoryNotifier::new();
        notifier.push("only", Severity::Warning);

        assert_eq!(notifier.drain().len(), 1);
        assert!(notifier.notifications().is_empty());
    }
}

//! Notification sink trait and implementations.

use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Success,
    Error,
    Warning,
    Info,
}

/// A user-facing toast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub variant: Variant,
}

impl Notification {
    pub fn new(title: impl Into<String>, message: impl Into<String>, variant: Variant) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            variant,
        }
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, message, Variant::Success)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, message, Variant::Error)
    }
}

/// Where user-facing notifications go. Fire-and-forget.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotificationSink;

impl NotificationSink for TracingNotificationSink {
    fn notify(&self, notification: Notification) {
        match notification.variant {
            Variant::Error => tracing::error!(
                title = %notification.title,
                message = %notification.message,
                "notification"
            ),
            Variant::Warning => tracing::warn!(
                title = %notification.title,
                message = %notification.message,
                "notification"
            ),
            Variant::Success | Variant::Info => tracing::info!(
                title = %notification.title,
                message = %notification.message,
                "notification"
            ),
        }
    }
}

/// Keeps every notification in memory, in emission order.
///
/// Clones share the same feed, so a host can hand one clone to the manager
/// and read the feed through another.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotificationSink {
    notifications: Arc<RwLock<Vec<Notification>>>,
}

impl RecordingNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all notifications emitted so far.
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self) -> usize {
        self.notifications
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns the most recent notification.
    pub fn last(&self) -> Option<Notification> {
        self.notifications
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    pub fn clear(&self) {
        self.notifications
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl NotificationSink for RecordingNotificationSink {
    fn notify(&self, notification: Notification) {
        tracing::debug!(
            title = %notification.title,
            variant = ?notification.variant,
            "notification recorded"
        );
        self.notifications
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}

//! User-facing notifications emitted by write operations.

use serde::Serialize;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Failure,
}

/// A transient message for the user, such as a toast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl Notification {
    pub fn new(
        kind: NotificationKind,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            title: title.into(),
            description: description.into(),
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, title, description)
    }

    pub fn failure(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NotificationKind::Failure, title, description)
    }
}

/// Receives notifications; closures taking a [`Notification`] qualify.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

impl<F> NotificationSink for F
where
    F: Fn(Notification) + Send + Sync,
{
    fn notify(&self, notification: Notification) {
        self(notification)
    }
}

/// Sink that writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Success => info!(
                notification_id = %notification.id,
                title = %notification.title,
                description = %notification.description,
                "Notification"
            ),
            NotificationKind::Failure => warn!(
                notification_id = %notification.id,
                title = %notification.title,
                description = %notification.description,
                "Notification"
            ),
        }
    }
}

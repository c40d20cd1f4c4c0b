//! Presentation-agnostic notification seam.
//!
//! The flow reports every outcome through a sink; it never renders
//! anything itself. A modal sink should resolve `notify` when the user
//! acknowledges, which lets the flow sequence post-acknowledge work (such
//! as clearing inputs after a successful redemption).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Kind of notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

/// A structured outcome handed to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    /// Message body. Reason keys and server messages land here.
    pub message: String,
    /// Label for the acknowledge button.
    pub ok_text: String,
}

impl Notification {
    /// Builds a notification with the default acknowledge label.
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            ok_text: "OK".to_string(),
        }
    }
}

/// Receives structured outcomes from the flow.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Delivers a notification. Modal implementations resolve when the
    /// user acknowledges; fire-and-forget implementations resolve at once.
    async fn notify(&self, note: Notification);
}

/// A sink that discards everything.
#[derive(Debug, Default)]
pub struct NullSink;

#[async_trait]
impl NotificationSink for NullSink {
    async fn notify(&self, _note: Notification) {}
}

/// A sink that records notifications in memory, for headless embedders
/// and tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    notes: std::sync::Mutex<Vec<Notification>>,
}

impl MemorySink {
    /// Creates an empty recording sink.
    pub fn new() -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self::default())
    }

    /// Returns all notifications delivered so far, in order.
    pub fn taken(&self) -> Vec<Notification> {
        self.notes.lock().unwrap().clone()
    }

    /// Returns the most recent notification, if any.
    pub fn last(&self) -> Option<Notification> {
        self.notes.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl NotificationSink for MemorySink {
    async fn notify(&self, note: Notification) {
        self.notes.lock().unwrap().push(note);
    }
}

//! Redemption outcomes and the history record.

use crate::ids::RecordId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Handle for an asynchronous server-side redemption job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskHandle {
    /// Server-assigned task identifier, polled until terminal.
    pub id: String,
}

impl TaskHandle {
    /// Creates a handle from a server-assigned id.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Status of an asynchronous redemption task, as reported by the server.
///
/// Wire form: `{"status": "pending" | "success" | "failure", "message"?: ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TaskStatus {
    /// Task is still running; poll again.
    Pending,
    /// Task finished successfully.
    Success {
        /// Optional receipt or confirmation message.
        #[serde(default)]
        message: Option<String>,
    },
    /// Task failed.
    Failure {
        /// Server-provided failure reason.
        #[serde(default)]
        message: String,
    },
}

impl TaskStatus {
    /// Returns true for `Success` and `Failure`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Terminal outcome of a redemption attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RedemptionOutcome {
    /// Redemption succeeded.
    Success {
        /// Optional receipt text from the server.
        receipt: Option<String>,
    },
    /// Server accepted the submission as an asynchronous task.
    Pending(TaskHandle),
    /// Redemption failed.
    Failure {
        /// Failure reason, surfaced to the user.
        reason: String,
    },
}

/// A successful redemption, recorded append-only.
///
/// Created only after a terminal `Success`; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Unique record id.
    pub id: RecordId,
    /// The normalized code that was redeemed.
    pub code: String,
    /// The credential used for the redemption.
    pub token: String,
    /// Product context tag the redemption was routed through.
    pub product_context: String,
    /// When the redemption completed.
    pub timestamp: DateTime<Utc>,
}

impl HistoryRecord {
    /// Creates a record for a redemption that just completed.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        token: impl Into<String>,
        product_context: impl Into<String>,
    ) -> Self {
        Self {
            id: RecordId::new(),
            code: code.into(),
            token: token.into(),
            product_context: product_context.into(),
            timestamp: Utc::now(),
        }
    }
}

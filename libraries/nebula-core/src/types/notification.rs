/// User-facing transient notifications
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// Informational message
    Info,

    /// Recoverable failure
    Error,
}

/// Short-lived notification banner content
///
/// Every recovered backend failure and every informational milestone
/// (import finished, device switched) surfaces as one of these. The view
/// layer is expected to dismiss it after [`Notification::dismiss_after`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Message text
    pub message: String,

    /// Severity flag
    pub severity: Severity,
}

/// Auto-dismiss delay for informational notifications
const INFO_DISMISS: Duration = Duration::from_secs(3);

/// Auto-dismiss delay for error notifications
const ERROR_DISMISS: Duration = Duration::from_secs(6);

impl Notification {
    /// Create an informational notification
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Info,
        }
    }

    /// Create an error notification
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Error,
        }
    }

    /// How long the banner stays visible (errors linger longer)
    pub fn dismiss_after(&self) -> Duration {
        match self.severity {
            Severity::Info => INFO_DISMISS,
            Severity::Error => ERROR_DISMISS,
        }
    }
}

//! # Notification Errors
//!
//! Nothing here ever reaches an HTTP client: the dispatcher logs these and
//! moves on.

use thiserror::Error;

/// Notification delivery errors.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// SMTP settings are missing or unusable.
    #[error("Notifier not configured: {0}")]
    NotConfigured(String),

    /// A sender or recipient address failed to parse.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// The transport rejected or dropped the message.
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// The dispatcher queue is at capacity.
    #[error("Notification queue is full")]
    QueueFull,

    /// The dispatcher has shut down.
    #[error("Notification channel closed")]
    ChannelClosed,
}

impl NotifyError {
    /// Whether retrying the same message can succeed.
    ///
    /// Bad addresses and missing configuration fail the same way every time.
    pub fn is_transient(&self) -> bool {
        matches!(self, NotifyError::SendFailed(_))
    }
}

/// Result type for notification operations.
pub type NotifyResult<T> = Result<T, NotifyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_send_failures_are_retried() {
        assert!(NotifyError::SendFailed("timeout".into()).is_transient());
        assert!(!NotifyError::InvalidAddress("nope".into()).is_transient());
        assert!(!NotifyError::NotConfigured("host".into()).is_transient());
    }
}

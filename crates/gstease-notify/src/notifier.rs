//! # Notifiers
//!
//! Delivery backends behind one trait.
//!
//! | Notifier            | Used when                                   |
//! |---------------------|---------------------------------------------|
//! | [`SmtpNotifier`]    | `smtp.enabled = true`                       |
//! | [`LogNotifier`]     | SMTP disabled: messages are only logged     |
//! | [`RecordingNotifier`] | tests: keeps every message, can fail on cue |

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{NotifyError, NotifyResult};
use crate::message::EmailMessage;

/// A delivery backend.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers one message.
    async fn send(&self, message: &EmailMessage) -> NotifyResult<()>;

    /// Checks that the backend is reachable.
    async fn health_check(&self) -> NotifyResult<()> {
        Ok(())
    }

    /// Backend name for logs.
    fn name(&self) -> &'static str;
}

// =============================================================================
// SMTP
// =============================================================================

/// SMTP settings (`smtp.*` in configuration).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        SmtpConfig {
            enabled: false,
            host: "smtp.gmail.com".to_string(),
            port: 587,
            user: String::new(),
            password: String::new(),
            from_email: "noreply@example.com".to_string(),
            from_name: "GST Ease Suite".to_string(),
        }
    }
}

/// Sends mail through an SMTP relay with STARTTLS.
pub struct SmtpNotifier {
    from: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpNotifier {
    /// Builds the transport. No connection is made until the first send.
    pub fn new(config: &SmtpConfig) -> NotifyResult<Self> {
        if config.host.trim().is_empty() {
            return Err(NotifyError::NotConfigured("smtp.host is empty".to_string()));
        }
        if config.user.is_empty() || config.password.is_empty() {
            return Err(NotifyError::NotConfigured(
                "smtp.user and smtp.password are required".to_string(),
            ));
        }

        let from: Mailbox = format!("{} <{}>", config.from_name, config.from_email)
            .parse()
            .map_err(|e| NotifyError::InvalidAddress(format!("from address: {}", e)))?;

        let creds = Credentials::new(config.user.clone(), config.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| NotifyError::NotConfigured(format!("SMTP relay: {}", e)))?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(SmtpNotifier { from, transport })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, message: &EmailMessage) -> NotifyResult<()> {
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|e| NotifyError::InvalidAddress(format!("{}: {}", message.to, e)))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&message.subject)
            .multipart(MultiPart::alternative_plain_html(
                message.body_text.clone(),
                message.body_html.clone(),
            ))
            .map_err(|e| NotifyError::SendFailed(format!("failed to build message: {}", e)))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| NotifyError::SendFailed(e.to_string()))?;

        info!(to = %message.to, subject = %message.subject, "Email sent");
        Ok(())
    }

    async fn health_check(&self) -> NotifyResult<()> {
        let ok = self
            .transport
            .test_connection()
            .await
            .map_err(|e| NotifyError::SendFailed(format!("SMTP connection test: {}", e)))?;

        if ok {
            Ok(())
        } else {
            Err(NotifyError::SendFailed("SMTP server did not respond".to_string()))
        }
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}

// =============================================================================
// Log-only
// =============================================================================

/// Logs each message instead of sending it.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &EmailMessage) -> NotifyResult<()> {
        info!(to = %message.to, subject = %message.subject, "Email not sent (SMTP disabled)");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Picks the backend for the given settings.
pub fn from_config(config: &SmtpConfig) -> NotifyResult<Arc<dyn Notifier>> {
    if config.enabled {
        Ok(Arc::new(SmtpNotifier::new(config)?))
    } else {
        debug!("SMTP disabled, using log notifier");
        Ok(Arc::new(LogNotifier))
    }
}

// =============================================================================
// Recording (tests)
// =============================================================================

/// Keeps every delivered message in memory.
///
/// `failing(n)` makes the first `n` sends fail with a transient error;
/// `unreachable(to)` fails every send to one recipient.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<EmailMessage>>,
    failures_left: AtomicU32,
    unreachable: Option<String>,
    attempts: AtomicU32,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(n: u32) -> Self {
        RecordingNotifier {
            failures_left: AtomicU32::new(n),
            ..Self::default()
        }
    }

    pub fn unreachable(to: impl Into<String>) -> Self {
        RecordingNotifier {
            unreachable: Some(to.into()),
            ..Self::default()
        }
    }

    /// Messages delivered so far.
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Send calls so far, failed ones included.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: &EmailMessage) -> NotifyResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let should_fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail || self.unreachable.as_deref() == Some(message.to.as_str()) {
            return Err(NotifyError::SendFailed("injected failure".to_string()));
        }

        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message.clone());
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> EmailMessage {
        EmailMessage {
            to: "buyer@example.com".to_string(),
            subject: "Invoice INV-000001".to_string(),
            body_text: "hello".to_string(),
            body_html: "<p>hello</p>".to_string(),
        }
    }

    #[test]
    fn test_disabled_smtp_falls_back_to_log() {
        let notifier = from_config(&SmtpConfig::default()).unwrap();
        assert_eq!(notifier.name(), "log");
    }

    #[test]
    fn test_enabled_smtp_requires_credentials() {
        let config = SmtpConfig {
            enabled: true,
            ..SmtpConfig::default()
        };
        assert!(matches!(from_config(&config), Err(NotifyError::NotConfigured(_))));
    }

    #[test]
    fn test_bad_from_address_is_rejected() {
        let config = SmtpConfig {
            enabled: true,
            user: "user".to_string(),
            password: "secret".to_string(),
            from_email: "not an address".to_string(),
            ..SmtpConfig::default()
        };
        assert!(matches!(
            SmtpNotifier::new(&config),
            Err(NotifyError::InvalidAddress(_))
        ));
    }

    #[tokio::test]
    async fn test_recording_notifier_fails_on_cue() {
        let notifier = RecordingNotifier::failing(1);

        assert!(notifier.send(&message()).await.is_err());
        assert!(notifier.send(&message()).await.is_ok());
        assert_eq!(notifier.attempts(), 2);
        assert_eq!(notifier.sent().len(), 1);

        let notifier = RecordingNotifier::unreachable("ops@example.com");
        assert!(notifier.send(&message()).await.is_ok());
        let bounced = EmailMessage {
            to: "ops@example.com".to_string(),
            ..message()
        };
        assert!(notifier.send(&bounced).await.is_err());
        assert!(notifier.send(&bounced).await.is_err());
    }
}

//! # gstease-notify: Notification Dispatch for GST Ease
//!
//! Best-effort email for two events: an invoice was created for a customer
//! with an email address, and a product fell to its low-stock threshold.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  apps/api ── InvoiceWorkflow / stock handlers                          │
//! │       │  (after commit)                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  gstease-notify (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │  DispatcherHandle ──mpsc──► Dispatcher ──► dyn Notifier        │   │
//! │  │   (enqueue, shutdown)        (retry,        ├─ SmtpNotifier    │   │
//! │  │                               backoff)      ├─ LogNotifier     │   │
//! │  │                                             └─ Recording...    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed or dropped notification never changes the outcome of the
//! operation that produced it.
//!
//! ## Usage
//! ```rust,ignore
//! let notifier = gstease_notify::from_config(&config.smtp)?;
//! let (dispatcher, handle) = Dispatcher::new(notifier, DispatcherConfig::default());
//! tokio::spawn(dispatcher.run());
//!
//! if let Err(e) = handle.enqueue(Notification::LowStock(alert)) {
//!     warn!(error = %e, "Notification not queued");
//! }
//! ```

pub mod dispatcher;
pub mod error;
pub mod message;
pub mod notifier;

pub use dispatcher::{Dispatcher, DispatcherConfig, DispatcherHandle};
pub use error::{NotifyError, NotifyResult};
pub use message::{EmailMessage, Notification};
pub use notifier::{from_config, LogNotifier, Notifier, RecordingNotifier, SmtpConfig, SmtpNotifier};

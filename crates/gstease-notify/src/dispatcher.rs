//! # Notification Dispatcher
//!
//! Delivers notifications on a background task so request handlers never
//! wait on SMTP.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Notification Dispatch                                │
//! │                                                                         │
//! │  InvoiceWorkflow (after COMMIT)                                        │
//! │       │  handle.enqueue(Notification)   ← try_send: never blocks,      │
//! │       │                                   full queue → QueueFull       │
//! │       ▼                                                                 │
//! │  ┌──────────────── mpsc (queue_capacity) ─────────────────┐            │
//! │  └───────────────────────────┬─────────────────────────────┘            │
//! │                              ▼                                          │
//! │  Dispatcher::run                                                       │
//! │    1. render(company_name, admin_email)  → None: skip                  │
//! │    2. spawn the delivery into a JoinSet (≤ max_in_flight at once)      │
//! │         notifier.send(..)                                              │
//! │         SendFailed      → retry with exponential backoff              │
//! │         InvalidAddress  → give up at once                              │
//! │    3. still failing after max_retry → warn! and drop                   │
//! │                                                                         │
//! │  A message stuck in retries holds one slot; the rest keep flowing.     │
//! │                                                                         │
//! │  shutdown(): stop accepting, deliver what is queued, wait for          │
//! │              in-flight deliveries, exit                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use backoff::future::retry;
use backoff::ExponentialBackoff;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use crate::error::{NotifyError, NotifyResult};
use crate::message::{EmailMessage, Notification};
use crate::notifier::Notifier;

/// Dispatcher settings.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Pending notifications held before `enqueue` starts refusing.
    pub queue_capacity: usize,

    /// Delay before the first retry.
    pub initial_retry: Duration,

    /// Total time spent retrying one message.
    pub max_retry: Duration,

    /// Deliveries running at once. A message being retried keeps its slot.
    pub max_in_flight: usize,

    /// Sender name used in subjects and footers.
    pub company_name: String,

    /// Recipient for low-stock alerts; alerts are skipped without it.
    pub admin_email: Option<String>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        DispatcherConfig {
            queue_capacity: 256,
            initial_retry: Duration::from_millis(500),
            max_retry: Duration::from_secs(60),
            max_in_flight: 8,
            company_name: "GST Ease Suite".to_string(),
            admin_email: None,
        }
    }
}

/// Background task that drains the notification queue.
pub struct Dispatcher {
    notifier: Arc<dyn Notifier>,
    config: DispatcherConfig,
    rx: mpsc::Receiver<Notification>,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for enqueueing notifications and stopping the dispatcher.
#[derive(Clone)]
pub struct DispatcherHandle {
    tx: mpsc::Sender<Notification>,
    shutdown_tx: mpsc::Sender<()>,
}

impl DispatcherHandle {
    /// Queues a notification without waiting.
    pub fn enqueue(&self, notification: Notification) -> NotifyResult<()> {
        self.tx.try_send(notification).map_err(|e| match e {
            TrySendError::Full(_) => NotifyError::QueueFull,
            TrySendError::Closed(_) => NotifyError::ChannelClosed,
        })
    }

    /// Triggers graceful shutdown.
    pub async fn shutdown(&self) -> NotifyResult<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| NotifyError::ChannelClosed)
    }
}

impl Dispatcher {
    /// Creates a dispatcher and returns a handle.
    pub fn new(notifier: Arc<dyn Notifier>, config: DispatcherConfig) -> (Self, DispatcherHandle) {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let dispatcher = Dispatcher {
            notifier,
            config,
            rx,
            shutdown_rx,
        };

        (dispatcher, DispatcherHandle { tx, shutdown_tx })
    }

    /// Runs the dispatch loop.
    ///
    /// This should be spawned as a background task.
    pub async fn run(mut self) {
        info!(notifier = self.notifier.name(), "Notification dispatcher starting");

        let limit = self.config.max_in_flight.max(1);
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    log_join(joined);
                }

                maybe = self.rx.recv(), if in_flight.len() < limit => match maybe {
                    Some(notification) => self.spawn_delivery(&mut in_flight, notification),
                    // Every handle dropped
                    None => break,
                },

                _ = self.shutdown_rx.recv() => {
                    info!(in_flight = in_flight.len(), "Notification dispatcher shutting down");
                    self.rx.close();
                    while let Some(notification) = self.rx.recv().await {
                        if in_flight.len() >= limit {
                            if let Some(joined) = in_flight.join_next().await {
                                log_join(joined);
                            }
                        }
                        self.spawn_delivery(&mut in_flight, notification);
                    }
                    break;
                }
            }
        }

        while let Some(joined) = in_flight.join_next().await {
            log_join(joined);
        }

        info!("Notification dispatcher stopped");
    }

    fn spawn_delivery(&self, in_flight: &mut JoinSet<()>, notification: Notification) {
        let kind = notification.kind();
        let Some(message) =
            notification.render(&self.config.company_name, self.config.admin_email.as_deref())
        else {
            debug!(kind, "No recipient, notification skipped");
            return;
        };

        let policy = ExponentialBackoff {
            initial_interval: self.config.initial_retry,
            max_elapsed_time: Some(self.config.max_retry),
            ..Default::default()
        };

        in_flight.spawn(deliver(self.notifier.clone(), policy, kind, message));
    }
}

async fn deliver(
    notifier: Arc<dyn Notifier>,
    policy: ExponentialBackoff,
    kind: &'static str,
    message: EmailMessage,
) {
    let result = retry(policy, || async {
        notifier.send(&message).await.map_err(|e| {
            if e.is_transient() {
                debug!(kind, error = %e, "Notification attempt failed");
                backoff::Error::transient(e)
            } else {
                backoff::Error::permanent(e)
            }
        })
    })
    .await;

    match result {
        Ok(()) => debug!(kind, to = %message.to, "Notification delivered"),
        Err(e) => warn!(kind, to = %message.to, error = %e, "Notification dropped"),
    }
}

fn log_join(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        error!(error = %e, "Notification delivery task failed");
    }
}

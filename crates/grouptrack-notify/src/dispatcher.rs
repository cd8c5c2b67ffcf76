//! Fire-and-forget notification dispatch
//!
//! ```text
//! engine ──Transition──▶ Orchestrator ──dispatch()──▶ unbounded mpsc ──▶ worker ──▶ INotifier
//! ```
//!
//! `dispatch` never blocks and never fails. A single worker delivers in
//! enqueue order; a slow or failing sink delays only later notifications,
//! never snapshot processing.

use std::sync::Arc;

use grouptrack_core::domain::MembershipEvent;
use grouptrack_core::ports::{INotifier, Notification};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::message::{render, MessageOptions};

/// Queues notifications for background delivery
pub struct NotificationDispatcher {
    tx: mpsc::UnboundedSender<Notification>,
    worker: JoinHandle<()>,
    options: MessageOptions,
}

impl NotificationDispatcher {
    /// Spawns the delivery worker on the current tokio runtime
    pub fn spawn(notifier: Arc<dyn INotifier>, options: MessageOptions) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Notification>();

        let worker = tokio::spawn(async move {
            while let Some(notification) = rx.recv().await {
                match notifier.notify(&notification).await {
                    Ok(()) => debug!(summary = notification.summary(), "Notification delivered"),
                    Err(e) => warn!(
                        error = %format!("{e:#}"),
                        summary = notification.summary(),
                        "Notification delivery failed"
                    ),
                }
            }
            debug!("Notification queue closed");
        });

        Self {
            tx,
            worker,
            options,
        }
    }

    /// Enqueues a notification without waiting for delivery
    pub fn dispatch(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            warn!("Notification worker has stopped, dropping notification");
        }
    }

    /// Renders and enqueues each event in order
    pub fn dispatch_events(&self, events: &[MembershipEvent]) {
        for event in events {
            self.dispatch(render(event, &self.options));
        }
    }

    pub fn options(&self) -> &MessageOptions {
        &self.options
    }

    /// Stops accepting notifications and waits for the queue to drain
    pub async fn close(self) {
        drop(self.tx);
        if let Err(e) = self.worker.await {
            warn!(error = %e, "Notification worker terminated abnormally");
        }
    }
}

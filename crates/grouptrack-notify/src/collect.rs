//! In-memory notification sink
//!
//! Records every delivered notification; optionally fails every delivery.
//! Intended for tests of code that dispatches notifications.

use std::sync::{Arc, Mutex};

use grouptrack_core::ports::{INotifier, Notification};

/// Notifier that stores what it receives
#[derive(Debug, Default, Clone)]
pub struct CollectingNotifier {
    received: Arc<Mutex<Vec<Notification>>>,
    fail: bool,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose deliveries all fail after being recorded
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Everything received so far, in delivery order
    pub fn received(&self) -> Vec<Notification> {
        self.received
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl INotifier for CollectingNotifier {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        if let Ok(mut received) = self.received.lock() {
            received.push(notification.clone());
        }
        if self.fail {
            anyhow::bail!("delivery refused");
        }
        Ok(())
    }
}

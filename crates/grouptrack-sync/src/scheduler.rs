//! Change scheduler - forwards debounced snapshot events into the event loop
//!
//! The [`ChangeScheduler`] sits between the [`FileWatcher`](super::watcher::FileWatcher)
//! and the [`Orchestrator`](super::orchestrator::Orchestrator). It receives raw
//! snapshot events, feeds them through a
//! [`DebouncedChangeQueue`](super::watcher::DebouncedChangeQueue), and posts
//! settled events to the loop channel.
//!
//! ## Flow
//!
//! ```text
//! FileWatcher ──→ mpsc::Receiver ──→ ChangeScheduler ──→ LoopEvent::Source
//!                                         │
//!                                   DebouncedChangeQueue
//! ```

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::orchestrator::LoopEvent;
use crate::watcher::{DebouncedChangeQueue, SnapshotEvent};

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Debounces watcher output and forwards it to the event loop
pub struct ChangeScheduler {
    change_rx: mpsc::Receiver<SnapshotEvent>,
    loop_tx: mpsc::Sender<LoopEvent>,
    queue: DebouncedChangeQueue,
    poll_interval: Duration,
}

impl ChangeScheduler {
    /// Creates a new `ChangeScheduler`
    ///
    /// # Arguments
    /// * `change_rx` - Watcher output
    /// * `loop_tx` - Event loop input
    /// * `debounce_delay` - How long a path must be quiet before it is forwarded
    pub fn new(
        change_rx: mpsc::Receiver<SnapshotEvent>,
        loop_tx: mpsc::Sender<LoopEvent>,
        debounce_delay: Duration,
    ) -> Self {
        let poll_interval = (debounce_delay / 4).max(MIN_POLL_INTERVAL);

        info!(
            debounce_ms = debounce_delay.as_millis() as u64,
            poll_ms = poll_interval.as_millis() as u64,
            "Creating change scheduler"
        );

        Self {
            change_rx,
            loop_tx,
            queue: DebouncedChangeQueue::new(debounce_delay),
            poll_interval,
        }
    }

    /// Main loop for the scheduler
    ///
    /// Runs until the watcher channel closes, the loop channel closes, or
    /// `shutdown` is cancelled. When the watcher channel closes, everything
    /// still pending is forwarded before returning.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!("Change scheduler starting");

        let mut poll_timer = tokio::time::interval(self.poll_interval);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!(pending = self.queue.pending_count(), "Change scheduler cancelled");
                    break;
                }

                event = self.change_rx.recv() => {
                    match event {
                        Some(change) => self.queue.push(change),
                        None => {
                            info!("Watcher channel closed, flushing pending changes");
                            let remaining = self.queue.drain();
                            self.forward(remaining).await;
                            break;
                        }
                    }
                }

                _ = poll_timer.tick() => {
                    let settled = self.queue.poll();
                    if !self.forward(settled).await {
                        info!("Event loop closed, change scheduler shutting down");
                        break;
                    }
                }
            }
        }

        info!("Change scheduler stopped");
    }

    /// Returns false once the loop channel has closed
    async fn forward(&self, events: Vec<SnapshotEvent>) -> bool {
        for event in events {
            debug!(path = %event.path().display(), event = ?event, "Settled");
            if self.loop_tx.send(LoopEvent::Source(event)).await.is_err() {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_forwards_one_event_per_rewrite() {
        let (change_tx, change_rx) = mpsc::channel(16);
        let (loop_tx, mut loop_rx) = mpsc::channel(16);
        let scheduler = ChangeScheduler::new(change_rx, loop_tx, Duration::from_millis(100));
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(scheduler.run(shutdown.clone()));

        let path = PathBuf::from("/g/a.json");
        change_tx.send(SnapshotEvent::Added(path.clone())).await.unwrap();
        change_tx.send(SnapshotEvent::Changed(path.clone())).await.unwrap();
        change_tx.send(SnapshotEvent::Changed(path.clone())).await.unwrap();

        match loop_rx.recv().await.unwrap() {
            LoopEvent::Source(event) => assert_eq!(event, SnapshotEvent::Changed(path)),
            other => panic!("unexpected loop event: {other:?}"),
        }

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(loop_rx.try_recv().is_err());

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_flushes_pending_when_watcher_closes() {
        let (change_tx, change_rx) = mpsc::channel(16);
        let (loop_tx, mut loop_rx) = mpsc::channel(16);
        let scheduler = ChangeScheduler::new(change_rx, loop_tx, Duration::from_secs(60));

        change_tx
            .send(SnapshotEvent::Removed(PathBuf::from("/g/a.json")))
            .await
            .unwrap();
        drop(change_tx);

        scheduler.run(CancellationToken::new()).await;

        assert!(matches!(
            loop_rx.recv().await,
            Some(LoopEvent::Source(SnapshotEvent::Removed(_)))
        ));
    }

    #[tokio::test]
    async fn test_exits_on_cancel() {
        let (_change_tx, change_rx) = mpsc::channel(16);
        let (loop_tx, _loop_rx) = mpsc::channel(16);
        let scheduler = ChangeScheduler::new(change_rx, loop_tx, Duration::from_millis(100));
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        tokio::time::timeout(Duration::from_secs(2), scheduler.run(shutdown))
            .await
            .expect("Scheduler should exit when cancelled");
    }
}

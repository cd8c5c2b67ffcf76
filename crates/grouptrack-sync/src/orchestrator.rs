//! Serialized membership event loop
//!
//! The [`Orchestrator`] owns the [`MembershipEngine`] and is the only place
//! engine operations are invoked. Everything that can change membership
//! state arrives as a [`LoopEvent`] on one channel:
//!
//! ```text
//! startup scan ─────────────────────────────┐
//! FileWatcher ──▶ ChangeScheduler ──Source──┤
//! grace timer tasks ─────GraceExpired───────┤
//!                                           ▼
//!                                   mpsc::Receiver ──▶ MembershipEngine
//!                                                             │ Transition
//!                                                             ▼
//!                                  NotificationDispatcher + armed timers
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use grouptrack_core::engine::{GraceTimer, MembershipEngine, Transition};
use grouptrack_notify::NotificationDispatcher;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::scheduler::ChangeScheduler;
use crate::source::{group_tag_for_path, read_snapshot, scan_directory};
use crate::watcher::{FileWatcher, SnapshotEvent};
use crate::SyncError;

const LOOP_CHANNEL_CAPACITY: usize = 1024;

/// Input to the event loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopEvent {
    /// A settled change to a snapshot file
    Source(SnapshotEvent),
    /// A grace timer armed by an earlier departure has fired
    GraceExpired(GraceTimer),
}

/// Drives the engine from snapshot files and grace timers
pub struct Orchestrator {
    engine: MembershipEngine,
    dispatcher: NotificationDispatcher,
    directory: PathBuf,
    debounce_delay: Duration,
    tx: mpsc::Sender<LoopEvent>,
    rx: mpsc::Receiver<LoopEvent>,
}

impl Orchestrator {
    /// Creates an orchestrator for the snapshot files in `directory`
    pub fn new(
        engine: MembershipEngine,
        dispatcher: NotificationDispatcher,
        directory: impl Into<PathBuf>,
        debounce_delay: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::channel(LOOP_CHANNEL_CAPACITY);
        Self {
            engine,
            dispatcher,
            directory: directory.into(),
            debounce_delay,
            tx,
            rx,
        }
    }

    pub fn engine(&self) -> &MembershipEngine {
        &self.engine
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// A sender into the event loop
    pub fn sender(&self) -> mpsc::Sender<LoopEvent> {
        self.tx.clone()
    }

    /// Waits for the next queued loop event
    pub async fn next_event(&mut self) -> Option<LoopEvent> {
        self.rx.recv().await
    }

    /// Processes every snapshot file currently in the directory, in path order
    ///
    /// Returns the number of files processed.
    ///
    /// # Errors
    /// Returns [`SyncError::DirectoryUnavailable`] if the directory cannot be
    /// listed. Individual unreadable or malformed files are logged and skipped.
    #[instrument(skip(self), fields(directory = %self.directory.display()))]
    pub async fn reconcile(&mut self) -> Result<usize, SyncError> {
        let paths = scan_directory(&self.directory)
            .await
            .map_err(|source| SyncError::DirectoryUnavailable {
                path: self.directory.clone(),
                source,
            })?;

        info!(files = paths.len(), "Reconciling snapshot directory");
        for path in &paths {
            self.handle(LoopEvent::Source(SnapshotEvent::Changed(path.clone())))
                .await;
        }
        Ok(paths.len())
    }

    /// Applies one loop event to the engine
    ///
    /// Notifications are dispatched and grace timers armed before returning.
    pub async fn handle(&mut self, event: LoopEvent) -> Transition {
        let transition = match &event {
            LoopEvent::Source(SnapshotEvent::Added(path) | SnapshotEvent::Changed(path)) => {
                self.apply_snapshot(path).await
            }
            LoopEvent::Source(SnapshotEvent::Removed(path)) => self.apply_removal(path).await,
            LoopEvent::GraceExpired(timer) => self.engine.expire_departure(timer).await,
        };

        self.dispatcher.dispatch_events(&transition.events);
        for timer in &transition.timers {
            self.arm_timer(timer.clone());
        }
        transition
    }

    async fn apply_snapshot(&mut self, path: &Path) -> Transition {
        let Some(tag) = group_tag_for_path(path) else {
            debug!(path = %path.display(), "Ignoring non-snapshot file");
            return Transition::default();
        };

        match read_snapshot(path).await {
            Ok(snapshot) => self.engine.process_snapshot(&tag, &snapshot).await,
            Err(e) => {
                warn!(group = %tag, error = %e, "Skipping unreadable snapshot, keeping previous state");
                Transition::default()
            }
        }
    }

    async fn apply_removal(&mut self, path: &Path) -> Transition {
        match group_tag_for_path(path) {
            Some(tag) => self.engine.remove_group(&tag).await,
            None => {
                debug!(path = %path.display(), "Ignoring removal of non-snapshot file");
                Transition::default()
            }
        }
    }

    /// Spawns a task that posts the timer back into the loop after its delay
    fn arm_timer(&self, timer: GraceTimer) {
        debug!(
            member = %timer.member,
            generation = timer.generation,
            delay_secs = timer.delay.as_secs(),
            "Arming grace timer"
        );
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timer.delay).await;
            // A closed loop means shutdown; the departure dies with it.
            let _ = tx.send(LoopEvent::GraceExpired(timer)).await;
        });
    }

    /// Runs until `shutdown` is cancelled
    ///
    /// The watcher is set up before the startup scan so that changes made
    /// during the scan are queued rather than lost; they are processed after
    /// the scan completes.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be listed or watched
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<(), SyncError> {
        let (mut watcher, change_rx) = FileWatcher::new().map_err(SyncError::Watch)?;
        watcher.watch(&self.directory).map_err(SyncError::Watch)?;

        let scheduler = ChangeScheduler::new(change_rx, self.tx.clone(), self.debounce_delay);
        let scheduler_handle = tokio::spawn(scheduler.run(shutdown.child_token()));

        let processed = self.reconcile().await?;
        info!(snapshots = processed, "Startup reconciliation complete, watching for changes");

        loop {
            let event = tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested, stopping event loop");
                    break;
                }
                event = self.rx.recv() => event,
            };

            match event {
                Some(event) => {
                    self.handle(event).await;
                }
                None => break,
            }
        }

        drop(watcher);
        if let Err(e) = scheduler_handle.await {
            warn!(error = %e, "Change scheduler terminated abnormally");
        }
        self.shutdown().await;
        Ok(())
    }

    /// Drains pending notifications and returns the engine
    pub async fn shutdown(self) -> MembershipEngine {
        self.dispatcher.close().await;
        self.engine
    }
}

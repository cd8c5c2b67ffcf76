//! Snapshot directory watching and debounced change queue
//!
//! Provides a [`FileWatcher`] that wraps the `notify` crate to monitor the
//! snapshot directory, converting raw OS events into [`SnapshotEvent`] values.
//!
//! The [`DebouncedChangeQueue`] collects rapid-fire events and coalesces them
//! so that a single rewrite of a snapshot file (create, several writes, maybe
//! a rename) is seen downstream as one change.
//!
//! ## Architecture
//!
//! ```text
//! inotify / kqueue
//!       │
//!       ▼
//!  FileWatcher  ──→  mpsc::channel  ──→  DebouncedChangeQueue  ──→  Orchestrator loop
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

// ============================================================================
// SnapshotEvent
// ============================================================================

/// A change to one file in the snapshot directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotEvent {
    /// A file appeared (created, or renamed into place)
    Added(PathBuf),
    /// An existing file was rewritten
    Changed(PathBuf),
    /// A file disappeared (deleted, or renamed away)
    Removed(PathBuf),
}

impl SnapshotEvent {
    pub fn path(&self) -> &Path {
        match self {
            SnapshotEvent::Added(p) | SnapshotEvent::Changed(p) | SnapshotEvent::Removed(p) => p,
        }
    }
}

// ============================================================================
// FileWatcher
// ============================================================================

/// Watches the snapshot directory using the OS-native mechanism
///
/// Only the directory itself is watched; subdirectories are not snapshots.
///
/// ## Usage
///
/// ```ignore
/// let (mut watcher, rx) = FileWatcher::new()?;
/// watcher.watch(Path::new("./groups"))?;
/// // rx.recv().await to get events
/// ```
pub struct FileWatcher {
    watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Creates a new `FileWatcher`
    ///
    /// Returns the watcher and a receiver channel for consuming events.
    /// Dropping the watcher closes the channel.
    ///
    /// # Errors
    /// Returns an error if the underlying OS watcher cannot be created
    pub fn new() -> Result<(Self, mpsc::Receiver<SnapshotEvent>)> {
        let (event_tx, event_rx) = mpsc::channel::<SnapshotEvent>(1024);

        let watcher = RecommendedWatcher::new(
            move |res: std::result::Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    for change in map_notify_event(&event) {
                        if let Err(e) = event_tx.blocking_send(change) {
                            warn!(error = %e, "Failed to send snapshot event (receiver dropped)");
                        }
                    }
                }
                Err(err) => {
                    error!(error = %err, "File watcher error");
                }
            },
            notify::Config::default(),
        )
        .context("Failed to create file watcher")?;

        Ok((Self { watcher }, event_rx))
    }

    /// Starts watching `dir` (non-recursively)
    ///
    /// # Errors
    /// Returns an error if the path cannot be watched (e.g., does not exist,
    /// insufficient permissions, or inotify watch limit reached)
    pub fn watch(&mut self, dir: &Path) -> Result<()> {
        info!(path = %dir.display(), "Watching snapshot directory");

        self.watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch path: {}", dir.display()))
    }

    /// Stops watching `dir`
    pub fn unwatch(&mut self, dir: &Path) -> Result<()> {
        info!(path = %dir.display(), "Stopping watch");

        self.watcher
            .unwatch(dir)
            .with_context(|| format!("Failed to unwatch path: {}", dir.display()))
    }
}

// ============================================================================
// Event mapping - notify::Event → SnapshotEvent
// ============================================================================

/// Converts a `notify::Event` into zero or more `SnapshotEvent`s
///
/// - `Create(*)` -> `Added`
/// - `Modify(Data(*))` / `Modify(Any)` / `Modify(Other)` -> `Changed`
/// - `Modify(Name(Both))` with 2 paths -> `Removed(old)`, `Added(new)`
/// - `Modify(Name(From))` -> `Removed`, `Modify(Name(To))` -> `Added`
/// - `Remove(*)` -> `Removed`
///
/// Access and metadata events carry no content change and are ignored.
pub(crate) fn map_notify_event(event: &notify::Event) -> Vec<SnapshotEvent> {
    let paths = &event.paths;
    let first = || paths.first().cloned();

    let mapped: Vec<SnapshotEvent> = match &event.kind {
        EventKind::Create(_) => first().map(SnapshotEvent::Added).into_iter().collect(),

        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if paths.len() >= 2 => vec![
            SnapshotEvent::Removed(paths[0].clone()),
            SnapshotEvent::Added(paths[1].clone()),
        ],

        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            first().map(SnapshotEvent::Removed).into_iter().collect()
        }

        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            first().map(SnapshotEvent::Added).into_iter().collect()
        }

        EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),

        EventKind::Modify(_) => first().map(SnapshotEvent::Changed).into_iter().collect(),

        EventKind::Remove(_) => first().map(SnapshotEvent::Removed).into_iter().collect(),

        _ => Vec::new(),
    };

    if mapped.is_empty() {
        debug!(kind = ?event.kind, "Ignoring event kind");
    } else {
        debug!(kind = ?event.kind, events = ?mapped, "Mapped watcher event");
    }
    mapped
}

// ============================================================================
// DebouncedChangeQueue
// ============================================================================

/// Queue that coalesces rapid filesystem changes into debounced events
///
/// When multiple events arrive for the same path in quick succession,
/// only the latest event is kept and its timestamp is reset. Events are only
/// emitted (via [`poll`](DebouncedChangeQueue::poll)) once they have been
/// quiet for longer than the configured debounce delay.
pub struct DebouncedChangeQueue {
    pending: HashMap<PathBuf, (SnapshotEvent, Instant)>,
    debounce_delay: Duration,
}

impl DebouncedChangeQueue {
    pub fn new(debounce_delay: Duration) -> Self {
        Self {
            pending: HashMap::new(),
            debounce_delay,
        }
    }

    /// Inserts or replaces the pending event for the event's path
    ///
    /// Rapid changes to the same file keep extending the debounce window
    /// until the changes stop.
    pub fn push(&mut self, event: SnapshotEvent) {
        let path = event.path().to_path_buf();
        debug!(path = %path.display(), event = ?event, "Enqueuing snapshot event");
        self.pending.insert(path, (event, Instant::now()));
    }

    /// Removes and returns every event quiet for at least the debounce delay
    ///
    /// Settled events are returned sorted by path.
    pub fn poll(&mut self) -> Vec<SnapshotEvent> {
        let now = Instant::now();
        let settled_paths: Vec<PathBuf> = self
            .pending
            .iter()
            .filter(|(_, (_, stamp))| now.duration_since(*stamp) >= self.debounce_delay)
            .map(|(path, _)| path.clone())
            .collect();

        let mut settled: Vec<SnapshotEvent> = settled_paths
            .iter()
            .filter_map(|path| self.pending.remove(path).map(|(event, _)| event))
            .collect();
        settled.sort_by(|a, b| a.path().cmp(b.path()));

        if !settled.is_empty() {
            debug!(count = settled.len(), "Polled settled snapshot events");
        }
        settled
    }

    /// Removes and returns every pending event regardless of age
    pub fn drain(&mut self) -> Vec<SnapshotEvent> {
        let mut all: Vec<SnapshotEvent> = self.pending.drain().map(|(_, (e, _))| e).collect();
        all.sort_by(|a, b| a.path().cmp(b.path()));
        all
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, RemoveKind};

    fn event(kind: EventKind, paths: &[&str]) -> notify::Event {
        let mut e = notify::Event::new(kind);
        for p in paths {
            e = e.add_path(PathBuf::from(p));
        }
        e
    }

    // ------------------------------------------------------------------
    // map_notify_event
    // ------------------------------------------------------------------

    #[test]
    fn test_map_create() {
        let mapped = map_notify_event(&event(EventKind::Create(CreateKind::File), &["/g/a.json"]));
        assert_eq!(mapped, vec![SnapshotEvent::Added(PathBuf::from("/g/a.json"))]);
    }

    #[test]
    fn test_map_data_modify() {
        let mapped = map_notify_event(&event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            &["/g/a.json"],
        ));
        assert_eq!(mapped, vec![SnapshotEvent::Changed(PathBuf::from("/g/a.json"))]);
    }

    #[test]
    fn test_map_rename_both() {
        let mapped = map_notify_event(&event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/g/a.json", "/g/b.json"],
        ));
        assert_eq!(
            mapped,
            vec![
                SnapshotEvent::Removed(PathBuf::from("/g/a.json")),
                SnapshotEvent::Added(PathBuf::from("/g/b.json")),
            ]
        );
    }

    #[test]
    fn test_map_rename_halves() {
        let from = map_notify_event(&event(
            EventKind::Modify(ModifyKind::Name(RenameMode::From)),
            &["/g/a.json"],
        ));
        let to = map_notify_event(&event(
            EventKind::Modify(ModifyKind::Name(RenameMode::To)),
            &["/g/b.json"],
        ));
        assert_eq!(from, vec![SnapshotEvent::Removed(PathBuf::from("/g/a.json"))]);
        assert_eq!(to, vec![SnapshotEvent::Added(PathBuf::from("/g/b.json"))]);
    }

    #[test]
    fn test_map_remove() {
        let mapped = map_notify_event(&event(EventKind::Remove(RemoveKind::File), &["/g/a.json"]));
        assert_eq!(mapped, vec![SnapshotEvent::Removed(PathBuf::from("/g/a.json"))]);
    }

    #[test]
    fn test_map_ignores_access_and_metadata() {
        assert!(map_notify_event(&event(EventKind::Access(AccessKind::Any), &["/g/a.json"])).is_empty());
        assert!(map_notify_event(&event(
            EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)),
            &["/g/a.json"]
        ))
        .is_empty());
    }

    #[test]
    fn test_map_without_paths() {
        assert!(map_notify_event(&event(EventKind::Create(CreateKind::File), &[])).is_empty());
    }

    // ------------------------------------------------------------------
    // DebouncedChangeQueue
    // ------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_poll_waits_for_quiet_period() {
        let mut queue = DebouncedChangeQueue::new(Duration::from_millis(500));
        queue.push(SnapshotEvent::Added(PathBuf::from("/g/a.json")));

        assert!(queue.poll().is_empty());
        tokio::time::advance(Duration::from_millis(499)).await;
        assert!(queue.poll().is_empty());
        tokio::time::advance(Duration::from_millis(1)).await;

        assert_eq!(queue.poll(), vec![SnapshotEvent::Added(PathBuf::from("/g/a.json"))]);
        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_event_wins_and_resets_window() {
        let mut queue = DebouncedChangeQueue::new(Duration::from_millis(100));
        queue.push(SnapshotEvent::Added(PathBuf::from("/g/a.json")));
        tokio::time::advance(Duration::from_millis(80)).await;
        queue.push(SnapshotEvent::Changed(PathBuf::from("/g/a.json")));
        tokio::time::advance(Duration::from_millis(80)).await;

        assert!(queue.poll().is_empty());
        assert_eq!(queue.pending_count(), 1);

        tokio::time::advance(Duration::from_millis(20)).await;
        assert_eq!(queue.poll(), vec![SnapshotEvent::Changed(PathBuf::from("/g/a.json"))]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_returns_sorted_paths() {
        let mut queue = DebouncedChangeQueue::new(Duration::ZERO);
        queue.push(SnapshotEvent::Changed(PathBuf::from("/g/c.json")));
        queue.push(SnapshotEvent::Removed(PathBuf::from("/g/a.json")));
        queue.push(SnapshotEvent::Added(PathBuf::from("/g/b.json")));

        let paths: Vec<_> = queue.poll().iter().map(|e| e.path().to_path_buf()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/g/a.json"),
                PathBuf::from("/g/b.json"),
                PathBuf::from("/g/c.json"),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_ignores_window() {
        let mut queue = DebouncedChangeQueue::new(Duration::from_secs(60));
        queue.push(SnapshotEvent::Changed(PathBuf::from("/g/a.json")));
        assert_eq!(queue.drain().len(), 1);
        assert!(queue.is_empty());
    }
}

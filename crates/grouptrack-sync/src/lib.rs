//! GroupTrack Sync - Snapshot source and event loop
//!
//! Provides:
//! - Filesystem watching of the snapshot directory
//! - Debouncing of rapid rewrites into a single change
//! - Snapshot file discovery and parsing
//! - The single serialized loop that drives the membership engine
//!
//! ## Modules
//!
//! - [`watcher`] - `notify`-based watcher and the debounce queue
//! - [`scheduler`] - forwards settled changes into the event loop
//! - [`source`] - path → group tag mapping, directory scan, snapshot reads
//! - [`orchestrator`] - startup reconciliation and event routing

pub mod orchestrator;
pub mod scheduler;
pub mod source;
pub mod watcher;

pub use orchestrator::{LoopEvent, Orchestrator};
pub use source::SourceError;
pub use watcher::SnapshotEvent;

use std::path::PathBuf;

use thiserror::Error;

/// Errors that stop the event loop from starting
#[derive(Debug, Error)]
pub enum SyncError {
    /// The snapshot directory could not be listed
    #[error("Snapshot directory unavailable: {path}")]
    DirectoryUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The filesystem watcher could not be set up
    #[error("File watcher error: {0:#}")]
    Watch(anyhow::Error),
}

//! GroupTrack Store - Membership index persistence
//!
//! Flat JSON dumps of the two membership indexes:
//! - `groupStore.json` - group tag → member list
//! - `userStore.json` - member id → group tag
//!
//! ## Architecture
//!
//! This crate implements the `IIndexStore` port from `grouptrack-core`. It is
//! a driven (secondary) adapter in the hexagonal architecture.
//!
//! ## Key Components
//!
//! - [`JsonIndexStore`] - File-backed store with atomic writes
//! - [`MemoryIndexStore`] - In-memory store for tests and dry runs
//! - [`StoreError`] - Error types for store operations
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use grouptrack_core::ports::IIndexStore;
//! use grouptrack_store::JsonIndexStore;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store: Arc<dyn IIndexStore> =
//!     Arc::new(JsonIndexStore::new("/var/lib/grouptrack"));
//! let index = store.load().await?;
//! store.save(&index).await?;
//! # Ok(())
//! # }
//! ```

pub mod json;
pub mod memory;

use std::path::PathBuf;

pub use json::JsonIndexStore;
pub use memory::MemoryIndexStore;

/// Errors that can occur during store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading, writing or renaming a dump file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A dump file exists but does not have the expected layout
    #[error("Invalid dump format in {path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

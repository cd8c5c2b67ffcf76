//! Snapshot files on disk
//!
//! Each `<tag>.json` file in the snapshot directory describes one group.
//! Hidden files and files with any other extension are not snapshots.

use std::path::{Path, PathBuf};

use grouptrack_core::domain::{GroupTag, Snapshot, SnapshotError};
use thiserror::Error;
use tracing::{debug, instrument};

/// Extension a file must carry to be treated as a snapshot
pub const SNAPSHOT_EXTENSION: &str = "json";

/// Errors reading a single snapshot file
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: SnapshotError,
    },
}

/// Maps a snapshot file path to the group it describes
///
/// Returns `None` for hidden files, non-JSON files, and names that are not
/// valid group tags.
pub fn group_tag_for_path(path: &Path) -> Option<GroupTag> {
    let file_name = path.file_name()?.to_str()?;
    if file_name.starts_with('.') {
        return None;
    }
    if path.extension()?.to_str()? != SNAPSHOT_EXTENSION {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    GroupTag::new(stem).ok()
}

/// Lists the snapshot files in `dir`, sorted by path
///
/// # Errors
/// Returns the I/O error if the directory cannot be read
pub async fn scan_directory(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut paths = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !entry.file_type().await?.is_file() {
            continue;
        }
        if group_tag_for_path(&path).is_none() {
            debug!(path = %path.display(), "Ignoring non-snapshot file");
            continue;
        }
        paths.push(path);
    }

    paths.sort();
    Ok(paths)
}

/// Reads and parses one snapshot file
#[instrument(fields(path = %path.display()))]
pub async fn read_snapshot(path: &Path) -> Result<Snapshot, SourceError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let snapshot = Snapshot::parse(&content).map_err(|source| SourceError::Snapshot {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(members = snapshot.len(), "Parsed snapshot");
    Ok(snapshot)
}

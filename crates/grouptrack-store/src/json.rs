//! JSON dump files for the membership indexes
//!
//! Layout, both pretty-printed with two-space indentation:
//!
//! ```text
//! groupStore.json  [ [ "<tag>", [ [ "<member id>", { "name": "...", "online": true } ], ... ] ], ... ]
//! userStore.json   [ [ "<member id>", "<tag>" ], ... ]
//! ```
//!
//! Entries are written in key order so identical indexes always produce
//! identical files. Each file is written to a `.tmp` sibling and renamed
//! into place.

use std::path::{Path, PathBuf};

use grouptrack_core::{
    domain::{Group, GroupTag, Member, MemberId, MembershipIndex},
    ports::IIndexStore,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, instrument};

use crate::StoreError;

/// File name of the group → members dump
pub const GROUP_STORE_FILE: &str = "groupStore.json";

/// File name of the member → group dump
pub const MEMBER_STORE_FILE: &str = "userStore.json";

type GroupDump = Vec<(GroupTag, Vec<(MemberId, Member)>)>;
type MemberDump = Vec<(MemberId, GroupTag)>;

/// File-backed [`IIndexStore`] writing two JSON dumps into a directory
#[derive(Debug, Clone)]
pub struct JsonIndexStore {
    dir: PathBuf,
}

impl JsonIndexStore {
    /// Creates a store rooted at `dir`; the directory is created on first save
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn group_store_path(&self) -> PathBuf {
        self.dir.join(GROUP_STORE_FILE)
    }

    pub fn member_store_path(&self) -> PathBuf {
        self.dir.join(MEMBER_STORE_FILE)
    }

    /// Reads both dumps; a missing file counts as an empty index
    pub async fn read(&self) -> Result<MembershipIndex, StoreError> {
        let groups: GroupDump = read_dump(&self.group_store_path()).await?.unwrap_or_default();
        let members: MemberDump = read_dump(&self.member_store_path())
            .await?
            .unwrap_or_default();

        let mut index = MembershipIndex::new();
        for (tag, entries) in groups {
            index.groups.insert(tag, entries.into_iter().collect::<Group>());
        }
        index.members.extend(members);
        Ok(index)
    }

    /// Writes both dumps atomically
    pub async fn write(&self, index: &MembershipIndex) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StoreError::Io {
                path: self.dir.clone(),
                source,
            })?;

        let groups: GroupDump = index
            .groups
            .iter()
            .map(|(tag, group)| {
                let entries = group
                    .iter()
                    .map(|(id, member)| (id.clone(), member.clone()))
                    .collect();
                (tag.clone(), entries)
            })
            .collect();
        let members: MemberDump = index
            .members
            .iter()
            .map(|(id, tag)| (id.clone(), tag.clone()))
            .collect();

        write_dump(&self.group_store_path(), &groups).await?;
        write_dump(&self.member_store_path(), &members).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl IIndexStore for JsonIndexStore {
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    async fn load(&self) -> anyhow::Result<MembershipIndex> {
        let index = self.read().await?;
        debug!(
            groups = index.groups.len(),
            members = index.members.len(),
            "Loaded membership dumps"
        );
        Ok(index)
    }

    #[instrument(skip(self, index), fields(dir = %self.dir.display()))]
    async fn save(&self, index: &MembershipIndex) -> anyhow::Result<()> {
        self.write(index).await?;
        debug!(
            groups = index.groups.len(),
            members = index.members.len(),
            "Saved membership dumps"
        );
        Ok(())
    }
}

async fn read_dump<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "Dump file not found, treating as empty");
            return Ok(None);
        }
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| StoreError::Format {
            path: path.to_path_buf(),
            source,
        })
}

async fn write_dump<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let data = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Format {
        path: path.to_path_buf(),
        source,
    })?;

    // Same directory as the target so the rename stays on one filesystem
    let tmp_path = {
        let mut p = path.as_os_str().to_owned();
        p.push(".tmp");
        PathBuf::from(p)
    };

    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    tokio::fs::write(&tmp_path, &data).await.map_err(io_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(io_err)?;
    Ok(())
}

//! In-memory index store
//!
//! Keeps the last saved [`MembershipIndex`] behind a mutex and counts saves.
//! Used by tests across the workspace and by `--dry-run` style setups.

use std::sync::Mutex;

use grouptrack_core::{domain::MembershipIndex, ports::IIndexStore};

/// Store that never touches the filesystem
#[derive(Debug, Default)]
pub struct MemoryIndexStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    index: MembershipIndex,
    saves: usize,
}

impl MemoryIndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that returns `index` from the first `load`
    pub fn with_index(index: MembershipIndex) -> Self {
        Self {
            inner: Mutex::new(Inner { index, saves: 0 }),
        }
    }

    /// The most recently saved indexes
    pub fn snapshot(&self) -> MembershipIndex {
        self.lock().index.clone()
    }

    /// How many times `save` has been called
    pub fn save_count(&self) -> usize {
        self.lock().saves
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait::async_trait]
impl IIndexStore for MemoryIndexStore {
    async fn load(&self) -> anyhow::Result<MembershipIndex> {
        Ok(self.lock().index.clone())
    }

    async fn save(&self, index: &MembershipIndex) -> anyhow::Result<()> {
        let mut inner = self.lock();
        inner.index = index.clone();
        inner.saves += 1;
        Ok(())
    }
}

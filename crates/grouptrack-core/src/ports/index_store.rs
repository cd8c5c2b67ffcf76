//! Index store port (driven/secondary port)
//!
//! This module defines the interface for loading and saving the two
//! membership indexes.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because storage errors are adapter-specific
//!   (JSON files, in-memory) and don't need domain-level classification.
//! - `save` always receives both indexes; adapters write them as a unit.
//! - The pending-departure table is never passed to the store.

use crate::domain::MembershipIndex;

/// Port trait for durable storage of the membership indexes
#[async_trait::async_trait]
pub trait IIndexStore: Send + Sync {
    /// Loads the last saved indexes
    ///
    /// Returns empty indexes when nothing has been saved yet. Returns an
    /// error when saved data exists but cannot be read or parsed; the
    /// caller decides whether to fall back to empty state.
    async fn load(&self) -> anyhow::Result<MembershipIndex>;

    /// Saves both indexes, replacing whatever was stored before
    async fn save(&self, index: &MembershipIndex) -> anyhow::Result<()>;
}

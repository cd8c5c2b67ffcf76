//! Domain entities and business logic
//!
//! This module contains the core domain types for GroupTrack:
//! - Newtypes for member ids and group tags
//! - Members, groups, and parsed snapshots
//! - The two persisted membership indexes
//! - The in-memory pending-departure table
//! - Membership events and domain-specific error types

pub mod errors;
pub mod events;
pub mod group;
pub mod index;
pub mod newtypes;
pub mod pending;
pub mod snapshot;

// Re-export commonly used types
pub use errors::{DomainError, SnapshotError};
pub use events::MembershipEvent;
pub use group::{Group, Member};
pub use index::{GroupIndex, MemberIndex, MembershipIndex};
pub use newtypes::{GroupTag, MemberId};
pub use pending::{PendingDeparture, PendingDepartures};
pub use snapshot::Snapshot;

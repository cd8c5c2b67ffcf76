//! Domain newtypes with validation
//!
//! Strongly-typed wrappers for the two identifiers the membership engine
//! keys its indexes on. Each newtype ensures validity at construction time.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// MemberId
// ============================================================================

/// Stable, opaque identifier of a person across all groups
///
/// Identity of a member is this id alone; display name and online state
/// may change between snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MemberId(String);

impl MemberId {
    /// Create a MemberId, rejecting empty or whitespace-only values
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::InvalidMemberId(id));
        }
        Ok(Self(id))
    }

    /// Get the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for MemberId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MemberId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for MemberId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MemberId> for String {
    fn from(id: MemberId) -> Self {
        id.0
    }
}

// ============================================================================
// GroupTag
// ============================================================================

/// Short, stable identifier of a group, derived from its snapshot file stem
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GroupTag(String);

impl GroupTag {
    /// Create a GroupTag, rejecting empty values and path separators
    pub fn new(tag: impl Into<String>) -> Result<Self, DomainError> {
        let tag = tag.into();
        if tag.trim().is_empty() || tag.contains('/') || tag.contains('\\') {
            return Err(DomainError::InvalidGroupTag(tag));
        }
        Ok(Self(tag))
    }

    /// Get the tag as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for GroupTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for GroupTag {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for GroupTag {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<GroupTag> for String {
    fn from(tag: GroupTag) -> Self {
        tag.0
    }
}

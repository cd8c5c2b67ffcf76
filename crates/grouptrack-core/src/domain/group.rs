//! Members and groups
//!
//! A [`Group`] is the member list of one snapshot source, keyed by
//! [`MemberId`]. Iteration order is by id so that serialized indexes are
//! stable across runs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::newtypes::MemberId;

/// A member's mutable attributes as seen in the latest snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Display name
    pub name: String,
    /// Whether the member was online when the snapshot was taken
    pub online: bool,
}

impl Member {
    pub fn new(name: impl Into<String>, online: bool) -> Self {
        Self {
            name: name.into(),
            online,
        }
    }
}

/// The current member list of a group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Group {
    members: BTreeMap<MemberId, Member>,
}

impl Group {
    /// Creates an empty group
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the member id is part of this group
    pub fn contains(&self, id: &MemberId) -> bool {
        self.members.contains_key(id)
    }

    /// Looks up a member by id
    pub fn get(&self, id: &MemberId) -> Option<&Member> {
        self.members.get(id)
    }

    /// Inserts or replaces a member, returning the previous entry
    pub fn insert(&mut self, id: MemberId, member: Member) -> Option<Member> {
        self.members.insert(id, member)
    }

    /// Iterates over `(id, member)` pairs in id order
    pub fn iter(&self) -> impl Iterator<Item = (&MemberId, &Member)> {
        self.members.iter()
    }

    /// Iterates over member ids in id order
    pub fn ids(&self) -> impl Iterator<Item = &MemberId> {
        self.members.keys()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Number of members currently flagged online
    pub fn online_count(&self) -> usize {
        self.members.values().filter(|m| m.online).count()
    }
}

impl FromIterator<(MemberId, Member)> for Group {
    fn from_iter<I: IntoIterator<Item = (MemberId, Member)>>(iter: I) -> Self {
        Self {
            members: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Group {
    type Item = (MemberId, Member);
    type IntoIter = std::collections::btree_map::IntoIter<MemberId, Member>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.into_iter()
    }
}

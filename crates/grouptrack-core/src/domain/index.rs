//! The two durable membership indexes
//!
//! - [`GroupIndex`]: group tag → current member list
//! - [`MemberIndex`]: member id → group the member is attributed to
//!
//! Both live in one [`MembershipIndex`] so they are always loaded, mutated
//! and saved together.

use std::collections::BTreeMap;

use super::group::Group;
use super::newtypes::{GroupTag, MemberId};

/// Group tag → current member list
pub type GroupIndex = BTreeMap<GroupTag, Group>;

/// Member id → group the member is currently attributed to
pub type MemberIndex = BTreeMap<MemberId, GroupTag>;

/// Both membership indexes, persisted as a unit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipIndex {
    pub groups: GroupIndex,
    pub members: MemberIndex,
}

impl MembershipIndex {
    /// Creates empty indexes
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.members.is_empty()
    }

    /// Returns the member list of a group, if the group is known
    pub fn group(&self, tag: &GroupTag) -> Option<&Group> {
        self.groups.get(tag)
    }

    /// Returns the group a member is attributed to, if any
    pub fn group_of(&self, id: &MemberId) -> Option<&GroupTag> {
        self.members.get(id)
    }

    /// Attributions in the member index that the group index does not back up
    ///
    /// A healthy index returns an empty list. Loading hand-edited or
    /// truncated dumps is the usual way to end up with entries here.
    pub fn dangling_attributions(&self) -> Vec<(&MemberId, &GroupTag)> {
        self.members
            .iter()
            .filter(|(id, tag)| !self.groups.get(*tag).is_some_and(|g| g.contains(id)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::group::Member;

    fn id(s: &str) -> MemberId {
        MemberId::new(s).unwrap()
    }

    fn tag(s: &str) -> GroupTag {
        GroupTag::new(s).unwrap()
    }

    #[test]
    fn test_empty_index() {
        let index = MembershipIndex::new();
        assert!(index.is_empty());
        assert!(index.group(&tag("alpha")).is_none());
        assert!(index.group_of(&id("a")).is_none());
    }

    #[test]
    fn test_dangling_attributions() {
        let mut index = MembershipIndex::new();
        let group: Group = vec![(id("a"), Member::new("Alice", true))]
            .into_iter()
            .collect();
        index.groups.insert(tag("alpha"), group);
        index.members.insert(id("a"), tag("alpha"));
        assert!(index.dangling_attributions().is_empty());

        index.members.insert(id("b"), tag("alpha"));
        index.members.insert(id("c"), tag("gone"));
        let dangling = index.dangling_attributions();
        assert_eq!(dangling.len(), 2);
        assert_eq!(dangling[0].0, &id("b"));
        assert_eq!(dangling[1].1, &tag("gone"));
    }
}

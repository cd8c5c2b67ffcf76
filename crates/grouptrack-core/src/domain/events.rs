//! Membership events produced by the engine
//!
//! Events describe *what happened*; turning them into outbound messages is
//! the notifier's job.

use std::fmt::{self, Display, Formatter};

use super::group::Group;
use super::newtypes::{GroupTag, MemberId};

/// A classified change in group membership
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipEvent {
    /// A group was seen for the first time
    GroupCreated {
        group: GroupTag,
        display_name: String,
        /// Member names in source order
        member_names: Vec<String>,
    },
    /// A member appeared with no pending departure to match
    MemberJoined {
        member: MemberId,
        name: String,
        group: GroupTag,
    },
    /// A member disappeared from a group's snapshot
    MemberLeft {
        member: MemberId,
        name: String,
        group: GroupTag,
    },
    /// A member left one group and appeared in another within the grace period
    GroupTransfer {
        member: MemberId,
        name: String,
        from: GroupTag,
        /// Member list of the old group as it was before the departure
        from_members: Group,
        to: GroupTag,
        /// Member list of the new group including the arriving member
        to_members: Group,
    },
    /// A group's snapshot source was removed
    GroupDeleted { group: GroupTag },
}

impl MembershipEvent {
    /// Short machine-friendly name of the event kind
    pub fn kind(&self) -> &'static str {
        match self {
            MembershipEvent::GroupCreated { .. } => "group_created",
            MembershipEvent::MemberJoined { .. } => "member_joined",
            MembershipEvent::MemberLeft { .. } => "member_left",
            MembershipEvent::GroupTransfer { .. } => "group_transfer",
            MembershipEvent::GroupDeleted { .. } => "group_deleted",
        }
    }

    /// The group the event is primarily about (the destination for transfers)
    pub fn group(&self) -> &GroupTag {
        match self {
            MembershipEvent::GroupCreated { group, .. }
            | MembershipEvent::MemberJoined { group, .. }
            | MembershipEvent::MemberLeft { group, .. }
            | MembershipEvent::GroupDeleted { group } => group,
            MembershipEvent::GroupTransfer { to, .. } => to,
        }
    }
}

impl Display for MembershipEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            MembershipEvent::GroupCreated {
                group,
                member_names,
                ..
            } => write!(f, "group {group} created with {} members", member_names.len()),
            MembershipEvent::MemberJoined { member, group, .. } => {
                write!(f, "{member} joined {group}")
            }
            MembershipEvent::MemberLeft { member, group, .. } => {
                write!(f, "{member} left {group}")
            }
            MembershipEvent::GroupTransfer {
                member, from, to, ..
            } => write!(f, "{member} moved from {from} to {to}"),
            MembershipEvent::GroupDeleted { group } => write!(f, "group {group} deleted"),
        }
    }
}

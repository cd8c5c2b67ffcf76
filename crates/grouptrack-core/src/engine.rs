//! Membership diff engine
//!
//! The [`MembershipEngine`] owns the two membership indexes and the
//! pending-departure table. Each operation applies one snapshot, deletion or
//! grace-period expiry, saves the indexes through the [`IIndexStore`] port,
//! and returns a [`Transition`] describing what happened.
//!
//! ## Per-member state machine
//!
//! ```text
//! Absent ──snapshot──▶ Member(g) ──leaves g──▶ Pending(g) ──timer──▶ Absent
//!                          ▲                      │
//!                          └── reappears in g ────┤  (rejoin, silent)
//!              Member(h) ◀── reappears in h ──────┘  (transfer alert)
//! ```
//!
//! ## Concurrency
//!
//! Operations take `&mut self`. Callers serialize them through a single
//! event loop; grace timers are armed by the caller and come back as calls
//! to [`MembershipEngine::expire_departure`].

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::domain::{
    GroupTag, MemberId, MembershipEvent, MembershipIndex, PendingDepartures, Snapshot,
};
use crate::ports::IIndexStore;

// ============================================================================
// Transition
// ============================================================================

/// A grace-period timer the caller must arm
///
/// When `delay` has elapsed the caller passes the timer back to
/// [`MembershipEngine::expire_departure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraceTimer {
    pub member: MemberId,
    pub generation: u64,
    pub delay: Duration,
}

/// Result of a single engine operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transition {
    /// Events in the order they were detected (departures before arrivals)
    pub events: Vec<MembershipEvent>,
    /// Grace timers to arm, one per departure
    pub timers: Vec<GraceTimer>,
}

impl Transition {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.timers.is_empty()
    }
}

// ============================================================================
// MembershipEngine
// ============================================================================

/// Classifies membership changes and maintains the membership indexes
pub struct MembershipEngine {
    index: MembershipIndex,
    pending: PendingDepartures,
    store: Arc<dyn IIndexStore>,
    grace_period: Duration,
}

impl MembershipEngine {
    /// Creates an engine with empty indexes
    pub fn new(store: Arc<dyn IIndexStore>, grace_period: Duration) -> Self {
        Self::with_index(store, MembershipIndex::new(), grace_period)
    }

    /// Creates an engine starting from already-loaded indexes
    pub fn with_index(
        store: Arc<dyn IIndexStore>,
        index: MembershipIndex,
        grace_period: Duration,
    ) -> Self {
        Self {
            index,
            pending: PendingDepartures::new(),
            store,
            grace_period,
        }
    }

    /// Loads the indexes from the store, starting empty if that fails
    ///
    /// A failed load is logged and otherwise ignored: the next snapshots
    /// rebuild the indexes and the next save overwrites the bad data.
    pub async fn restore(store: Arc<dyn IIndexStore>, grace_period: Duration) -> Self {
        match store.load().await {
            Ok(index) => {
                info!(
                    groups = index.groups.len(),
                    members = index.members.len(),
                    "Restored membership indexes"
                );
                Self::with_index(store, index, grace_period)
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Failed to load membership indexes, starting empty");
                Self::new(store, grace_period)
            }
        }
    }

    pub fn index(&self) -> &MembershipIndex {
        &self.index
    }

    pub fn pending(&self) -> &PendingDepartures {
        &self.pending
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Applies a new snapshot of a group's members
    pub async fn process_snapshot(&mut self, tag: &GroupTag, snapshot: &Snapshot) -> Transition {
        self.process_snapshot_at(tag, snapshot, Utc::now()).await
    }

    /// Applies a new snapshot, stamping departures with `now`
    ///
    /// 1. An unknown group is recorded as created; members are attributed to
    ///    it without individual join events.
    /// 2. Otherwise departures are handled first: each leaver is detached from
    ///    the member index, announced, and parked as a pending departure with
    ///    a grace timer.
    /// 3. Then arrivals: a pending departure from another group makes the
    ///    arrival a transfer, one from this group makes it a silent rejoin, and
    ///    no pending departure makes it a plain join.
    /// 4. The group's member list is replaced and the indexes are saved.
    #[instrument(skip(self, snapshot), fields(group = %tag, members = snapshot.len()))]
    pub async fn process_snapshot_at(
        &mut self,
        tag: &GroupTag,
        snapshot: &Snapshot,
        now: DateTime<Utc>,
    ) -> Transition {
        let mut transition = Transition::default();
        let new_members = snapshot.to_group();

        let Some(old_members) = self.index.groups.get(tag).cloned() else {
            for id in new_members.ids() {
                self.index.members.insert(id.clone(), tag.clone());
            }
            self.index.groups.insert(tag.clone(), new_members);

            info!(display_name = snapshot.display_name(), "New group created");
            transition.events.push(MembershipEvent::GroupCreated {
                group: tag.clone(),
                display_name: snapshot.display_name().to_string(),
                member_names: snapshot.member_names(),
            });
            self.persist().await;
            return transition;
        };

        // --- departures ---
        for (id, member) in old_members.iter() {
            if new_members.contains(id) {
                continue;
            }

            // The member may already be attributed elsewhere if another
            // group's snapshot listed them first.
            if self.index.members.get(id) == Some(tag) {
                self.index.members.remove(id);
            }

            info!(member = %id, name = %member.name, "Member left group");
            transition.events.push(MembershipEvent::MemberLeft {
                member: id.clone(),
                name: member.name.clone(),
                group: tag.clone(),
            });

            let generation = self.pending.record(
                id.clone(),
                member.name.clone(),
                tag.clone(),
                old_members.clone(),
                now,
            );
            transition.timers.push(GraceTimer {
                member: id.clone(),
                generation,
                delay: self.grace_period,
            });
        }

        // --- arrivals ---
        for (id, member) in snapshot.members() {
            if old_members.contains(id) {
                continue;
            }

            match self.pending.take(id) {
                Some(departure) if departure.departed_from != *tag => {
                    info!(
                        member = %id,
                        name = %member.name,
                        from = %departure.departed_from,
                        "Member changed group within grace period"
                    );
                    transition.events.push(MembershipEvent::GroupTransfer {
                        member: id.clone(),
                        name: member.name.clone(),
                        from: departure.departed_from,
                        from_members: departure.previous_members,
                        to: tag.clone(),
                        to_members: new_members.clone(),
                    });
                }
                Some(_) => {
                    debug!(member = %id, "Member rejoined within grace period");
                }
                None => {
                    info!(member = %id, name = %member.name, "Member joined group");
                    transition.events.push(MembershipEvent::MemberJoined {
                        member: id.clone(),
                        name: member.name.clone(),
                        group: tag.clone(),
                    });
                }
            }

            self.index.members.insert(id.clone(), tag.clone());
        }

        self.index.groups.insert(tag.clone(), new_members);
        self.persist().await;
        transition
    }

    /// Removes a group whose snapshot source disappeared
    ///
    /// Members attributed to the group are dropped from the member index
    /// without a grace period. A group that is not known is a no-op.
    #[instrument(skip(self), fields(group = %tag))]
    pub async fn remove_group(&mut self, tag: &GroupTag) -> Transition {
        let Some(group) = self.index.groups.remove(tag) else {
            debug!("Group not tracked, nothing to remove");
            return Transition::default();
        };

        self.index.members.retain(|_, attributed| attributed != tag);
        self.persist().await;

        info!(members = group.len(), "Group deleted");
        Transition {
            events: vec![MembershipEvent::GroupDeleted { group: tag.clone() }],
            timers: Vec::new(),
        }
    }

    /// Handles a fired grace timer
    ///
    /// Clears the pending departure only if it is still the one the timer
    /// was armed for. Expiry is silent and never produces events.
    pub async fn expire_departure(&mut self, timer: &GraceTimer) -> Transition {
        match self.pending.expire(&timer.member, timer.generation) {
            Some(departure) => {
                debug!(
                    member = %timer.member,
                    group = %departure.departed_from,
                    "Grace period expired"
                );
                self.persist().await;
            }
            None => {
                debug!(member = %timer.member, "Stale grace timer ignored");
            }
        }
        Transition::default()
    }

    /// Saves the indexes; failures are logged and the engine keeps running
    async fn persist(&self) {
        if let Err(e) = self.store.save(&self.index).await {
            warn!(error = %format!("{e:#}"), "Failed to persist membership indexes");
        }
    }
}

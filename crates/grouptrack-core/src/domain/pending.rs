//! In-memory table of recent departures awaiting grace-period resolution
//!
//! Entries are never persisted. Each entry carries a generation number that
//! is unique per departure, so a grace timer only ever clears the departure
//! it was armed for.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::group::Group;
use super::newtypes::{GroupTag, MemberId};

/// A member who left a group and may still reappear as a rejoin or transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDeparture {
    /// Display name at the time of departure
    pub name: String,
    /// Group the member left
    pub departed_from: GroupTag,
    /// The departed group's member list before the departure was applied
    pub previous_members: Group,
    /// Wall-clock time of the departure
    pub departed_at: DateTime<Utc>,
    /// Unique per departure; matched against the grace timer on expiry
    pub generation: u64,
}

/// Pending departures keyed by member id
#[derive(Debug, Default)]
pub struct PendingDepartures {
    entries: HashMap<MemberId, PendingDeparture>,
    next_generation: u64,
}

impl PendingDepartures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a departure, replacing any earlier one for the same member
    ///
    /// Returns the generation assigned to the new entry.
    pub fn record(
        &mut self,
        id: MemberId,
        name: String,
        departed_from: GroupTag,
        previous_members: Group,
        departed_at: DateTime<Utc>,
    ) -> u64 {
        self.next_generation += 1;
        let generation = self.next_generation;
        self.entries.insert(
            id,
            PendingDeparture {
                name,
                departed_from,
                previous_members,
                departed_at,
                generation,
            },
        );
        generation
    }

    /// Removes and returns the pending departure of a member
    pub fn take(&mut self, id: &MemberId) -> Option<PendingDeparture> {
        self.entries.remove(id)
    }

    /// Removes the entry only if it still belongs to `generation`
    pub fn expire(&mut self, id: &MemberId, generation: u64) -> Option<PendingDeparture> {
        match self.entries.get(id) {
            Some(entry) if entry.generation == generation => self.entries.remove(id),
            _ => None,
        }
    }

    pub fn get(&self, id: &MemberId) -> Option<&PendingDeparture> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &MemberId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

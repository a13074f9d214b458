//! Which actor marked whom, so marks can be lifted by their source.
use std::collections::{BTreeMap, BTreeSet};

use crate::actor::ActorId;
use crate::time::TimerHandle;

#[derive(Clone, Debug, PartialEq)]
pub struct MarkEntry {
    pub targets: BTreeSet<ActorId>,
    /// World timer that lifts these marks.
    pub expiry: TimerHandle,
}

/// Marks applied by each source, at most one batch per source.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MarkLedger {
    entries: BTreeMap<ActorId, MarkEntry>,
}

impl MarkLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new batch for `source`, returning the batch it replaces.
    pub fn record(
        &mut self,
        source: ActorId,
        targets: BTreeSet<ActorId>,
        expiry: TimerHandle,
    ) -> Option<MarkEntry> {
        self.entries.insert(source, MarkEntry { targets, expiry })
    }

    /// Removes and returns the batch owned by `source`.
    pub fn take(&mut self, source: ActorId) -> Option<MarkEntry> {
        self.entries.remove(&source)
    }

    /// Drops `target` from every batch (it died or despawned).
    pub fn forget(&mut self, target: ActorId) {
        for entry in self.entries.values_mut() {
            entry.targets.remove(&target);
        }
    }

    pub fn targets_of(&self, source: ActorId) -> impl Iterator<Item = ActorId> + '_ {
        self.entries
            .get(&source)
            .into_iter()
            .flat_map(|entry| entry.targets.iter().copied())
    }

    pub fn is_marked_by(&self, source: ActorId, target: ActorId) -> bool {
        self.entries
            .get(&source)
            .is_some_and(|entry| entry.targets.contains(&target))
    }

    /// Whether any source still holds a mark on `target`.
    pub fn is_marked(&self, target: ActorId) -> bool {
        self.entries
            .values()
            .any(|entry| entry.targets.contains(&target))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

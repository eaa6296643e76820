// EximCrunch - core/aggregate.rs
//
// Shared owner -> correspondents mapping.
//
// Backed by a `DashMap`: every owner lives in exactly one internal shard, so
// one shard lock covers all reads and writes of that owner's set. A lock is
// held for exactly one insert and never across I/O.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Concurrent owner -> correspondent-set map.
#[derive(Debug, Default)]
pub struct Aggregator {
    owners: DashMap<String, HashSet<String>>,
}

/// One owner and its correspondents, as produced by [`Aggregator::drain`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerEntry {
    pub owner: String,
    pub correspondents: Vec<String>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `correspondent` to `owner`'s set, creating the set if needed.
    ///
    /// Idempotent. Returns `true` only when this call created the owner.
    pub fn record(&self, owner: String, correspondent: String) -> bool {
        match self.owners.entry(owner) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().insert(correspondent);
                false
            }
            Entry::Vacant(entry) => {
                entry.insert(HashSet::from([correspondent]));
                true
            }
        }
    }

    /// Number of distinct owners recorded so far.
    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }

    /// Consume the aggregator and return every owner exactly once.
    ///
    /// Taking `self` by value means no `record` can still be in flight.
    /// Owners are sorted, and so are the correspondents of each owner, which
    /// makes the serialised output deterministic across runs.
    pub fn drain(self) -> Vec<OwnerEntry> {
        let merged: BTreeMap<String, BTreeSet<String>> = self
            .owners
            .into_iter()
            .map(|(owner, set)| (owner, set.into_iter().collect()))
            .collect();

        merged
            .into_iter()
            .map(|(owner, set)| OwnerEntry {
                owner,
                correspondents: set.into_iter().collect(),
            })
            .collect()
    }
}

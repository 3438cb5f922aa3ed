//! Per-entity bookkeeping for favourite mutations.
//!
//! The registry is plain data: it applies, commits and reverts optimistic
//! effects but never talks to the network or to storage. The reconciler owns
//! it behind a lock and is its only writer.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Display state of one entity as seen by readers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavouriteEntity {
    pub id: String,
    /// Last value received from or confirmed by the service.
    pub remote_count: u64,
    /// Value shown instead of `remote_count` after an optimistic change.
    pub local_override: Option<u64>,
    pub is_favourited: bool,
    pub in_flight: bool,
}

impl FavouriteEntity {
    pub fn displayed_count(&self) -> u64 {
        self.local_override.unwrap_or(self.remote_count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EntityRecord {
    remote_count: u64,
    local_override: Option<u64>,
    in_flight: bool,
}

impl EntityRecord {
    fn new(remote_count: u64) -> Self {
        Self {
            remote_count,
            local_override: None,
            in_flight: false,
        }
    }

    fn displayed(&self) -> u64 {
        self.local_override.unwrap_or(self.remote_count)
    }
}

/// An applied, not yet settled, toggle.
///
/// Carries the exact pre-toggle values so a rollback restores them instead of
/// re-deriving anything from the current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingMutation {
    pub id: String,
    /// Membership after the toggle.
    pub favourited: bool,
    /// Displayed count after the toggle.
    pub count: u64,
    was_favourited: bool,
    prior_remote: u64,
    prior_override: Option<u64>,
}

/// Outcome of settling or refreshing an entity, for change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Settled {
    pub favourited: bool,
    pub count: u64,
    pub pending: bool,
}

#[derive(Debug, Default)]
pub(crate) struct MutationRegistry {
    entities: HashMap<String, EntityRecord>,
    favourites: BTreeSet<String>,
}

impl MutationRegistry {
    pub fn with_favourites(favourites: BTreeSet<String>) -> Self {
        Self {
            entities: HashMap::new(),
            favourites,
        }
    }

    pub fn favourites(&self) -> &BTreeSet<String> {
        &self.favourites
    }

    pub fn is_favourited(&self, id: &str) -> bool {
        self.favourites.contains(id)
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.entities.get(id).is_some_and(|r| r.in_flight)
    }

    /// Displayed count, or `baseline` for an entity never seen.
    pub fn count_of(&self, id: &str, baseline: u64) -> u64 {
        self.entities.get(id).map_or(baseline, EntityRecord::displayed)
    }

    pub fn entity(&self, id: &str) -> Option<FavouriteEntity> {
        self.entities.get(id).map(|record| FavouriteEntity {
            id: id.to_string(),
            remote_count: record.remote_count,
            local_override: record.local_override,
            is_favourited: self.favourites.contains(id),
            in_flight: record.in_flight,
        })
    }

    /// Apply a toggle optimistically.
    ///
    /// `baseline` seeds the remote count of an entity seen for the first
    /// time. Returns `None` without touching anything while a mutation for
    /// `id` is outstanding.
    pub fn begin(&mut self, id: &str, baseline: u64) -> Option<PendingMutation> {
        let record = self
            .entities
            .entry(id.to_string())
            .or_insert_with(|| EntityRecord::new(baseline));
        if record.in_flight {
            return None;
        }

        let was_favourited = self.favourites.contains(id);
        let prior_remote = record.remote_count;
        let prior_override = record.local_override;
        let shown = record.displayed();

        let favourited = !was_favourited;
        let count = if favourited {
            shown.saturating_add(1)
        } else {
            shown.saturating_sub(1)
        };

        record.local_override = Some(count);
        record.in_flight = true;
        if favourited {
            self.favourites.insert(id.to_string());
        } else {
            self.favourites.remove(id);
        }

        Some(PendingMutation {
            id: id.to_string(),
            favourited,
            count,
            was_favourited,
            prior_remote,
            prior_override,
        })
    }

    /// The service confirmed the mutation: the optimistic count becomes the
    /// new remote value.
    ///
    /// An authoritative count received while in flight already reflects the
    /// mutation, so it wins and the override is retired.
    pub fn commit(&mut self, mutation: &PendingMutation) -> Settled {
        let record = self
            .entities
            .entry(mutation.id.clone())
            .or_insert_with(|| EntityRecord::new(mutation.prior_remote));
        record.in_flight = false;
        if record.remote_count == mutation.prior_remote {
            record.remote_count = mutation.count;
            record.local_override = Some(mutation.count);
        } else {
            record.local_override = None;
        }

        Settled {
            favourited: mutation.favourited,
            count: record.displayed(),
            pending: false,
        }
    }

    /// Exact inverse of [`MutationRegistry::begin`].
    ///
    /// If an authoritative count arrived while in flight, that value is kept
    /// and the stale override is dropped.
    pub fn rollback(&mut self, mutation: &PendingMutation) -> Settled {
        let record = self
            .entities
            .entry(mutation.id.clone())
            .or_insert_with(|| EntityRecord::new(mutation.prior_remote));
        record.in_flight = false;
        record.local_override = if record.remote_count == mutation.prior_remote {
            mutation.prior_override
        } else {
            None
        };
        let count = record.displayed();

        if mutation.was_favourited {
            self.favourites.insert(mutation.id.clone());
        } else {
            self.favourites.remove(&mutation.id);
        }

        Settled {
            favourited: mutation.was_favourited,
            count,
            pending: false,
        }
    }

    /// Record an authoritative count from the service.
    ///
    /// Retires the override when settled; while a mutation is in flight only
    /// the remote value moves and settlement decides what to show.
    pub fn apply_remote_count(&mut self, id: &str, count: u64) -> Settled {
        let record = self
            .entities
            .entry(id.to_string())
            .or_insert_with(|| EntityRecord::new(count));
        record.remote_count = count;
        if !record.in_flight {
            record.local_override = None;
        }

        Settled {
            favourited: self.favourites.contains(id),
            count: record.displayed(),
            pending: record.in_flight,
        }
    }
}

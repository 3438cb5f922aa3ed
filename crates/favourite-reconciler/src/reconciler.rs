//! Optimistic favourite toggles.
//!
//! A toggle flips membership and the displayed count before any network
//! activity, then settles against the counter service: commit on success,
//! exact rollback on failure. At most one toggle per entity is outstanding.

use crate::registry::{FavouriteEntity, MutationRegistry, PendingMutation, Settled};
use crate::{ReconcileError, ReconcileResult};
use client_storage::FavouriteSetStore;
use parking_lot::Mutex;
use remote_capabilities::{CounterAction, CounterService, EventKind, TelemetrySink};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Default minimum time a toggle stays pending.
pub const DEFAULT_MIN_FEEDBACK_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Settlement waits for both the remote call and this delay.
    pub min_feedback_delay: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            min_feedback_delay: DEFAULT_MIN_FEEDBACK_DELAY,
        }
    }
}

/// Entity a toggle acts on, as the caller currently sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavouriteTarget {
    pub id: String,
    /// Count the caller displays when the reconciler has no record yet.
    pub remote_count: u64,
}

impl FavouriteTarget {
    pub fn new(id: impl Into<String>, remote_count: u64) -> Self {
        Self {
            id: id.into(),
            remote_count,
        }
    }
}

/// Settled result of a successful toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleOutcome {
    pub favourited: bool,
    pub count: u64,
}

/// Notification emitted when an entity's displayed state changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavouriteChanged {
    pub id: String,
    pub favourited: bool,
    pub count: u64,
    pub pending: bool,
}

impl FavouriteChanged {
    fn settled(id: &str, settled: Settled) -> Self {
        Self {
            id: id.to_string(),
            favourited: settled.favourited,
            count: settled.count,
            pending: settled.pending,
        }
    }
}

/// Callback type for favourite change notifications.
pub type FavouriteChangeCallback = Box<dyn Fn(FavouriteChanged) + Send + Sync>;

pub struct FavouriteReconciler {
    registry: Mutex<MutationRegistry>,
    store: FavouriteSetStore,
    counter: Arc<dyn CounterService>,
    telemetry: Arc<dyn TelemetrySink>,
    config: ReconcilerConfig,
    change_callback: Mutex<Option<FavouriteChangeCallback>>,
}

impl FavouriteReconciler {
    /// Create a reconciler seeded from the persisted favourite set.
    ///
    /// An unreadable set is logged and replaced by an empty one.
    pub fn new(
        store: FavouriteSetStore,
        counter: Arc<dyn CounterService>,
        telemetry: Arc<dyn TelemetrySink>,
        config: ReconcilerConfig,
    ) -> Self {
        let favourites = match store.load() {
            Ok(ids) => {
                debug!(count = ids.len(), "Loaded favourite set");
                ids
            }
            Err(e) => {
                error!(error = %e, "Failed to load favourite set, starting empty");
                Default::default()
            }
        };

        Self {
            registry: Mutex::new(MutationRegistry::with_favourites(favourites)),
            store,
            counter,
            telemetry,
            config,
            change_callback: Mutex::new(None),
        }
    }

    /// Set a callback notified after every apply, commit, rollback and refresh.
    pub fn set_change_callback(&self, callback: FavouriteChangeCallback) {
        *self.change_callback.lock() = Some(callback);
    }

    pub fn is_favourited(&self, id: &str) -> bool {
        self.registry.lock().is_favourited(id)
    }

    pub fn is_mutation_pending(&self, id: &str) -> bool {
        self.registry.lock().is_pending(id)
    }

    /// Displayed count; `baseline` is returned for entities never seen.
    pub fn favourite_count_of(&self, id: &str, baseline: u64) -> u64 {
        self.registry.lock().count_of(id, baseline)
    }

    pub fn entity(&self, id: &str) -> Option<FavouriteEntity> {
        self.registry.lock().entity(id)
    }

    /// Favourited ids in sorted order.
    pub fn favourites(&self) -> Vec<String> {
        self.registry.lock().favourites().iter().cloned().collect()
    }

    /// Toggle favourite membership of `target`.
    ///
    /// Returns `MutationInProgress` immediately, with no state change, when a
    /// toggle for the same id is outstanding. A failed remote mutation rolls
    /// the local effect back and returns `RolledBack`.
    pub async fn toggle_favourite(&self, target: &FavouriteTarget) -> ReconcileResult<ToggleOutcome> {
        let mutation = {
            let mut registry = self.registry.lock();
            let mutation = registry
                .begin(&target.id, target.remote_count)
                .ok_or_else(|| ReconcileError::MutationInProgress(target.id.clone()))?;
            self.persist(&registry);
            mutation
        };

        debug!(
            id = %mutation.id,
            favourited = mutation.favourited,
            count = mutation.count,
            "Applied optimistic toggle"
        );
        self.notify(FavouriteChanged {
            id: mutation.id.clone(),
            favourited: mutation.favourited,
            count: mutation.count,
            pending: true,
        });
        self.telemetry.record(
            &mutation.id,
            if mutation.favourited {
                EventKind::AddToFavourite
            } else {
                EventKind::RemoveFromFavourite
            },
        );

        let action = CounterAction::for_favourited(mutation.favourited);
        let pending = PendingToggle {
            reconciler: self,
            mutation: &mutation,
            armed: true,
        };

        let (result, ()) = tokio::join!(
            self.counter.invoke_counter_mutation(&mutation.id, action),
            tokio::time::sleep(self.config.min_feedback_delay),
        );
        pending.disarm();

        match result {
            Ok(()) => {
                let settled = self.registry.lock().commit(&mutation);
                info!(
                    id = %mutation.id,
                    action = action.as_str(),
                    count = settled.count,
                    "Favourite mutation committed"
                );
                self.notify(FavouriteChanged::settled(&mutation.id, settled));
                Ok(ToggleOutcome {
                    favourited: settled.favourited,
                    count: settled.count,
                })
            }
            Err(source) => {
                warn!(
                    id = %mutation.id,
                    action = action.as_str(),
                    error = %source,
                    transient = source.is_transient(),
                    "Favourite mutation failed, rolling back"
                );
                self.rollback(&mutation);
                Err(ReconcileError::RolledBack {
                    id: mutation.id,
                    source,
                })
            }
        }
    }

    /// Record an authoritative count fetched from the service.
    pub fn apply_remote_count(&self, id: &str, count: u64) {
        let settled = self.registry.lock().apply_remote_count(id, count);
        debug!(id = %id, count, pending = settled.pending, "Applied remote count");
        self.notify(FavouriteChanged::settled(id, settled));
    }

    /// Forward a click on `id` to telemetry.
    pub fn record_click(&self, id: &str) {
        self.telemetry.record(id, EventKind::Click);
    }

    fn rollback(&self, mutation: &PendingMutation) {
        let settled = {
            let mut registry = self.registry.lock();
            let settled = registry.rollback(mutation);
            self.persist(&registry);
            settled
        };
        self.notify(FavouriteChanged::settled(&mutation.id, settled));
    }

    /// Write-through of the favourite set; failures leave memory authoritative.
    fn persist(&self, registry: &MutationRegistry) {
        if let Err(e) = self.store.save(registry.favourites()) {
            error!(error = %e, "Failed to persist favourite set");
        }
    }

    fn notify(&self, change: FavouriteChanged) {
        if let Some(callback) = self.change_callback.lock().as_ref() {
            callback(change);
        }
    }
}

impl std::fmt::Debug for FavouriteReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FavouriteReconciler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Rolls an applied toggle back if its future is dropped before settling.
struct PendingToggle<'a> {
    reconciler: &'a FavouriteReconciler,
    mutation: &'a PendingMutation,
    armed: bool,
}

impl PendingToggle<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingToggle<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!(id = %self.mutation.id, "Favourite toggle abandoned before settling, rolling back");
            self.reconciler.rollback(self.mutation);
        }
    }
}

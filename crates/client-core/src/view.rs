//! Read-only projection over session and favourite state.

use auth_session::{SessionManager, SessionSnapshot, SessionState};
use favourite_reconciler::{FavouriteEntity, FavouriteReconciler};
use remote_capabilities::User;
use std::sync::Arc;

/// Cheap, cloneable, side-effect-free accessors for observers.
///
/// A view cannot start operations; it only reads through the owning
/// components.
#[derive(Clone)]
pub struct ClientView {
    session: Arc<SessionManager>,
    reconciler: Arc<FavouriteReconciler>,
}

impl ClientView {
    pub(crate) fn new(session: Arc<SessionManager>, reconciler: Arc<FavouriteReconciler>) -> Self {
        Self {
            session,
            reconciler,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.session.is_loading()
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    pub fn current_user(&self) -> Option<User> {
        self.session.current_user()
    }

    pub fn last_error(&self) -> Option<String> {
        self.session.last_error()
    }

    pub fn session_snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    /// Displayed favourite count, or `baseline` for an entity never seen.
    pub fn favourite_count_of(&self, id: &str, baseline: u64) -> u64 {
        self.reconciler.favourite_count_of(id, baseline)
    }

    pub fn is_favourited(&self, id: &str) -> bool {
        self.reconciler.is_favourited(id)
    }

    pub fn is_mutation_pending(&self, id: &str) -> bool {
        self.reconciler.is_mutation_pending(id)
    }

    pub fn favourite_entity(&self, id: &str) -> Option<FavouriteEntity> {
        self.reconciler.entity(id)
    }

    pub fn favourites(&self) -> Vec<String> {
        self.reconciler.favourites()
    }
}

impl std::fmt::Debug for ClientView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientView")
            .field("session_state", &self.session.state())
            .finish_non_exhaustive()
    }
}

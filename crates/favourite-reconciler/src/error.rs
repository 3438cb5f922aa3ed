//! Reconciler error types.

use remote_capabilities::RemoteError;
use thiserror::Error;

/// Reconciler error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// A toggle for this entity is still outstanding; nothing was changed.
    #[error("Mutation already in progress for {0}")]
    MutationInProgress(String),

    /// The remote mutation failed and the local effect was reverted.
    #[error("Mutation for {id} rolled back: {source}")]
    RolledBack {
        id: String,
        #[source]
        source: RemoteError,
    },
}

impl ReconcileError {
    /// Entity the error refers to.
    pub fn entity_id(&self) -> &str {
        match self {
            ReconcileError::MutationInProgress(id) => id,
            ReconcileError::RolledBack { id, .. } => id,
        }
    }
}

/// Result type alias using ReconcileError.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

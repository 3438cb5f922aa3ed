//! Optimistic favourite mutations for the coupon client.
//!
//! - [`FavouriteReconciler`]: applies a toggle locally, settles it against
//!   the counter service and rolls back on failure
//! - [`FavouriteEntity`]: per-entity display record (remote count, override,
//!   membership, in-flight guard)
//!
//! The favourite set is written through to storage on every change.

mod error;
mod reconciler;
mod registry;

pub use error::{ReconcileError, ReconcileResult};
pub use reconciler::{
    FavouriteChangeCallback, FavouriteChanged, FavouriteReconciler, FavouriteTarget,
    ReconcilerConfig, ToggleOutcome, DEFAULT_MIN_FEEDBACK_DELAY,
};
pub use registry::FavouriteEntity;

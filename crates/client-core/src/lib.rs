//! Client session and optimistic mutation core.
//!
//! [`ClientCore`] owns the session state machine and the favourite
//! reconciler, republishes their changes as [`ClientEvent`]s and hands out
//! read-only [`ClientView`]s. A single instance can be installed process-wide
//! with [`install`].

mod client;
mod error;
mod events;
mod global;
mod view;

pub use client::{Capabilities, ClientCore, CoreOptions};
pub use error::{ClientError, ClientResult};
pub use events::ClientEvent;
pub use global::{global, install};
pub use view::ClientView;

pub use auth_session::{SessionError, SessionSnapshot, SessionState, SessionStateChanged};
pub use favourite_reconciler::{
    FavouriteChanged, FavouriteEntity, FavouriteTarget, ReconcileError, ToggleOutcome,
};
pub use remote_capabilities::User;

//! Events published to client subscribers.

use auth_session::SessionStateChanged;
use favourite_reconciler::FavouriteChanged;
use serde::{Deserialize, Serialize};

/// Everything a UI needs to re-render after a change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    Session(SessionStateChanged),
    Favourite(FavouriteChanged),
}

impl ClientEvent {
    /// Entity id for favourite events.
    pub fn entity_id(&self) -> Option<&str> {
        match self {
            ClientEvent::Favourite(change) => Some(&change.id),
            ClientEvent::Session(_) => None,
        }
    }
}

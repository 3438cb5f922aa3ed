//! Values exchanged with the backing service.

use serde::{Deserialize, Serialize};

/// Authenticated user as reported by the auth service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Opaque profile metadata supplied at sign-up.
    #[serde(default, alias = "user_metadata")]
    pub metadata: serde_json::Value,
}

impl User {
    pub fn new(id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            id: id.into(),
            email,
            metadata: serde_json::Value::Null,
        }
    }
}

/// An existing session found by `get_session`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteSession {
    pub user: User,
    /// Expiry as reported by the service (RFC 3339), if known.
    #[serde(default)]
    pub expires_at: Option<String>,
}

/// Direction of a favourite counter mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterAction {
    Increment,
    Decrement,
}

impl CounterAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CounterAction::Increment => "increment",
            CounterAction::Decrement => "decrement",
        }
    }

    /// Action that moves the counter towards a favourited or unfavourited state.
    pub fn for_favourited(favourited: bool) -> Self {
        if favourited {
            CounterAction::Increment
        } else {
            CounterAction::Decrement
        }
    }
}

/// Telemetry event kinds recorded for entity interactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Click,
    AddToFavourite,
    RemoveFromFavourite,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::AddToFavourite => "add_to_favourite",
            EventKind::RemoveFromFavourite => "remove_from_favourite",
        }
    }
}

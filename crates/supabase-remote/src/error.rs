//! Error types for the Supabase adapter.

use remote_capabilities::RemoteError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SupabaseError {
    /// Network or transport-level HTTP error from reqwest.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Supabase answered with a non-success status.
    #[error("Supabase error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body did not match the expected schema.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type SupabaseResult<T> = Result<T, SupabaseError>;

/// Statuses the auth endpoints use to reject a request from the user.
const AUTH_REJECTION_STATUSES: [u16; 3] = [400, 401, 422];

impl SupabaseError {
    /// Map to the capability error seen by the client core.
    ///
    /// `auth_endpoint` selects whether 400/401/422 mean rejected credentials.
    pub fn into_remote(self, auth_endpoint: bool) -> RemoteError {
        match self {
            SupabaseError::Api { status, message }
                if auth_endpoint && AUTH_REJECTION_STATUSES.contains(&status) =>
            {
                RemoteError::Auth(message)
            }
            SupabaseError::Api { status, message } => RemoteError::Service { status, message },
            SupabaseError::Http(e) if e.is_decode() => RemoteError::Service {
                status: e.status().map_or(200, |s| s.as_u16()),
                message: e.to_string(),
            },
            SupabaseError::Http(e) => RemoteError::Unavailable(e.to_string()),
            SupabaseError::Json(e) => RemoteError::Service {
                status: 200,
                message: format!("malformed response: {}", e),
            },
            SupabaseError::Config(message) => RemoteError::Unavailable(message),
        }
    }
}

/// Pull a human readable message out of a Supabase error body.
///
/// GoTrue uses `error_description` or `msg`, PostgREST and functions use
/// `message` or `error`; anything else is returned verbatim.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(|v| v.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| body.trim().to_string())
}

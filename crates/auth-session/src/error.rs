//! Session error types.

use crate::{SessionOperation, SessionState};
use remote_capabilities::RemoteError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The auth service rejected the credentials (or the sign-up request).
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The auth service did not confirm the sign-out; the session is kept.
    #[error("Sign-out failed: {0}")]
    SignOutFailed(String),

    /// Transport failure or server-side fault during an auth call.
    #[error("Remote unavailable: {0}")]
    RemoteUnavailable(String),

    /// Another auth operation is still in flight.
    #[error("Auth operation already in progress")]
    OperationInProgress,

    /// The operation is not legal in the current state.
    #[error("Cannot {operation} while {state}")]
    IllegalOperation {
        operation: SessionOperation,
        state: SessionState,
    },
}

impl SessionError {
    /// Map a remote failure of sign-in or sign-up.
    pub(crate) fn from_credential_failure(error: RemoteError) -> Self {
        match error {
            RemoteError::Auth(message) => SessionError::InvalidCredentials(message),
            RemoteError::Service { status, message } if status < 500 => {
                SessionError::InvalidCredentials(message)
            }
            other => SessionError::RemoteUnavailable(other.to_string()),
        }
    }

    /// Text surfaced through `last_error`.
    pub(crate) fn user_message(&self) -> String {
        match self {
            SessionError::InvalidCredentials(message) => message.clone(),
            SessionError::RemoteUnavailable(_) => "Login failed".to_string(),
            SessionError::SignOutFailed(_) => "Logout failed".to_string(),
            other => other.to_string(),
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

//! Errors reported by remote capabilities.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The service rejected the credentials or the auth request.
    #[error("Authentication rejected: {0}")]
    Auth(String),

    /// The service answered with a non-success status.
    #[error("Service error: {status} - {message}")]
    Service { status: u16, message: String },

    /// Transport failure: no answer was received.
    #[error("Remote unavailable: {0}")]
    Unavailable(String),
}

impl RemoteError {
    /// True for failures worth retrying (transport errors and 5xx answers).
    pub fn is_transient(&self) -> bool {
        match self {
            RemoteError::Unavailable(_) => true,
            RemoteError::Service { status, .. } => *status >= 500,
            RemoteError::Auth(_) => false,
        }
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

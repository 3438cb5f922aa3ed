//! Client core error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Storage error: {0}")]
    Storage(#[from] client_storage::StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] client_config_and_utils::CoreError),

    /// `install` was called after a client was already installed.
    #[error("Client core already installed")]
    AlreadyInstalled,
}

pub type ClientResult<T> = Result<T, ClientError>;

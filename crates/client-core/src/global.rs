//! Process-wide client handle.
//!
//! Installed once at startup and alive until the process exits.

use crate::{ClientCore, ClientError, ClientResult};
use std::sync::{Arc, OnceLock};
use tracing::info;

static CLIENT: OnceLock<Arc<ClientCore>> = OnceLock::new();

/// Install `core` as the process-wide client.
///
/// Fails with `AlreadyInstalled` on every call after the first.
pub fn install(core: ClientCore) -> ClientResult<Arc<ClientCore>> {
    let core = Arc::new(core);
    CLIENT
        .set(core.clone())
        .map_err(|_| ClientError::AlreadyInstalled)?;
    info!("Client core installed");
    Ok(core)
}

/// The installed client, if any.
pub fn global() -> Option<Arc<ClientCore>> {
    CLIENT.get().cloned()
}

//! Client facade wiring the session manager and the favourite reconciler.

use crate::{ClientEvent, ClientResult, ClientView};
use auth_session::{SessionManager, SessionResult};
use client_config_and_utils::{Config, Paths, DEFAULT_EVENT_CHANNEL_CAPACITY};
use client_storage::{create_storage, FavouriteSetStore};
use favourite_reconciler::{
    FavouriteReconciler, FavouriteTarget, ReconcileResult, ReconcilerConfig, ToggleOutcome,
};
use remote_capabilities::{AuthService, CounterService, TelemetrySink, User};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Tunables for a [`ClientCore`].
#[derive(Debug, Clone)]
pub struct CoreOptions {
    pub min_feedback_delay: Duration,
    pub event_channel_capacity: usize,
}

impl Default for CoreOptions {
    fn default() -> Self {
        Self {
            min_feedback_delay: ReconcilerConfig::default().min_feedback_delay,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl From<&Config> for CoreOptions {
    fn from(config: &Config) -> Self {
        Self {
            min_feedback_delay: config.min_feedback_delay(),
            event_channel_capacity: config.event_channel_capacity.max(1),
        }
    }
}

/// The capabilities a core is built from.
pub struct Capabilities {
    pub auth: Arc<dyn AuthService>,
    pub counter: Arc<dyn CounterService>,
    pub telemetry: Arc<dyn TelemetrySink>,
}

impl Capabilities {
    /// Use one backend for every capability.
    pub fn from_backend<R>(backend: Arc<R>) -> Self
    where
        R: AuthService + CounterService + TelemetrySink + 'static,
    {
        Self {
            auth: backend.clone(),
            counter: backend.clone(),
            telemetry: backend,
        }
    }
}

/// Entry point for UI collaborators.
///
/// Imperative operations live here; reads go through [`ClientView`]. Every
/// state change is republished on a broadcast channel.
pub struct ClientCore {
    session: Arc<SessionManager>,
    reconciler: Arc<FavouriteReconciler>,
    event_tx: broadcast::Sender<ClientEvent>,
}

impl ClientCore {
    pub fn new(capabilities: Capabilities, store: FavouriteSetStore, options: CoreOptions) -> Self {
        let (event_tx, _) = broadcast::channel(options.event_channel_capacity.max(1));

        let session = Arc::new(SessionManager::new(capabilities.auth));
        let reconciler = Arc::new(FavouriteReconciler::new(
            store,
            capabilities.counter,
            capabilities.telemetry,
            ReconcilerConfig {
                min_feedback_delay: options.min_feedback_delay,
            },
        ));

        // Send only fails without subscribers, which is fine.
        session.set_state_callback(Box::new({
            let tx = event_tx.clone();
            move |change| {
                let _ = tx.send(ClientEvent::Session(change));
            }
        }));
        reconciler.set_change_callback(Box::new({
            let tx = event_tx.clone();
            move |change| {
                let _ = tx.send(ClientEvent::Favourite(change));
            }
        }));

        debug!(
            favourites = reconciler.favourites().len(),
            "Client core created"
        );

        Self {
            session,
            reconciler,
            event_tx,
        }
    }

    /// Build a core persisting favourites under `paths`.
    pub fn from_config(
        config: &Config,
        paths: &Paths,
        capabilities: Capabilities,
    ) -> ClientResult<Self> {
        paths.ensure_dirs()?;
        let storage = create_storage(&paths.store_file())?;
        info!(store = %paths.store_file().display(), "Opened client store");

        Ok(Self::new(
            capabilities,
            FavouriteSetStore::new(storage),
            CoreOptions::from(config),
        ))
    }

    /// Subscribe to client events.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.event_tx.subscribe()
    }

    pub fn view(&self) -> ClientView {
        ClientView::new(self.session.clone(), self.reconciler.clone())
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> SessionResult<User> {
        self.session.sign_in(email, password).await
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: serde_json::Value,
    ) -> SessionResult<User> {
        self.session.sign_up(email, password, metadata).await
    }

    pub async fn sign_out(&self) -> SessionResult<()> {
        self.session.sign_out().await
    }

    pub async fn check_session(&self) -> SessionResult<bool> {
        self.session.check_session().await
    }

    pub fn clear_error(&self) {
        self.session.clear_error();
    }

    pub async fn toggle_favourite(&self, target: &FavouriteTarget) -> ReconcileResult<ToggleOutcome> {
        self.reconciler.toggle_favourite(target).await
    }

    /// Feed a server-fetched favourite count.
    pub fn apply_remote_count(&self, id: &str, count: u64) {
        self.reconciler.apply_remote_count(id, count);
    }

    pub fn record_click(&self, id: &str) {
        self.reconciler.record_click(id);
    }
}

impl std::fmt::Debug for ClientCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCore")
            .field("session", &self.session)
            .field("reconciler", &self.reconciler)
            .finish()
    }
}

#![allow(dead_code)]

use async_trait::async_trait;
use client_core::{Capabilities, ClientCore, CoreOptions};
use client_storage::{FavouriteSetStore, MemoryStorage};
use parking_lot::Mutex;
use remote_capabilities::{
    AuthService, CounterAction, CounterService, EventKind, RemoteError, RemoteResult,
    RemoteSession, TelemetrySink, User,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

pub const PASSWORD: &str = "correct horse";

/// In-process stand-in for the backing service.
///
/// Accepts `PASSWORD` for any email, keeps one remote session, and can be
/// told to fail or to hold counter calls until released.
pub struct FakeBackend {
    session: Mutex<Option<User>>,
    pub fail_sign_out: AtomicBool,
    pub fail_counter: AtomicBool,
    pub hold_counter: AtomicBool,
    pub counter_started: Notify,
    pub counter_release: Notify,
    pub counter_calls: Mutex<Vec<(String, CounterAction)>>,
    pub events: Mutex<Vec<(String, EventKind)>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            session: Mutex::new(None),
            fail_sign_out: AtomicBool::new(false),
            fail_counter: AtomicBool::new(false),
            hold_counter: AtomicBool::new(false),
            counter_started: Notify::new(),
            counter_release: Notify::new(),
            counter_calls: Mutex::new(Vec::new()),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Pretend a previous run left a valid session behind.
    pub fn with_existing_session(email: &str) -> Self {
        let backend = Self::new();
        *backend.session.lock() = Some(user_for(email));
        backend
    }

    pub fn has_remote_session(&self) -> bool {
        self.session.lock().is_some()
    }
}

pub fn user_for(email: &str) -> User {
    User::new(format!("user-{}", email), Some(email.to_string()))
}

#[async_trait]
impl AuthService for FakeBackend {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> RemoteResult<User> {
        if password != PASSWORD {
            return Err(RemoteError::Auth("Invalid login credentials".into()));
        }
        let user = user_for(email);
        *self.session.lock() = Some(user.clone());
        Ok(user)
    }

    async fn sign_up(
        &self,
        email: &str,
        _password: &str,
        metadata: serde_json::Value,
    ) -> RemoteResult<User> {
        let mut user = user_for(email);
        user.metadata = metadata;
        *self.session.lock() = Some(user.clone());
        Ok(user)
    }

    async fn sign_out(&self) -> RemoteResult<()> {
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("network down".into()));
        }
        *self.session.lock() = None;
        Ok(())
    }

    async fn get_session(&self) -> RemoteResult<Option<RemoteSession>> {
        Ok(self.session.lock().clone().map(|user| RemoteSession {
            user,
            expires_at: None,
        }))
    }
}

#[async_trait]
impl CounterService for FakeBackend {
    async fn invoke_counter_mutation(
        &self,
        entity_id: &str,
        action: CounterAction,
    ) -> RemoteResult<()> {
        self.counter_calls.lock().push((entity_id.to_string(), action));
        self.counter_started.notify_one();
        if self.hold_counter.load(Ordering::SeqCst) {
            self.counter_release.notified().await;
        }
        if self.fail_counter.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("counter offline".into()));
        }
        Ok(())
    }
}

impl TelemetrySink for FakeBackend {
    fn record(&self, entity_id: &str, kind: EventKind) {
        self.events.lock().push((entity_id.to_string(), kind));
    }
}

/// Core over `backend` with in-memory storage and no feedback delay.
pub fn core_with(backend: Arc<FakeBackend>) -> ClientCore {
    ClientCore::new(
        Capabilities::from_backend(backend),
        FavouriteSetStore::new(Box::new(MemoryStorage::new())),
        CoreOptions {
            min_feedback_delay: Duration::ZERO,
            event_channel_capacity: 64,
        },
    )
}

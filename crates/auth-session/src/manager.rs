//! Session manager driving the session FSM around remote auth calls.
//!
//! The FSM, the signed-in `user` and `last_error` live behind one lock so a
//! reader never observes `Authenticated` without a user or the reverse.
//! Remote calls happen outside the lock; the transient FSM state is what
//! keeps a second operation from starting meanwhile.

use crate::session_fsm::{
    SessionMachine, SessionMachineInput, SessionOperation, SessionState, SessionStateChanged,
};
use crate::{SessionError, SessionResult};
use parking_lot::Mutex;
use remote_capabilities::{AuthService, User};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Callback type for session state change notifications.
pub type SessionStateCallback = Box<dyn Fn(SessionStateChanged) + Send + Sync>;

/// Point-in-time view of the session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub authenticated: bool,
    pub loading: bool,
    pub operation: Option<SessionOperation>,
    pub user: Option<User>,
    pub last_error: Option<String>,
}

struct SessionInner {
    machine: SessionMachine,
    user: Option<User>,
    last_error: Option<String>,
}

impl SessionInner {
    fn state(&self) -> SessionState {
        SessionState::from(self.machine.state())
    }

    fn payload(&self) -> SessionStateChanged {
        SessionStateChanged::new(self.state(), self.user.as_ref(), self.last_error.as_deref())
    }
}

enum ErrorUpdate {
    Keep,
    Clear,
    Set(String),
}

/// Owner of the process-wide authentication state.
pub struct SessionManager {
    auth: Arc<dyn AuthService>,
    inner: Mutex<SessionInner>,
    state_callback: Mutex<Option<SessionStateCallback>>,
}

impl SessionManager {
    pub fn new(auth: Arc<dyn AuthService>) -> Self {
        Self {
            auth,
            inner: Mutex::new(SessionInner {
                machine: SessionMachine::new(),
                user: None,
                last_error: None,
            }),
            state_callback: Mutex::new(None),
        }
    }

    /// Set a callback notified after every visible state or error change.
    ///
    /// The callback runs on the task that caused the change and must not call
    /// `set_state_callback` itself.
    pub fn set_state_callback(&self, callback: SessionStateCallback) {
        *self.state_callback.lock() = Some(callback);
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().state()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    /// True while any auth operation is in flight.
    pub fn is_loading(&self) -> bool {
        self.state().is_transient()
    }

    pub fn current_user(&self) -> Option<User> {
        self.inner.lock().user.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.inner.lock().last_error.clone()
    }

    pub fn operation_in_flight(&self) -> Option<SessionOperation> {
        SessionOperation::in_flight(self.inner.lock().machine.state())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner.lock();
        let state = inner.state();
        SessionSnapshot {
            state,
            authenticated: state.is_authenticated(),
            loading: state.is_transient(),
            operation: SessionOperation::in_flight(inner.machine.state()),
            user: inner.user.clone(),
            last_error: inner.last_error.clone(),
        }
    }

    /// Sign in with email and password.
    ///
    /// Unauthenticated -> SigningIn -> (Authenticated | Unauthenticated).
    /// Failures are surfaced through `last_error` as well as the result.
    pub async fn sign_in(&self, email: &str, password: &str) -> SessionResult<User> {
        let pending = self.begin(SessionOperation::SignIn, true)?;

        debug!(email = %email, "Attempting email/password sign-in");

        match self.auth.sign_in_with_password(email, password).await {
            Ok(user) => {
                info!(user_id = %user.id, "Sign-in successful");
                pending.authenticate(user.clone());
                Ok(user)
            }
            Err(remote) => {
                let error = SessionError::from_credential_failure(remote);
                warn!(error = %error, "Sign-in failed");
                pending.fail(ErrorUpdate::Set(error.user_message()));
                Err(error)
            }
        }
    }

    /// Create an account and sign in; `metadata` is forwarded untouched.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: serde_json::Value,
    ) -> SessionResult<User> {
        let pending = self.begin(SessionOperation::SignUp, true)?;

        debug!(email = %email, "Attempting sign-up");

        match self.auth.sign_up(email, password, metadata).await {
            Ok(user) => {
                info!(user_id = %user.id, "Sign-up successful");
                pending.authenticate(user.clone());
                Ok(user)
            }
            Err(remote) => {
                let error = SessionError::from_credential_failure(remote);
                warn!(error = %error, "Sign-up failed");
                pending.fail(ErrorUpdate::Set(error.user_message()));
                Err(error)
            }
        }
    }

    /// Sign out.
    ///
    /// Authenticated -> SigningOut -> (Unauthenticated | Authenticated).
    /// The user is only dropped once the service confirms; on failure the
    /// previous session is restored untouched.
    pub async fn sign_out(&self) -> SessionResult<()> {
        let pending = self.begin(SessionOperation::SignOut, false)?;

        match self.auth.sign_out().await {
            Ok(()) => {
                pending.confirm_sign_out();
                info!("Signed out");
                Ok(())
            }
            Err(remote) => {
                let error = SessionError::SignOutFailed(remote.to_string());
                warn!(error = %error, "Sign-out failed, keeping session");
                pending.fail(ErrorUpdate::Set(error.user_message()));
                Err(error)
            }
        }
    }

    /// Adopt an existing remote session if there is one.
    ///
    /// Idempotent: returns `Ok(true)` straight away when already authenticated.
    /// A missing session or a failing lookup leaves the state Unauthenticated
    /// and is only logged.
    pub async fn check_session(&self) -> SessionResult<bool> {
        let pending = match self.begin(SessionOperation::CheckSession, false) {
            Ok(pending) => pending,
            Err(SessionError::IllegalOperation {
                state: SessionState::Authenticated,
                ..
            }) => {
                debug!("Session check skipped, already authenticated");
                return Ok(true);
            }
            Err(error) => return Err(error),
        };

        match self.auth.get_session().await {
            Ok(Some(session)) => {
                info!(user_id = %session.user.id, "Existing session restored");
                pending.authenticate(session.user);
                Ok(true)
            }
            Ok(None) => {
                info!("No existing session found");
                pending.fail(ErrorUpdate::Keep);
                Ok(false)
            }
            Err(error) => {
                warn!(error = %error, "Session check failed");
                pending.fail(ErrorUpdate::Keep);
                Ok(false)
            }
        }
    }

    /// Reset `last_error` without touching the state.
    pub fn clear_error(&self) {
        let payload = {
            let mut inner = self.inner.lock();
            if inner.last_error.take().is_none() {
                return;
            }
            inner.payload()
        };
        self.notify(payload);
    }

    fn begin(&self, operation: SessionOperation, clear_error: bool) -> SessionResult<InFlight<'_>> {
        let (payload, held_user) = {
            let mut inner = self.inner.lock();
            let current = inner.state();

            if inner.machine.consume(&operation.start_input()).is_err() {
                return Err(if current.is_transient() {
                    SessionError::OperationInProgress
                } else {
                    SessionError::IllegalOperation {
                        operation,
                        state: current,
                    }
                });
            }

            // Only sign-out starts from Authenticated; the operation holds the
            // user until the service confirms.
            let held_user = inner.user.take();
            if clear_error {
                inner.last_error = None;
            }
            (inner.payload(), held_user)
        };

        debug!(operation = %operation, "Auth operation started");
        self.notify(payload);

        Ok(InFlight {
            manager: self,
            operation,
            held_user,
            settled: false,
        })
    }

    fn settle(&self, input: &SessionMachineInput, user: Option<User>, error: ErrorUpdate) {
        let (old_state, payload) = {
            let mut inner = self.inner.lock();
            let old_state = inner.state();

            if inner.machine.consume(input).is_err() {
                warn!(?input, state = %old_state, "Ignoring settlement for unexpected state");
                return;
            }

            inner.user = if inner.state().is_authenticated() {
                user
            } else {
                None
            };
            match error {
                ErrorUpdate::Keep => {}
                ErrorUpdate::Clear => inner.last_error = None,
                ErrorUpdate::Set(message) => inner.last_error = Some(message),
            }
            (old_state, inner.payload())
        };

        debug!(
            old_state = %old_state,
            new_state = %payload.state,
            "Auth state transition"
        );
        self.notify(payload);
    }

    fn notify(&self, payload: SessionStateChanged) {
        if let Some(callback) = self.state_callback.lock().as_ref() {
            callback(payload);
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// An auth operation between its start and settlement transitions.
///
/// Dropping it unsettled (the caller abandoned the future) applies the
/// operation's failure input, so the machine never stays transient.
struct InFlight<'a> {
    manager: &'a SessionManager,
    operation: SessionOperation,
    held_user: Option<User>,
    settled: bool,
}

impl InFlight<'_> {
    fn authenticate(mut self, user: User) {
        self.settled = true;
        self.manager.settle(
            &self.operation.success_input(),
            Some(user),
            ErrorUpdate::Clear,
        );
    }

    fn confirm_sign_out(mut self) {
        self.settled = true;
        self.held_user = None;
        self.manager
            .settle(&self.operation.success_input(), None, ErrorUpdate::Clear);
    }

    fn fail(mut self, error: ErrorUpdate) {
        self.settled = true;
        let restored = self.held_user.take();
        self.manager
            .settle(&self.operation.failure_input(), restored, error);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!(operation = %self.operation, "Auth operation abandoned before settling");
            let restored = self.held_user.take();
            self.manager
                .settle(&self.operation.failure_input(), restored, ErrorUpdate::Keep);
        }
    }
}

//! Session state machine using rust-fsm.
//!
//! ## State Diagram
//!
//! ```text
//! Unauthenticated ──SignInAttempt──► SigningIn ──SignInSucceeded──► Authenticated
//!        ▲  │  │                                                       │   ▲
//!        │  │  └─SignUpAttempt──► SigningUp ──SignUpSucceeded────────► │   │
//!        │  └────SessionCheck───► CheckingSession ──SessionFound─────► │   │
//!        │                                                             │   │
//!        ├── SignInFailed / SignUpFailed / NoSession                   │   │
//!        │                                         SignOutRequested    │   │ SignOutFailed
//!        │                                                             ▼   │
//!        └──────────────────── SignOutConfirmed ──────────────────  SigningOut
//! ```
//!
//! Every transient state only accepts its own settlement inputs, so a second
//! operation can never start while one is in flight.

use remote_capabilities::User;
use rust_fsm::*;
use serde::{Deserialize, Serialize};
use std::fmt;

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(Unauthenticated)

    Unauthenticated => {
        SignInAttempt => SigningIn,
        SignUpAttempt => SigningUp,
        SessionCheck => CheckingSession
    },
    SigningIn => {
        SignInSucceeded => Authenticated,
        SignInFailed => Unauthenticated
    },
    SigningUp => {
        SignUpSucceeded => Authenticated,
        SignUpFailed => Unauthenticated
    },
    CheckingSession => {
        SessionFound => Authenticated,
        NoSession => Unauthenticated
    },
    Authenticated => {
        SignOutRequested => SigningOut
    },
    SigningOut => {
        SignOutConfirmed => Unauthenticated,
        SignOutFailed => Authenticated
    }
}

pub use session_machine::Input as SessionMachineInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// Pure transition function: the state reached from `state` on `input`, if legal.
pub fn next_state(
    state: &SessionMachineState,
    input: &SessionMachineInput,
) -> Option<SessionMachineState> {
    <session_machine::Impl as StateMachineImpl>::transition(state, input)
}

/// Session state as seen by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Unauthenticated,
    /// An auth operation is in flight.
    Authenticating,
    Authenticated,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated)
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, SessionState::Authenticating)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Unauthenticated => "unauthenticated",
            SessionState::Authenticating => "authenticating",
            SessionState::Authenticated => "authenticated",
        };
        f.write_str(name)
    }
}

impl From<&SessionMachineState> for SessionState {
    fn from(state: &SessionMachineState) -> Self {
        match state {
            SessionMachineState::Unauthenticated => SessionState::Unauthenticated,
            SessionMachineState::SigningIn
            | SessionMachineState::SigningUp
            | SessionMachineState::CheckingSession
            | SessionMachineState::SigningOut => SessionState::Authenticating,
            SessionMachineState::Authenticated => SessionState::Authenticated,
        }
    }
}

/// The four auth operations, each owning its start and settlement inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOperation {
    SignIn,
    SignUp,
    CheckSession,
    SignOut,
}

impl SessionOperation {
    pub fn start_input(&self) -> SessionMachineInput {
        match self {
            SessionOperation::SignIn => SessionMachineInput::SignInAttempt,
            SessionOperation::SignUp => SessionMachineInput::SignUpAttempt,
            SessionOperation::CheckSession => SessionMachineInput::SessionCheck,
            SessionOperation::SignOut => SessionMachineInput::SignOutRequested,
        }
    }

    pub fn success_input(&self) -> SessionMachineInput {
        match self {
            SessionOperation::SignIn => SessionMachineInput::SignInSucceeded,
            SessionOperation::SignUp => SessionMachineInput::SignUpSucceeded,
            SessionOperation::CheckSession => SessionMachineInput::SessionFound,
            SessionOperation::SignOut => SessionMachineInput::SignOutConfirmed,
        }
    }

    /// Input that returns the machine to the state the operation started from.
    pub fn failure_input(&self) -> SessionMachineInput {
        match self {
            SessionOperation::SignIn => SessionMachineInput::SignInFailed,
            SessionOperation::SignUp => SessionMachineInput::SignUpFailed,
            SessionOperation::CheckSession => SessionMachineInput::NoSession,
            SessionOperation::SignOut => SessionMachineInput::SignOutFailed,
        }
    }

    /// Operation in flight for a machine state, if any.
    pub fn in_flight(state: &SessionMachineState) -> Option<Self> {
        match state {
            SessionMachineState::SigningIn => Some(SessionOperation::SignIn),
            SessionMachineState::SigningUp => Some(SessionOperation::SignUp),
            SessionMachineState::CheckingSession => Some(SessionOperation::CheckSession),
            SessionMachineState::SigningOut => Some(SessionOperation::SignOut),
            SessionMachineState::Unauthenticated | SessionMachineState::Authenticated => None,
        }
    }
}

impl fmt::Display for SessionOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionOperation::SignIn => "sign_in",
            SessionOperation::SignUp => "sign_up",
            SessionOperation::CheckSession => "check_session",
            SessionOperation::SignOut => "sign_out",
        };
        f.write_str(name)
    }
}

/// Payload delivered to state change subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStateChanged {
    pub state: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl SessionStateChanged {
    pub(crate) fn new(state: SessionState, user: Option<&User>, last_error: Option<&str>) -> Self {
        Self {
            state,
            user_id: user.map(|u| u.id.clone()),
            email: user.and_then(|u| u.email.clone()),
            last_error: last_error.map(str::to_string),
        }
    }
}

//! Authentication session lifecycle for the coupon client.
//!
//! This crate provides:
//! - An explicit FSM (`rust-fsm`) over the session lifecycle
//! - `SessionManager`, which drives the FSM around remote auth calls with
//!   single-flight discipline and keeps `user` consistent with the state
//! - State change notifications for reactive consumers

mod error;
mod manager;
mod session_fsm;

pub use error::{SessionError, SessionResult};
pub use manager::{SessionManager, SessionSnapshot, SessionStateCallback};
pub use session_fsm::session_machine;
pub use session_fsm::{
    next_state, SessionMachine, SessionMachineInput, SessionMachineState, SessionOperation,
    SessionState, SessionStateChanged,
};

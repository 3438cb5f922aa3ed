//! Capabilities the client core consumes from its backing service.
//!
//! The core never talks to the network itself. Hosts plug in implementations
//! of [`AuthService`], [`CounterService`] and [`TelemetrySink`].

mod error;
mod services;
mod types;

pub use error::{RemoteError, RemoteResult};
pub use services::{AuthService, CounterService, NoopTelemetry, TelemetrySink};
pub use types::{CounterAction, EventKind, RemoteSession, User};

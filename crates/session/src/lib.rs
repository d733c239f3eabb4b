//! Peer session: one connection, one transfer at a time.
//!
//! [`run_session`] owns both halves of the connection. An inbound task reads
//! peer commands and receives files; the caller's task reads local commands
//! and starts outgoing transfers. Everything observable is published as a
//! [`SessionEvent`].

mod config;
mod error;
mod events;
pub mod gate;
mod local;
mod pumps;
mod session;
mod state;

pub use config::SessionConfig;
pub use error::SessionError;
pub use events::SessionEvent;
pub use gate::{AcceptanceGate, AcceptanceWaiter, Decision, GateOutcome};
pub use local::USAGE;
pub use session::{DisconnectReason, run_session};
pub use state::SessionState;

//! Single-use rendezvous between the send flow and the inbound reader.
//!
//! The send flow opens a gate before writing `SENDFILE` and waits on it;
//! the inbound reader resolves it when the peer answers.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::debug;

/// The peer's answer to a file offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject(String),
}

/// What the waiting sender observes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    Accepted,
    Rejected { reason: String },
    TimedOut,
    /// The gate was closed or replaced before an answer arrived.
    StreamClosed,
}

struct Pending {
    file_name: String,
    tx: oneshot::Sender<Decision>,
}

/// Holds at most one pending offer.
#[derive(Default)]
pub struct AcceptanceGate {
    pending: Mutex<Option<Pending>>,
}

impl AcceptanceGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a gate for `file_name`, replacing any previous one.
    ///
    /// A replaced waiter observes [`GateOutcome::StreamClosed`].
    pub fn open(&self, file_name: impl Into<String>) -> AcceptanceWaiter {
        let file_name = file_name.into();
        let (tx, rx) = oneshot::channel();
        let previous = self.lock().replace(Pending {
            file_name: file_name.clone(),
            tx,
        });
        if let Some(prev) = previous {
            debug!(file = %prev.file_name, "acceptance gate replaced");
        }
        AcceptanceWaiter { file_name, rx }
    }

    /// Resolves the current gate. Only the first call has an effect.
    pub fn resolve(&self, decision: Decision) -> bool {
        match self.lock().take() {
            Some(pending) => pending.tx.send(decision).is_ok(),
            None => false,
        }
    }

    /// Resolves the current gate only if it was opened for `file_name`.
    pub fn resolve_for(&self, file_name: &str, decision: Decision) -> bool {
        let mut guard = self.lock();
        let matches = guard
            .as_ref()
            .is_some_and(|pending| pending.file_name == file_name);
        if !matches {
            return false;
        }
        match guard.take() {
            Some(pending) => pending.tx.send(decision).is_ok(),
            None => false,
        }
    }

    /// Abandons the pending gate, if any.
    pub fn close(&self) {
        self.lock().take();
    }

    pub fn is_pending(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Pending>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Receiving end of an opened gate.
pub struct AcceptanceWaiter {
    file_name: String,
    rx: oneshot::Receiver<Decision>,
}

impl AcceptanceWaiter {
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Waits for the peer's answer for at most `timeout`.
    pub async fn wait(self, timeout: Duration) -> GateOutcome {
        match tokio::time::timeout(timeout, self.rx).await {
            Ok(Ok(Decision::Accept)) => GateOutcome::Accepted,
            Ok(Ok(Decision::Reject(reason))) => GateOutcome::Rejected { reason },
            Ok(Err(_)) => GateOutcome::StreamClosed,
            Err(_) => GateOutcome::TimedOut,
        }
    }
}

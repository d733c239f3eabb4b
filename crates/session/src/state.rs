//! Session state and the single-transfer claim.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

/// Observable phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingAcceptance,
    Sending,
    Receiving,
    Closed,
}

impl SessionState {
    /// True while a transfer or an acceptance wait owns the session.
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            Self::AwaitingAcceptance | Self::Sending | Self::Receiving
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::AwaitingAcceptance => "awaiting acceptance",
            Self::Sending => "sending",
            Self::Receiving => "receiving",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Transfer flag plus the published state.
pub(crate) struct StateCell {
    in_progress: AtomicBool,
    state: watch::Sender<SessionState>,
}

impl StateCell {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            in_progress: AtomicBool::new(false),
            state: watch::Sender::new(SessionState::Idle),
        })
    }

    pub(crate) fn get(&self) -> SessionState {
        *self.state.borrow()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Claims the transfer slot, moving to `next`.
    ///
    /// Returns `None` when another transfer already holds it or the session
    /// is closed.
    pub(crate) fn try_claim(self: &Arc<Self>, next: SessionState) -> Option<TransferGuard> {
        if self.get() == SessionState::Closed {
            return None;
        }
        self.in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        self.set(next);
        Some(TransferGuard {
            cell: Arc::clone(self),
        })
    }

    pub(crate) fn close(&self) {
        self.state.send_replace(SessionState::Closed);
    }

    fn set(&self, next: SessionState) {
        self.state.send_if_modified(|current| {
            if *current == SessionState::Closed || *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}

/// Holds the transfer slot; dropping it returns the session to idle.
pub(crate) struct TransferGuard {
    cell: Arc<StateCell>,
}

impl TransferGuard {
    pub(crate) fn advance(&self, next: SessionState) {
        self.cell.set(next);
    }
}

impl Drop for TransferGuard {
    fn drop(&mut self) {
        self.cell.set(SessionState::Idle);
        self.cell.in_progress.store(false, Ordering::Release);
    }
}

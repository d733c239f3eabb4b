//! Events published by a running session.

use std::path::PathBuf;

use peerlink_protocol::Command;
use peerlink_transfer::{Direction, TransferProgress};

use crate::state::SessionState;

/// Everything a front end may want to show about a session.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A well-formed command arrived from the peer.
    PeerCommand(Command),
    /// A `SENDFILE` was written; waiting for the peer's answer.
    AwaitingAcceptance { file_name: String, file_size: u64 },
    /// The peer accepted our offer; payload streaming starts.
    SendAccepted { file_name: String },
    /// The peer refused our offer or reported an error before payload.
    SendRejected { file_name: String, reason: String },
    /// The peer did not answer in time.
    AcceptanceTimedOut { file_name: String },
    /// An incoming offer was accepted automatically.
    Receiving {
        file_name: String,
        file_size: u64,
        path: PathBuf,
    },
    Progress(TransferProgress),
    TransferFinished {
        file_name: String,
        direction: Direction,
        bytes: u64,
        path: PathBuf,
    },
    TransferFailed {
        file_name: String,
        direction: Direction,
        error: String,
    },
    /// A received file was deleted because the sender reported it broken.
    ReceivedFileDiscarded { file_name: String, path: PathBuf },
    /// Answer to the local `status` command.
    Status { state: SessionState, peer: String },
    /// Free-form message for the local user.
    Notice(String),
}

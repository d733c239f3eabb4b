//! Error types for a peer session.

use peerlink_transfer::TransferError;

/// Faults that end a session abnormally.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("connection I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transfer broke the connection: {0}")]
    Transfer(#[from] TransferError),

    #[error("inbound reader failed: {0}")]
    Reader(String),
}

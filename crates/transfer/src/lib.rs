//! Streams a single file over an already established peer connection.
//!
//! The payload has no framing: the receiver reads exactly the size declared
//! by the `SENDFILE` command, so both directions cap their reads at that
//! length to keep the command stream aligned afterwards.

mod engine;
mod progress;
mod validation;

use std::time::Duration;

use peerlink_protocol::constants::{DEFAULT_CHUNK_SIZE, PROGRESS_INTERVAL};

pub use engine::{receive_file, send_file};
pub use progress::{Direction, ProgressReporter, SpeedCalculator, TransferProgress};
pub use validation::sanitize_file_name;

/// Tuning knobs for one transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOptions {
    /// Bytes moved per read/write call. `0` falls back to the default.
    pub chunk_size: usize,
    /// Minimum spacing between progress reports.
    pub progress_interval: Duration,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            progress_interval: PROGRESS_INTERVAL,
        }
    }
}

impl TransferOptions {
    pub(crate) fn effective_chunk_size(&self) -> usize {
        if self.chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            self.chunk_size
        }
    }
}

/// Errors produced by the transfer engine.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// Local file could not be opened, read, created or written.
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection failed while moving payload bytes.
    #[error("connection error: {0}")]
    Stream(std::io::Error),

    #[error("connection closed after {received} of {expected} bytes")]
    PrematureEof { received: u64, expected: u64 },

    #[error("size mismatch: declared {expected} bytes, moved {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("invalid file name: {0}")]
    InvalidFileName(String),
}

impl TransferError {
    /// True when the connection itself is unusable after this error.
    pub fn is_connection_fault(&self) -> bool {
        matches!(self, Self::Stream(_) | Self::PrematureEof { .. })
    }
}

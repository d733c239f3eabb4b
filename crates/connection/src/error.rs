//! Error types for connection bootstrap.

/// Errors produced while establishing the peer connection.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to accept connection: {0}")]
    Accept(#[source] std::io::Error),

    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("connection to {0} timed out")]
    Timeout(String),

    #[error("cancelled")]
    Cancelled,
}

//! Error types for command decoding.

/// Reasons a received line could not be turned into a [`Command`](crate::Command).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("empty command line")]
    Empty,

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// `SENDFILE` with a wrong field count or an unparsable size.
    ///
    /// Carries the file name when one was present so the receiver can
    /// answer with a `TRANSFERERROR` naming it.
    #[error("malformed SENDFILE command: {reason}")]
    MalformedSendFile {
        file_name: Option<String>,
        reason: String,
    },

    #[error("{0} command without a file name")]
    MissingFileName(&'static str),

    #[error("malformed {command} command: expected {expected} fields, got {actual}")]
    FieldCount {
        command: &'static str,
        expected: &'static str,
        actual: usize,
    },
}

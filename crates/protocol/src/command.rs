//! Commands exchanged between peers.
//!
//! Every command travels as one UTF-8 line with fields joined by
//! [`SEPARATOR`]. Raw file payload bytes follow a `FILEACCEPT` out of band;
//! they are never parsed by this module.

use std::fmt;

use crate::constants::{
    CMD_DISCONNECT, CMD_FILEACCEPT, CMD_FILEREJECT, CMD_SENDFILE, CMD_TRANSFERCOMPLETE,
    CMD_TRANSFERERROR, SEPARATOR,
};
use crate::error::CodecError;

/// A single protocol command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Offer to send `file_size` bytes named `file_name`.
    SendFile { file_name: String, file_size: u64 },
    /// Receiver agreed; raw payload follows from the sender.
    FileAccept { file_name: String },
    /// Receiver refused the offer.
    FileReject { file_name: String, reason: String },
    /// Sender wrote every payload byte.
    TransferComplete { file_name: String },
    /// Either side reports a failed offer or transfer.
    TransferError { file_name: String, reason: String },
    /// Peer is leaving.
    Disconnect,
}

impl Command {
    pub fn send_file(file_name: impl Into<String>, file_size: u64) -> Self {
        Self::SendFile {
            file_name: file_name.into(),
            file_size,
        }
    }

    pub fn file_accept(file_name: impl Into<String>) -> Self {
        Self::FileAccept {
            file_name: file_name.into(),
        }
    }

    pub fn file_reject(file_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::FileReject {
            file_name: file_name.into(),
            reason: reason.into(),
        }
    }

    pub fn transfer_complete(file_name: impl Into<String>) -> Self {
        Self::TransferComplete {
            file_name: file_name.into(),
        }
    }

    pub fn transfer_error(file_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::TransferError {
            file_name: file_name.into(),
            reason: reason.into(),
        }
    }

    /// Wire keyword of this command.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::SendFile { .. } => CMD_SENDFILE,
            Self::FileAccept { .. } => CMD_FILEACCEPT,
            Self::FileReject { .. } => CMD_FILEREJECT,
            Self::TransferComplete { .. } => CMD_TRANSFERCOMPLETE,
            Self::TransferError { .. } => CMD_TRANSFERERROR,
            Self::Disconnect => CMD_DISCONNECT,
        }
    }

    /// File name carried by the command, if any.
    pub fn file_name(&self) -> Option<&str> {
        match self {
            Self::SendFile { file_name, .. }
            | Self::FileAccept { file_name }
            | Self::FileReject { file_name, .. }
            | Self::TransferComplete { file_name }
            | Self::TransferError { file_name, .. } => Some(file_name),
            Self::Disconnect => None,
        }
    }

    /// Serializes the command as one newline-terminated line.
    pub fn encode(&self) -> String {
        format!("{self}\n")
    }

    /// Parses one received line.
    ///
    /// Whitespace around the line and around each field is ignored and the
    /// keyword is case-insensitive. Field counts are strict.
    pub fn decode(line: &str) -> Result<Self, CodecError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(CodecError::Empty);
        }

        let fields: Vec<&str> = line.split(SEPARATOR).map(str::trim).collect();
        let keyword = fields[0];

        if keyword.eq_ignore_ascii_case(CMD_DISCONNECT) {
            expect_fields(CMD_DISCONNECT, &fields, 1, "1")?;
            return Ok(Self::Disconnect);
        }

        match keyword.to_ascii_uppercase().as_str() {
            CMD_SENDFILE => decode_send_file(&fields),
            CMD_FILEACCEPT => {
                expect_fields(CMD_FILEACCEPT, &fields, 2, "2")?;
                Ok(Self::FileAccept {
                    file_name: required_name(CMD_FILEACCEPT, fields[1])?,
                })
            }
            CMD_TRANSFERCOMPLETE => {
                expect_fields(CMD_TRANSFERCOMPLETE, &fields, 2, "2")?;
                Ok(Self::TransferComplete {
                    file_name: required_name(CMD_TRANSFERCOMPLETE, fields[1])?,
                })
            }
            CMD_FILEREJECT => {
                let (file_name, reason) = name_and_reason(CMD_FILEREJECT, &fields)?;
                Ok(Self::FileReject { file_name, reason })
            }
            CMD_TRANSFERERROR => {
                let (file_name, reason) = name_and_reason(CMD_TRANSFERERROR, &fields)?;
                Ok(Self::TransferError { file_name, reason })
            }
            _ => Err(CodecError::UnknownCommand(keyword.to_string())),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = SEPARATOR;
        match self {
            Self::SendFile {
                file_name,
                file_size,
            } => write!(f, "{CMD_SENDFILE}{sep}{}{sep}{file_size}", field(file_name)),
            Self::FileAccept { file_name } => {
                write!(f, "{CMD_FILEACCEPT}{sep}{}", field(file_name))
            }
            Self::FileReject { file_name, reason } => write!(
                f,
                "{CMD_FILEREJECT}{sep}{}{sep}{}",
                field(file_name),
                field(reason)
            ),
            Self::TransferComplete { file_name } => {
                write!(f, "{CMD_TRANSFERCOMPLETE}{sep}{}", field(file_name))
            }
            Self::TransferError { file_name, reason } => write!(
                f,
                "{CMD_TRANSFERERROR}{sep}{}{sep}{}",
                field(file_name),
                reason.replace(['\r', '\n'], " ")
            ),
            Self::Disconnect => f.write_str(CMD_DISCONNECT),
        }
    }
}

/// Makes a value safe to embed as a single field of a single line.
fn field(value: &str) -> String {
    value.replace(SEPARATOR, "_").replace(['\r', '\n'], " ")
}

/// The form a file name takes once it has crossed the wire.
///
/// Peers echo names back exactly as they decoded them, so a sender matches
/// replies against this rather than against its local name.
pub fn wire_file_name(name: &str) -> String {
    field(name).trim().to_string()
}

fn decode_send_file(fields: &[&str]) -> Result<Command, CodecError> {
    let file_name = fields
        .get(1)
        .filter(|name| !name.is_empty())
        .map(|name| name.to_string());

    if fields.len() != 3 {
        return Err(CodecError::MalformedSendFile {
            file_name,
            reason: format!("expected 3 fields, got {}", fields.len()),
        });
    }

    let Some(name) = file_name else {
        return Err(CodecError::MalformedSendFile {
            file_name: None,
            reason: "missing file name".into(),
        });
    };

    let file_size = fields[2]
        .parse::<u64>()
        .map_err(|e| CodecError::MalformedSendFile {
            file_name: Some(name.clone()),
            reason: format!("invalid file size {:?}: {e}", fields[2]),
        })?;

    Ok(Command::SendFile {
        file_name: name,
        file_size,
    })
}

fn expect_fields(
    command: &'static str,
    fields: &[&str],
    count: usize,
    expected: &'static str,
) -> Result<(), CodecError> {
    if fields.len() != count {
        return Err(CodecError::FieldCount {
            command,
            expected,
            actual: fields.len(),
        });
    }
    Ok(())
}

fn required_name(command: &'static str, name: &str) -> Result<String, CodecError> {
    if name.is_empty() {
        return Err(CodecError::MissingFileName(command));
    }
    Ok(name.to_string())
}

/// Splits `<keyword>|<name>|<reason...>`; the reason keeps embedded separators.
fn name_and_reason(command: &'static str, fields: &[&str]) -> Result<(String, String), CodecError> {
    if fields.len() < 2 {
        return Err(CodecError::FieldCount {
            command,
            expected: "at least 2",
            actual: fields.len(),
        });
    }
    let file_name = required_name(command, fields[1])?;
    let sep = SEPARATOR.to_string();
    let reason = fields[2..].join(sep.as_str());
    Ok((file_name, reason))
}

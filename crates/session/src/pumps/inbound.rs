//! Inbound reader: owns the read half, dispatches peer commands and
//! receives files.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader};
use tracing::{debug, info, warn};

use peerlink_protocol::constants::{
    REASON_INVALID_FILE_NAME, REASON_MALFORMED_SENDFILE, REASON_TRANSFER_IN_PROGRESS,
    UNKNOWN_FILE_NAME,
};
use peerlink_protocol::{CodecError, Command};
use peerlink_transfer::{Direction, receive_file, sanitize_file_name};

use crate::error::SessionError;
use crate::events::SessionEvent;
use crate::gate::Decision;
use crate::session::{DisconnectReason, Shared};
use crate::state::SessionState;

/// The last file stored from the peer, until it confirms or disowns it.
struct Received {
    file_name: String,
    path: PathBuf,
}

/// Reads until the peer leaves, the stream breaks or the session is
/// cancelled (`Ok(None)`). Cancels the session on the way out.
pub(crate) async fn run<R, W>(
    mut reader: BufReader<R>,
    shared: Arc<Shared<W>>,
) -> Result<Option<DisconnectReason>, SessionError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let result = read_loop(&mut reader, &shared).await;
    shared.gate.close();
    shared.cancel.cancel();
    result
}

async fn read_loop<R, W>(
    reader: &mut BufReader<R>,
    shared: &Shared<W>,
) -> Result<Option<DisconnectReason>, SessionError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = String::new();
    let mut last_received: Option<Received> = None;

    loop {
        line.clear();
        let read = tokio::select! {
            biased;
            _ = shared.cancel.cancelled() => return Ok(None),
            read = reader.read_line(&mut line) => read,
        };

        match read {
            Ok(0) => {
                debug!(peer = %shared.peer, "peer closed the stream");
                return Ok(Some(DisconnectReason::StreamClosed));
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                warn!(peer = %shared.peer, "skipping non UTF-8 line");
                continue;
            }
            Err(e) => return Err(SessionError::Io(e)),
        }

        let cmd = match Command::decode(&line) {
            Ok(cmd) => cmd,
            Err(CodecError::Empty) => continue,
            Err(CodecError::MalformedSendFile { file_name, reason }) => {
                let name = file_name.unwrap_or_else(|| UNKNOWN_FILE_NAME.to_string());
                warn!(file = %name, %reason, "malformed SENDFILE");
                shared.emit(SessionEvent::Notice(format!(
                    "peer sent a malformed file offer ({reason})"
                )));
                shared
                    .write_command(&Command::transfer_error(name, REASON_MALFORMED_SENDFILE))
                    .await?;
                continue;
            }
            Err(e) => {
                warn!(error = %e, line = %line.trim_end(), "ignoring unparsable command");
                continue;
            }
        };

        debug!(command = cmd.keyword(), file = ?cmd.file_name(), "received command");
        shared.emit(SessionEvent::PeerCommand(cmd.clone()));

        match cmd {
            Command::SendFile {
                file_name,
                file_size,
            } => {
                if let Some(received) = handle_offer(reader, shared, file_name, file_size).await? {
                    last_received = Some(received);
                }
            }
            Command::FileAccept { file_name } => {
                if !shared.gate.resolve_for(&file_name, Decision::Accept) {
                    debug!(file = %file_name, "FILEACCEPT without a matching offer");
                }
            }
            Command::FileReject { file_name, reason } => {
                if !shared.gate.resolve_for(&file_name, Decision::Reject(reason)) {
                    debug!(file = %file_name, "FILEREJECT without a matching offer");
                }
            }
            Command::TransferError { file_name, reason } => {
                if shared
                    .gate
                    .resolve_for(&file_name, Decision::Reject(reason.clone()))
                {
                    continue;
                }
                match last_received.take() {
                    Some(received) if received.file_name == file_name => {
                        discard_received(shared, received).await;
                    }
                    other => {
                        last_received = other;
                        info!(file = %file_name, %reason, "peer reported a transfer error");
                    }
                }
            }
            Command::TransferComplete { file_name } => {
                if last_received
                    .as_ref()
                    .is_some_and(|r| r.file_name == file_name)
                {
                    last_received = None;
                }
            }
            Command::Disconnect => {
                info!(peer = %shared.peer, "peer requested disconnect");
                return Ok(Some(DisconnectReason::PeerDisconnected));
            }
        }
    }
}

/// Answers a `SENDFILE` and, when accepted, receives the payload.
///
/// Only connection faults are returned as errors; a failed local write has
/// already drained the payload and leaves the session usable.
async fn handle_offer<R, W>(
    reader: &mut BufReader<R>,
    shared: &Shared<W>,
    file_name: String,
    file_size: u64,
) -> Result<Option<Received>, SessionError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let Some(guard) = shared.state.try_claim(SessionState::Receiving) else {
        info!(file = %file_name, "rejecting offer, transfer in progress");
        shared
            .write_command(&Command::file_reject(file_name, REASON_TRANSFER_IN_PROGRESS))
            .await?;
        return Ok(None);
    };

    let safe_name = match sanitize_file_name(&file_name) {
        Ok(name) => name,
        Err(e) => {
            warn!(file = %file_name, error = %e, "rejecting offer");
            shared
                .write_command(&Command::file_reject(file_name, REASON_INVALID_FILE_NAME))
                .await?;
            return Ok(None);
        }
    };
    let dest = shared.config.download_dir.join(&safe_name);

    shared
        .write_command(&Command::file_accept(file_name.as_str()))
        .await?;
    info!(file = %file_name, size = file_size, path = %dest.display(), "receiving file");
    shared.emit(SessionEvent::Receiving {
        file_name: file_name.clone(),
        file_size,
        path: dest.clone(),
    });

    let events = shared.event_sender();
    let receive = receive_file(reader, &dest, file_size, &shared.config.transfer, |p| {
        let _ = events.send(SessionEvent::Progress(p));
    });
    let result = tokio::select! {
        biased;
        _ = shared.cancel.cancelled() => None,
        result = receive => Some(result),
    };
    drop(guard);

    let Some(result) = result else {
        abandon_receive(shared, file_name, &dest).await;
        return Ok(None);
    };

    match result {
        Ok(bytes) => {
            shared.emit(SessionEvent::TransferFinished {
                file_name: file_name.clone(),
                direction: Direction::Receive,
                bytes,
                path: dest.clone(),
            });
            Ok(Some(Received {
                file_name,
                path: dest,
            }))
        }
        Err(e) => {
            warn!(file = %file_name, error = %e, "receive failed");
            shared.emit(SessionEvent::TransferFailed {
                file_name,
                direction: Direction::Receive,
                error: e.to_string(),
            });
            if e.is_connection_fault() {
                return Err(e.into());
            }
            Ok(None)
        }
    }
}

/// The session closed mid-payload: the file can never be completed.
async fn abandon_receive<W>(shared: &Shared<W>, file_name: String, dest: &Path)
where
    W: AsyncWrite + Unpin,
{
    match tokio::fs::remove_file(dest).await {
        Ok(()) => info!(file = %file_name, "removed partial file after shutdown"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %dest.display(), error = %e, "failed to remove partial file"),
    }
    shared.emit(SessionEvent::TransferFailed {
        file_name,
        direction: Direction::Receive,
        error: "session closed during transfer".to_string(),
    });
}

async fn discard_received<W>(shared: &Shared<W>, received: Received)
where
    W: AsyncWrite + Unpin,
{
    match tokio::fs::remove_file(&received.path).await {
        Ok(()) => {
            info!(file = %received.file_name, "discarded file reported broken by sender");
            shared.emit(SessionEvent::ReceivedFileDiscarded {
                file_name: received.file_name,
                path: received.path,
            });
        }
        Err(e) => warn!(
            path = %received.path.display(),
            error = %e,
            "failed to discard broken file"
        ),
    }
}

//! Local command loop and the outgoing send flow.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use peerlink_protocol::constants::{REASON_ACCEPTANCE_TIMEOUT, REASON_SEND_FAILED};
use peerlink_protocol::{Command, wire_file_name};
use peerlink_transfer::{Direction, send_file};

use crate::error::SessionError;
use crate::events::SessionEvent;
use crate::gate::GateOutcome;
use crate::local::{LocalCommand, USAGE};
use crate::session::{DisconnectReason, Shared, write_line};
use crate::state::{SessionState, TransferGuard};

/// Reacts to local input until the user leaves or the caller interrupts
/// (`Ok(Some(_))`), or the session is cancelled from the other side
/// (`Ok(None)`).
pub(crate) async fn run<I, W>(
    input: I,
    shared: &Arc<Shared<W>>,
) -> Result<Option<DisconnectReason>, SessionError>
where
    I: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let mut lines = input.lines();
    let mut sender: Option<JoinHandle<()>> = None;

    let outcome = loop {
        let line = tokio::select! {
            biased;
            _ = shared.cancel.cancelled() => break Ok(None),
            _ = shared.shutdown.cancelled() => break Ok(Some(interrupt(shared, &mut sender).await)),
            line = lines.next_line() => line,
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break finish_input(shared, &mut sender).await,
            Err(e) => {
                warn!(error = %e, "local input failed");
                break finish_input(shared, &mut sender).await;
            }
        };

        match LocalCommand::parse(&line) {
            LocalCommand::Send(path) => {
                if let Some(handle) = start_send(shared, path).await {
                    sender = Some(handle);
                }
            }
            LocalCommand::Exit => {
                let state = shared.state.get();
                if state.is_busy() {
                    shared.emit(SessionEvent::Notice(format!(
                        "cannot disconnect while a transfer is active ({state})"
                    )));
                    continue;
                }
                leave(shared).await;
                break Ok(Some(DisconnectReason::LocalExit));
            }
            LocalCommand::Status => shared.emit(SessionEvent::Status {
                state: shared.state.get(),
                peer: shared.peer.clone(),
            }),
            LocalCommand::Help => shared.emit(SessionEvent::Notice(USAGE.to_string())),
            LocalCommand::Empty => {}
            LocalCommand::Unknown(text) => shared.emit(SessionEvent::Notice(format!(
                "unknown command {text:?}; {USAGE}"
            ))),
        }
    };

    if let Some(handle) = sender {
        if !handle.is_finished() {
            debug!("aborting unfinished send");
            handle.abort();
        }
    }
    outcome
}

/// Local input ended: let an active transfer finish, then leave.
async fn finish_input<W>(
    shared: &Shared<W>,
    sender: &mut Option<JoinHandle<()>>,
) -> Result<Option<DisconnectReason>, SessionError>
where
    W: AsyncWrite + Unpin,
{
    debug!("local input closed");
    let mut state = shared.state.subscribe();
    tokio::select! {
        biased;
        _ = shared.cancel.cancelled() => return Ok(None),
        _ = shared.shutdown.cancelled() => return Ok(Some(interrupt(shared, sender).await)),
        _ = async { state.wait_for(|s| !s.is_busy()).await.is_ok() } => {}
    }
    leave(shared).await;
    Ok(Some(DisconnectReason::InputClosed))
}

/// The caller asked to stop: drop any outgoing transfer and leave.
///
/// Mid-payload the announcement is skipped since it would land inside the
/// file bytes; the peer sees the connection close instead.
async fn interrupt<W>(
    shared: &Shared<W>,
    sender: &mut Option<JoinHandle<()>>,
) -> DisconnectReason
where
    W: AsyncWrite + Unpin,
{
    let state = shared.state.get();
    info!(%state, "session interrupted");
    if let Some(handle) = sender.take() {
        handle.abort();
        let _ = handle.await;
    }
    if state == SessionState::Sending {
        shared.cancel.cancel();
    } else {
        leave(shared).await;
    }
    DisconnectReason::Interrupted
}

async fn leave<W>(shared: &Shared<W>)
where
    W: AsyncWrite + Unpin,
{
    if let Err(e) = shared.write_command(&Command::Disconnect).await {
        debug!(error = %e, "could not announce disconnect");
    }
    shared.cancel.cancel();
}

/// Validates a local `send` and spawns the offer/payload flow.
async fn start_send<W>(shared: &Arc<Shared<W>>, path: PathBuf) -> Option<JoinHandle<()>>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let metadata = match tokio::fs::metadata(&path).await {
        Ok(m) if m.is_file() => m,
        Ok(_) => {
            shared.emit(SessionEvent::Notice(format!(
                "{} is not a regular file",
                path.display()
            )));
            return None;
        }
        Err(e) => {
            shared.emit(SessionEvent::Notice(format!(
                "cannot send {}: {e}",
                path.display()
            )));
            return None;
        }
    };

    let file_name = path
        .file_name()
        .map(|n| wire_file_name(&n.to_string_lossy()))
        .unwrap_or_default();
    if file_name.is_empty() {
        shared.emit(SessionEvent::Notice(format!(
            "cannot derive a file name from {}",
            path.display()
        )));
        return None;
    }

    let Some(guard) = shared.state.try_claim(SessionState::AwaitingAcceptance) else {
        shared.emit(SessionEvent::Notice(
            "a transfer is already in progress".to_string(),
        ));
        return None;
    };

    Some(tokio::spawn(send_flow(
        Arc::clone(shared),
        guard,
        path,
        file_name,
        metadata.len(),
    )))
}

async fn send_flow<W>(
    shared: Arc<Shared<W>>,
    guard: TransferGuard,
    path: PathBuf,
    file_name: String,
    file_size: u64,
) where
    W: AsyncWrite + Unpin,
{
    let result = offer_and_send(&shared, &guard, &path, &file_name, file_size).await;
    drop(guard);

    match result {
        Ok(event) => shared.emit(event),
        Err(e) => {
            warn!(file = %file_name, error = %e, "send broke the connection");
            shared.emit(SessionEvent::TransferFailed {
                file_name,
                direction: Direction::Send,
                error: e.to_string(),
            });
            shared.cancel.cancel();
        }
    }
}

/// Runs one offer to completion. Returns the closing event to publish once
/// the transfer slot is released.
async fn offer_and_send<W>(
    shared: &Shared<W>,
    guard: &TransferGuard,
    path: &Path,
    file_name: &str,
    file_size: u64,
) -> Result<SessionEvent, SessionError>
where
    W: AsyncWrite + Unpin,
{
    // Open before writing so an immediate answer cannot be missed.
    let waiter = shared.gate.open(file_name);
    if let Err(e) = shared
        .write_command(&Command::send_file(file_name, file_size))
        .await
    {
        shared.gate.close();
        return Err(e.into());
    }
    info!(file = %file_name, size = file_size, "offer sent, awaiting acceptance");
    shared.emit(SessionEvent::AwaitingAcceptance {
        file_name: file_name.to_string(),
        file_size,
    });

    let outcome = tokio::select! {
        biased;
        _ = shared.cancel.cancelled() => GateOutcome::StreamClosed,
        outcome = waiter.wait(shared.config.acceptance_timeout) => outcome,
    };

    match outcome {
        GateOutcome::Accepted => {}
        GateOutcome::Rejected { reason } => {
            info!(file = %file_name, %reason, "offer rejected");
            return Ok(SessionEvent::SendRejected {
                file_name: file_name.to_string(),
                reason,
            });
        }
        GateOutcome::TimedOut => {
            shared.gate.close();
            warn!(file = %file_name, "no answer to offer");
            shared
                .write_command(&Command::transfer_error(
                    file_name,
                    REASON_ACCEPTANCE_TIMEOUT,
                ))
                .await?;
            return Ok(SessionEvent::AcceptanceTimedOut {
                file_name: file_name.to_string(),
            });
        }
        GateOutcome::StreamClosed => {
            return Ok(SessionEvent::SendRejected {
                file_name: file_name.to_string(),
                reason: "connection closed".to_string(),
            });
        }
    }

    guard.advance(SessionState::Sending);
    shared.emit(SessionEvent::SendAccepted {
        file_name: file_name.to_string(),
    });

    let events = shared.event_sender();
    let mut writer = shared.writer.lock().await;
    let result = send_file(
        &mut *writer,
        path,
        file_size,
        &shared.config.transfer,
        |p| {
            let _ = events.send(SessionEvent::Progress(p));
        },
    )
    .await;

    match result {
        Ok(bytes) => {
            write_line(&mut *writer, &Command::transfer_complete(file_name)).await?;
            Ok(SessionEvent::TransferFinished {
                file_name: file_name.to_string(),
                direction: Direction::Send,
                bytes,
                path: path.to_path_buf(),
            })
        }
        Err(e) if e.is_connection_fault() => Err(e.into()),
        Err(e) => {
            warn!(file = %file_name, error = %e, "send failed");
            let reason = format!("{REASON_SEND_FAILED}: {e}");
            write_line(&mut *writer, &Command::transfer_error(file_name, reason)).await?;
            Ok(SessionEvent::TransferFailed {
                file_name: file_name.to_string(),
                direction: Direction::Send,
                error: e.to_string(),
            })
        }
    }
}

//! Session lifecycle: spawn the inbound reader, run the local loop, tear down.

use std::fmt;
use std::io;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use peerlink_protocol::Command;

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::events::SessionEvent;
use crate::gate::AcceptanceGate;
use crate::pumps::{inbound, outbound};
use crate::state::StateCell;

/// Why a session ended without a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The local user typed `exit` or `!disconnect`.
    LocalExit,
    /// Local input reached end of file.
    InputClosed,
    /// The peer sent `!disconnect`.
    PeerDisconnected,
    /// The peer closed the connection.
    StreamClosed,
    /// The caller's shutdown token fired.
    Interrupted,
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::LocalExit => "disconnected by local user",
            Self::InputClosed => "local input closed",
            Self::PeerDisconnected => "peer disconnected",
            Self::StreamClosed => "connection closed by peer",
            Self::Interrupted => "interrupted",
        };
        f.write_str(s)
    }
}

/// State shared by the inbound reader, the local loop and send tasks.
pub(crate) struct Shared<W> {
    pub(crate) peer: String,
    pub(crate) config: SessionConfig,
    /// Write half. Held for a whole payload so commands never interleave.
    pub(crate) writer: Mutex<W>,
    pub(crate) state: Arc<StateCell>,
    pub(crate) gate: AcceptanceGate,
    events: mpsc::UnboundedSender<SessionEvent>,
    /// Ends the session from inside: either loop finishing.
    pub(crate) cancel: CancellationToken,
    /// Ends the session from outside, owned by the caller.
    pub(crate) shutdown: CancellationToken,
}

impl<W> Shared<W>
where
    W: AsyncWrite + Unpin,
{
    pub(crate) async fn write_command(&self, cmd: &Command) -> io::Result<()> {
        let mut writer = self.writer.lock().await;
        write_line(&mut *writer, cmd).await
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    pub(crate) fn event_sender(&self) -> mpsc::UnboundedSender<SessionEvent> {
        self.events.clone()
    }
}

pub(crate) async fn write_line<W>(writer: &mut W, cmd: &Command) -> io::Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    trace!(command = cmd.keyword(), "sending command");
    writer.write_all(cmd.encode().as_bytes()).await?;
    writer.flush().await
}

/// Runs a session over an established connection until either side leaves.
///
/// `input` supplies local command lines. Cancelling `shutdown` tears the
/// session down as a local leave would: an active receive is abandoned and
/// its partial file removed. Returns how the session ended, or the fault
/// that broke it.
pub async fn run_session<R, W, I>(
    reader: R,
    writer: W,
    peer: impl Into<String>,
    input: I,
    config: SessionConfig,
    events: mpsc::UnboundedSender<SessionEvent>,
    shutdown: CancellationToken,
) -> Result<DisconnectReason, SessionError>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
    I: AsyncBufRead + Unpin,
{
    let buffer = config.transfer.chunk_size.max(1024);
    let shared = Arc::new(Shared {
        peer: peer.into(),
        config,
        writer: Mutex::new(writer),
        state: StateCell::new(),
        gate: AcceptanceGate::new(),
        events,
        cancel: CancellationToken::new(),
        shutdown,
    });
    info!(peer = %shared.peer, "session started");

    let mut reader_task = tokio::spawn(inbound::run(
        BufReader::with_capacity(buffer, reader),
        Arc::clone(&shared),
    ));

    let local = outbound::run(input, &shared).await;
    shared.cancel.cancel();

    let remote = match tokio::time::timeout(shared.config.shutdown_grace, &mut reader_task).await {
        Ok(Ok(result)) => Some(result),
        Ok(Err(e)) => Some(Err(SessionError::Reader(e.to_string()))),
        Err(_) => {
            warn!("inbound reader did not stop in time, aborting");
            reader_task.abort();
            None
        }
    };

    shared.gate.close();
    shared.state.close();

    let result = match local {
        Err(e) => Err(e),
        Ok(Some(reason)) => Ok(reason),
        Ok(None) => match remote {
            Some(Ok(Some(reason))) => Ok(reason),
            Some(Err(e)) => Err(e),
            Some(Ok(None)) | None => Ok(DisconnectReason::StreamClosed),
        },
    };

    if let Err(e) = shared.writer.lock().await.shutdown().await {
        debug!(error = %e, "shutdown of write half failed");
    }

    match &result {
        Ok(reason) => info!(peer = %shared.peer, %reason, "session ended"),
        Err(e) => warn!(peer = %shared.peer, error = %e, "session ended with error"),
    }
    result
}

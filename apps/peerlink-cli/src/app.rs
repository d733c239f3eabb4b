//! Wires bootstrap, session and console together.

use anyhow::Context;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use peerlink_connection::{Connection, PeerListener, dial};
use peerlink_session::run_session;

use crate::config::Config;
use crate::console;

/// Which side of the connection this process plays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Listen,
    Connect { host: String },
}

/// Establishes the connection and runs one session on it.
pub async fn run(mode: Mode, config: Config) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupted");
            interrupt.cancel();
        }
    });

    let connection = tokio::select! {
        conn = connect(&mode, &config, cancel.clone()) => conn?,
        _ = cancel.cancelled() => return Ok(()),
    };
    let Connection { stream, peer } = connection;
    console::banner(&peer);

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let renderer = tokio::spawn(console::render(events_rx));

    let (reader, writer) = stream.into_split();
    let input = BufReader::new(tokio::io::stdin());
    let outcome = run_session(
        reader,
        writer,
        peer,
        input,
        config.session_config(),
        events_tx,
        cancel,
    )
    .await;
    // Event senders go away with the session; the renderer drains and stops.
    let _ = renderer.await;

    let reason = outcome.context("session failed")?;
    println!("{reason}");
    Ok(())
}

async fn connect(
    mode: &Mode,
    config: &Config,
    cancel: CancellationToken,
) -> anyhow::Result<Connection> {
    match mode {
        Mode::Listen => {
            let listener = PeerListener::bind(&config.listen_ip, config.port)
                .await
                .context("cannot start listening")?;
            let addr = listener.local_addr()?;
            println!("waiting for a peer on {addr}");
            listener
                .accept_one(cancel)
                .await
                .context("no peer connected")
        }
        Mode::Connect { host } => {
            println!("connecting to {host}:{}", config.port);
            dial(host, config.port, config.connect_timeout(), cancel)
                .await
                .with_context(|| format!("cannot connect to {host}:{}", config.port))
        }
    }
}

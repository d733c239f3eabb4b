//! Dialing side: connect to the listening peer.

use std::io;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{BootstrapError, Connection};

/// Connects to `host:port`, giving up after `connect_timeout`.
///
/// `host` may be an IP literal or a resolvable name.
pub async fn dial(
    host: &str,
    port: u16,
    connect_timeout: Duration,
    cancel: CancellationToken,
) -> Result<Connection, BootstrapError> {
    let host = host.trim();
    if host.is_empty() {
        return Err(BootstrapError::InvalidAddress(host.to_string()));
    }
    let target = format!("{host}:{port}");
    let stream = bounded_connect(
        &target,
        TcpStream::connect((host, port)),
        connect_timeout,
        &cancel,
    )
    .await?;

    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or(target);
    info!(%peer, "connected to peer");

    Ok(Connection { stream, peer })
}

/// Races a pending connect against `connect_timeout` and `cancel`.
async fn bounded_connect<F>(
    target: &str,
    connect: F,
    connect_timeout: Duration,
    cancel: &CancellationToken,
) -> Result<TcpStream, BootstrapError>
where
    F: Future<Output = io::Result<TcpStream>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(BootstrapError::Cancelled),
        result = tokio::time::timeout(connect_timeout, connect) => match result {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(source)) => Err(BootstrapError::Connect {
                addr: target.to_string(),
                source,
            }),
            Err(_) => Err(BootstrapError::Timeout(target.to_string())),
        },
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;
    use crate::listener::PeerListener;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn dial_and_listen_over_loopback() {
        let listener = PeerListener::bind("127.0.0.1", 0).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let accept = tokio::spawn(listener.accept_one(CancellationToken::new()));

        let mut client = dial("127.0.0.1", port, TIMEOUT, CancellationToken::new())
            .await
            .unwrap();
        let mut server = accept.await.unwrap().unwrap();

        assert_eq!(client.peer, format!("127.0.0.1:{port}"));

        client.stream.write_all(b"ping").await.unwrap();
        let mut buf = [0u8; 4];
        server.stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");
    }

    #[tokio::test]
    async fn refused_is_connect_error() {
        let port = {
            let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap().port()
        };

        let result = dial("127.0.0.1", port, TIMEOUT, CancellationToken::new()).await;
        assert!(matches!(result, Err(BootstrapError::Connect { .. })));
    }

    #[tokio::test]
    async fn empty_host_is_invalid() {
        let result = dial("  ", 1, TIMEOUT, CancellationToken::new()).await;
        assert!(matches!(result, Err(BootstrapError::InvalidAddress(_))));
    }

    #[tokio::test]
    async fn cancelled_dial() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = dial("127.0.0.1", 1, TIMEOUT, cancel).await;
        assert!(matches!(result, Err(BootstrapError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_connect_times_out() {
        let stalled = std::future::pending::<io::Result<TcpStream>>();
        let started = tokio::time::Instant::now();

        let result = bounded_connect(
            "10.255.255.1:32897",
            stalled,
            Duration::from_secs(15),
            &CancellationToken::new(),
        )
        .await;

        match result {
            Err(BootstrapError::Timeout(addr)) => assert_eq!(addr, "10.255.255.1:32897"),
            other => panic!("expected timeout, got {other:?}"),
        }
        assert!(started.elapsed() >= Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_wins_over_stalled_connect() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let result = bounded_connect(
            "10.255.255.1:1",
            std::future::pending::<io::Result<TcpStream>>(),
            Duration::from_secs(15),
            &cancel,
        )
        .await;
        assert!(matches!(result, Err(BootstrapError::Cancelled)));
    }
}

//! Listening side: bind, accept one peer, stop listening.

use std::net::{IpAddr, SocketAddr};

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{BootstrapError, Connection};

/// A bound listener that will accept a single peer.
pub struct PeerListener {
    inner: TcpListener,
}

impl PeerListener {
    /// Binds `bind_ip:port`. Port `0` picks an ephemeral port.
    pub async fn bind(bind_ip: &str, port: u16) -> Result<Self, BootstrapError> {
        let ip: IpAddr = bind_ip
            .trim()
            .parse()
            .map_err(|_| BootstrapError::InvalidAddress(bind_ip.to_string()))?;
        let addr = SocketAddr::new(ip, port);

        let inner = TcpListener::bind(addr)
            .await
            .map_err(|source| BootstrapError::Bind {
                addr: addr.to_string(),
                source,
            })?;

        info!(%addr, "listening for peer");
        Ok(Self { inner })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    /// Waits for the first peer. The listener is dropped afterwards.
    pub async fn accept_one(self, cancel: CancellationToken) -> Result<Connection, BootstrapError> {
        let (stream, addr) = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(BootstrapError::Cancelled),
            result = self.inner.accept() => result.map_err(BootstrapError::Accept)?,
        };

        // Only one peer per session.
        drop(self.inner);

        info!(peer = %addr, "peer connected");
        Ok(Connection {
            stream,
            peer: addr.to_string(),
        })
    }
}

/// Binds `bind_ip:port` and accepts exactly one connection.
pub async fn listen(
    bind_ip: &str,
    port: u16,
    cancel: CancellationToken,
) -> Result<Connection, BootstrapError> {
    PeerListener::bind(bind_ip, port)
        .await?
        .accept_one(cancel)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_malformed_bind_ip() {
        let result = listen("not-an-ip", 0, CancellationToken::new()).await;
        assert!(matches!(result, Err(BootstrapError::InvalidAddress(_))));
    }

    #[tokio::test]
    async fn port_conflict_is_bind_error() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();

        let result = PeerListener::bind("127.0.0.1", port).await;
        assert!(matches!(result, Err(BootstrapError::Bind { .. })));
    }

    #[tokio::test]
    async fn cancelled_before_peer_arrives() {
        let listener = PeerListener::bind("127.0.0.1", 0).await.unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = listener.accept_one(cancel).await;
        assert!(matches!(result, Err(BootstrapError::Cancelled)));
    }

    #[tokio::test]
    async fn listener_is_closed_after_first_peer() {
        let listener = PeerListener::bind("127.0.0.1", 0).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let accept = tokio::spawn(listener.accept_one(CancellationToken::new()));
        let _first = tokio::net::TcpStream::connect(addr).await.unwrap();
        let conn = accept.await.unwrap().unwrap();
        assert!(conn.peer.starts_with("127.0.0.1:"));

        let second = tokio::net::TcpStream::connect(addr).await;
        assert!(second.is_err());
    }
}

//! Connection bootstrap for a peerlink session.
//!
//! One side [`listen`]s and accepts exactly one peer, the other [`dial`]s.
//! Both produce a [`Connection`] that the session then owns.

mod dialer;
mod error;
mod listener;

pub use dialer::dial;
pub use error::BootstrapError;
pub use listener::{PeerListener, listen};

use tokio::net::TcpStream;

/// An open TCP stream to the single remote peer.
#[derive(Debug)]
pub struct Connection {
    pub stream: TcpStream,
    /// Remote address as `ip:port`.
    pub peer: String,
}

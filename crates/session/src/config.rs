//! Session tuning.

use std::path::PathBuf;
use std::time::Duration;

use peerlink_protocol::constants::{ACCEPTANCE_TIMEOUT, SHUTDOWN_GRACE};
use peerlink_transfer::TransferOptions;

/// Settings for one peer session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Where incoming files are stored. Must exist.
    pub download_dir: PathBuf,
    pub transfer: TransferOptions,
    /// How long a sender waits for `FILEACCEPT`/`FILEREJECT`.
    pub acceptance_timeout: Duration,
    /// How long the inbound reader may take to stop at shutdown.
    pub shutdown_grace: Duration,
}

impl SessionConfig {
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            download_dir: download_dir.into(),
            transfer: TransferOptions::default(),
            acceptance_timeout: ACCEPTANCE_TIMEOUT,
            shutdown_grace: SHUTDOWN_GRACE,
        }
    }
}

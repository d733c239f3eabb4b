//! peerlink configuration.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/peerlink/peerlink.toml`
//! - Windows: `%APPDATA%/peerlink/peerlink.toml`
//!
//! A missing file means defaults; nothing is written back.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use peerlink_protocol::constants::{
    ACCEPTANCE_TIMEOUT, CONNECT_TIMEOUT, DEFAULT_CHUNK_SIZE, DEFAULT_LISTEN_IP, DEFAULT_PORT,
    PROGRESS_INTERVAL, SHUTDOWN_GRACE,
};
use peerlink_session::SessionConfig;
use peerlink_transfer::TransferOptions;

/// Directory for received files, relative to the working directory.
const DEFAULT_DOWNLOAD_DIR: &str = "P2P_Downloads";

/// peerlink configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Address the listening role binds to.
    #[serde(default = "default_listen_ip")]
    pub listen_ip: String,

    /// TCP port for both roles.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Where received files are written.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Payload chunk size in bytes.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_acceptance_timeout_secs")]
    pub acceptance_timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Minimum spacing of progress updates.
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,

    /// Time the session reader gets to stop after disconnect.
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

fn default_listen_ip() -> String {
    DEFAULT_LISTEN_IP.into()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_download_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DOWNLOAD_DIR)
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_acceptance_timeout_secs() -> u64 {
    ACCEPTANCE_TIMEOUT.as_secs()
}

fn default_connect_timeout_secs() -> u64 {
    CONNECT_TIMEOUT.as_secs()
}

fn default_progress_interval_ms() -> u64 {
    millis(PROGRESS_INTERVAL)
}

fn default_shutdown_grace_ms() -> u64 {
    millis(SHUTDOWN_GRACE)
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_ip: default_listen_ip(),
            port: default_port(),
            download_dir: default_download_dir(),
            chunk_size: default_chunk_size(),
            acceptance_timeout_secs: default_acceptance_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            progress_interval_ms: default_progress_interval_ms(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

impl Config {
    /// Loads `explicit` if given (it must exist), otherwise the default
    /// location, falling back to defaults when that file is absent.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let path = config_path();
        if path.exists() {
            Self::from_file(&path)
        } else {
            tracing::debug!(path = %path.display(), "no configuration file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            download_dir: self.download_dir.clone(),
            transfer: TransferOptions {
                chunk_size: self.chunk_size,
                progress_interval: Duration::from_millis(self.progress_interval_ms),
            },
            acceptance_timeout: Duration::from_secs(self.acceptance_timeout_secs),
            shutdown_grace: Duration::from_millis(self.shutdown_grace_ms),
        }
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("peerlink").join("peerlink.toml")
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".config")
            .join("peerlink")
            .join("peerlink.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.listen_ip, "0.0.0.0");
        assert_eq!(config.port, 32897);
        assert_eq!(config.download_dir, PathBuf::from("P2P_Downloads"));
        assert_eq!(config.chunk_size, 8192);
        assert_eq!(config.acceptance_timeout_secs, 30);
        assert_eq!(config.connect_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn defaults_follow_protocol_constants() {
        let session = Config::default().session_config();
        assert_eq!(Config::default().connect_timeout(), CONNECT_TIMEOUT);
        assert_eq!(session.acceptance_timeout, ACCEPTANCE_TIMEOUT);
        assert_eq!(session.transfer.progress_interval, PROGRESS_INTERVAL);
        assert_eq!(session.shutdown_grace, SHUTDOWN_GRACE);
    }

    #[test]
    fn config_partial_toml() {
        let config: Config = toml::from_str("port = 4000").unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config, Config { port: 4000, ..Config::default() });
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = Config {
            listen_ip: "192.168.1.10".into(),
            port: 9000,
            shutdown_grace_ms: 10,
            ..Config::default()
        };
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(toml::from_str::<Config>(&text).unwrap(), config);
    }

    #[test]
    fn config_rejects_bad_types() {
        assert!(toml::from_str::<Config>("port = \"many\"").is_err());
        assert!(toml::from_str::<Config>("port = 70000").is_err());
    }

    #[test]
    fn session_config_mapping() {
        let config = Config {
            download_dir: PathBuf::from("/srv/in"),
            chunk_size: 4096,
            acceptance_timeout_secs: 5,
            progress_interval_ms: 250,
            shutdown_grace_ms: 50,
            ..Config::default()
        };

        let session = config.session_config();
        assert_eq!(session.download_dir, PathBuf::from("/srv/in"));
        assert_eq!(session.transfer.chunk_size, 4096);
        assert_eq!(session.transfer.progress_interval, Duration::from_millis(250));
        assert_eq!(session.acceptance_timeout, Duration::from_secs(5));
        assert_eq!(session.shutdown_grace, Duration::from_millis(50));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&tmp.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn load_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("peerlink.toml");
        std::fs::write(&path, "download_dir = \"/data/in\"\nchunk_size = 65536\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.download_dir, PathBuf::from("/data/in"));
        assert_eq!(config.chunk_size, 65536);
        assert_eq!(config.port, 32897);
    }

    #[test]
    fn config_path_not_empty() {
        assert!(config_path().to_string_lossy().contains("peerlink"));
    }
}

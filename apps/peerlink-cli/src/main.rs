//! peerlink entry point.

mod app;
mod config;
mod console;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::app::Mode;
use crate::config::Config;

#[derive(Debug, Parser)]
#[command(
    name = "peerlink",
    version,
    about = "Send files directly to another machine over one TCP connection"
)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Wait for one peer to connect.
    Listen {
        /// Local address to bind (default from config, 0.0.0.0).
        #[arg(short, long)]
        bind: Option<String>,

        #[command(flatten)]
        common: CommonArgs,
    },
    /// Connect to a listening peer.
    Connect {
        /// Host name or IP of the listening peer.
        host: String,

        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Debug, Args)]
struct CommonArgs {
    /// TCP port (default from config, 32897).
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory for received files.
    #[arg(short, long)]
    download_dir: Option<PathBuf>,

    /// Configuration file to use instead of the default location.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Cli {
    /// Loads the config file and applies command-line overrides.
    fn resolve(self) -> anyhow::Result<(Mode, Config)> {
        let (mode, bind, common) = match self.command {
            Command::Listen { bind, common } => (Mode::Listen, bind, common),
            Command::Connect { host, common } => (Mode::Connect { host }, None, common),
        };

        let mut config = Config::load(common.config.as_deref())?;
        if let Some(bind) = bind {
            config.listen_ip = bind;
        }
        if let Some(port) = common.port {
            config.port = port;
        }
        if let Some(dir) = common.download_dir {
            config.download_dir = dir;
        }
        Ok((mode, config))
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting peerlink");

    let (mode, config) = cli.resolve()?;
    std::fs::create_dir_all(&config.download_dir).with_context(|| {
        format!(
            "cannot create download directory {}",
            config.download_dir.display()
        )
    })?;
    tracing::debug!(?config, "configuration resolved");

    let rt = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    let result = rt.block_on(app::run(mode, config));

    // The stdin reader thread may still be parked in a blocking read.
    rt.shutdown_timeout(Duration::from_millis(100));
    result
}

//! Terminal rendering of session events.

use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use peerlink_protocol::Command;
use peerlink_session::{SessionEvent, USAGE};
use peerlink_transfer::{Direction, TransferProgress};

/// Renders events to stdout until the session drops its sender.
pub async fn render(mut events: mpsc::UnboundedReceiver<SessionEvent>) {
    let mut console = Console::default();
    while let Some(event) = events.recv().await {
        console.handle(event);
    }
    console.clear_bar();
}

#[derive(Default)]
struct Console {
    bar: Option<ProgressBar>,
}

impl Console {
    fn handle(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::PeerCommand(cmd) => self.peer_command(cmd),
            SessionEvent::AwaitingAcceptance {
                file_name,
                file_size,
            } => self.say(format!(
                "offered {file_name} ({file_size} bytes), waiting for the peer to accept"
            )),
            SessionEvent::SendAccepted { file_name } => {
                self.say(format!("peer accepted {file_name}, sending"));
            }
            SessionEvent::SendRejected { file_name, reason } => {
                self.say(format!("peer rejected {file_name}: {reason}"));
            }
            SessionEvent::AcceptanceTimedOut { file_name } => {
                self.say(format!("no answer from peer for {file_name}, offer withdrawn"));
            }
            SessionEvent::Receiving {
                file_name, path, ..
            } => self.say(format!(
                "receiving {file_name} into {}",
                path.display()
            )),
            SessionEvent::Progress(progress) => self.progress(&progress),
            SessionEvent::TransferFinished {
                file_name,
                direction,
                bytes,
                path,
            } => {
                self.clear_bar();
                match direction {
                    Direction::Send => self.say(format!("sent {file_name} ({bytes} bytes)")),
                    Direction::Receive => self.say(format!(
                        "received {file_name} ({bytes} bytes), saved to {}",
                        path.display()
                    )),
                }
            }
            SessionEvent::TransferFailed {
                file_name,
                direction,
                error,
            } => {
                self.clear_bar();
                self.say(format!("{direction} of {file_name} failed: {error}"));
            }
            SessionEvent::ReceivedFileDiscarded { file_name, path } => self.say(format!(
                "peer reported {file_name} broken, deleted {}",
                path.display()
            )),
            SessionEvent::Status { state, peer } => {
                self.say(format!("connected to {peer}, {state}"));
            }
            SessionEvent::Notice(text) => self.say(text),
        }
    }

    fn peer_command(&mut self, cmd: Command) {
        match cmd {
            Command::SendFile {
                file_name,
                file_size,
            } => self.say(format!("peer offers {file_name} ({file_size} bytes)")),
            Command::TransferComplete { file_name } => {
                self.say(format!("peer finished sending {file_name}"));
            }
            Command::TransferError { file_name, reason } => {
                self.say(format!("peer reported an error for {file_name}: {reason}"));
            }
            Command::Disconnect => self.say("peer disconnected".to_string()),
            // Shown through the outcome of our own offer.
            Command::FileAccept { .. } | Command::FileReject { .. } => {}
        }
    }

    fn progress(&mut self, progress: &TransferProgress) {
        let bar = self.bar.get_or_insert_with(|| new_bar(progress.total));
        bar.set_position(progress.bytes_done);
        bar.set_message(bar_label(progress));
        if progress.bytes_done >= progress.total {
            self.clear_bar();
        }
    }

    fn say(&self, line: String) {
        match &self.bar {
            Some(bar) => bar.suspend(|| println!("{line}")),
            None => println!("{line}"),
        }
    }

    fn clear_bar(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

fn new_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );
    bar
}

/// Direction, name and the engine's measured rate.
fn bar_label(progress: &TransferProgress) -> String {
    let rate = HumanBytes(progress.bytes_per_second as u64);
    format!("{} {} {rate}/s", progress.direction, progress.file_name)
}

/// Printed once the session is up.
pub fn banner(peer: &str) {
    println!("connected to {peer}");
    println!("{USAGE}");
}

//! Commands typed by the local user.

use std::path::PathBuf;

use peerlink_protocol::constants::CMD_DISCONNECT;

pub const USAGE: &str = "commands: send <path>, status, help, exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LocalCommand {
    Send(PathBuf),
    Exit,
    Status,
    Help,
    Empty,
    Unknown(String),
}

impl LocalCommand {
    pub(crate) fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        if word.eq_ignore_ascii_case("send") {
            let path = rest.trim_matches(|c| c == '"' || c == '\'').trim();
            if path.is_empty() {
                return Self::Unknown(line.to_string());
            }
            return Self::Send(PathBuf::from(path));
        }

        if !rest.is_empty() {
            return Self::Unknown(line.to_string());
        }
        if word.eq_ignore_ascii_case("exit") || word.eq_ignore_ascii_case(CMD_DISCONNECT) {
            return Self::Exit;
        }
        if word.eq_ignore_ascii_case("status") {
            return Self::Status;
        }
        if word.eq_ignore_ascii_case("help") {
            return Self::Help;
        }
        Self::Unknown(line.to_string())
    }
}

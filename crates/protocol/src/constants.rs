use std::time::Duration;

/// Field delimiter on the wire. Never appears inside an encoded field.
pub const SEPARATOR: char = '|';

/// Keyword of a file offer: `SENDFILE|<name>|<size>`.
pub const CMD_SENDFILE: &str = "SENDFILE";

/// Keyword of an accepted offer: `FILEACCEPT|<name>`.
pub const CMD_FILEACCEPT: &str = "FILEACCEPT";

/// Keyword of a refused offer: `FILEREJECT|<name>|<reason>`.
pub const CMD_FILEREJECT: &str = "FILEREJECT";

/// Keyword sent by the sender after the last payload byte.
pub const CMD_TRANSFERCOMPLETE: &str = "TRANSFERCOMPLETE";

/// Keyword of a failed offer or transfer: `TRANSFERERROR|<name>|<reason>`.
pub const CMD_TRANSFERERROR: &str = "TRANSFERERROR";

/// Session teardown request. Also accepted as a local console command.
pub const CMD_DISCONNECT: &str = "!disconnect";

/// Placeholder file name used when a malformed request carries none.
pub const UNKNOWN_FILE_NAME: &str = "unknown";

/// Reason attached to `FILEREJECT` while another transfer is active.
pub const REASON_TRANSFER_IN_PROGRESS: &str = "transfer in progress";

/// Reason attached to `TRANSFERERROR` when the receiver never answered.
pub const REASON_ACCEPTANCE_TIMEOUT: &str = "Acceptance timeout";

/// Reason attached to `TRANSFERERROR` for an unparsable `SENDFILE`.
pub const REASON_MALFORMED_SENDFILE: &str = "malformed SENDFILE";

/// Default TCP port used by both roles.
pub const DEFAULT_PORT: u16 = 32897;

/// Default bind address for the listening role (all interfaces).
pub const DEFAULT_LISTEN_IP: &str = "0.0.0.0";

/// Size of one payload chunk read from disk or the connection.
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// How long a sender waits for `FILEACCEPT`/`FILEREJECT`.
pub const ACCEPTANCE_TIMEOUT: Duration = Duration::from_secs(30);

/// How long a dialer waits for the TCP handshake.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Minimum spacing between two progress reports.
pub const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// Time the inbound reader gets to notice cancellation at shutdown.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Reason attached to `FILEREJECT` when a name reduces to nothing usable.
pub const REASON_INVALID_FILE_NAME: &str = "invalid file name";

/// Prefix of the `TRANSFERERROR` reason written after a failed send.
pub const REASON_SEND_FAILED: &str = "send failed";

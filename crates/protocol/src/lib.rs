//! Wire protocol for peerlink sessions.
//!
//! One command per line, fields separated by `|`:
//!
//! ```text
//! SENDFILE|<fileName>|<fileSizeBytes>
//! FILEACCEPT|<fileName>
//! FILEREJECT|<fileName>|<reason>
//! TRANSFERCOMPLETE|<fileName>
//! TRANSFERERROR|<fileName>|<reason...>
//! !disconnect
//! ```
//!
//! After a `FILEACCEPT` the sender writes exactly `fileSizeBytes` raw bytes
//! on the same stream before command traffic resumes.

pub mod command;
pub mod constants;
pub mod error;

pub use command::{Command, wire_file_name};
pub use error::CodecError;

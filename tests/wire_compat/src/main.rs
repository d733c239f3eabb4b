fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use peerlink_protocol::{CodecError, Command};

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture file, skipping blank lines and `#` comments.
    fn load_lines(name: &str) -> Vec<String> {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        data.lines()
            .filter(|l| !l.trim().is_empty() && !l.starts_with('#'))
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn fixture_commands_decode() {
        let expected = [
            Command::send_file("report.zip", 1_048_576),
            Command::send_file("empty.txt", 0),
            Command::send_file("huge.iso", u64::MAX),
            Command::file_accept("report.zip"),
            Command::file_reject("report.zip", "transfer in progress"),
            Command::file_reject("report.zip", ""),
            Command::transfer_complete("report.zip"),
            Command::transfer_error("report.zip", "Acceptance timeout"),
            Command::transfer_error("report.zip", "send failed: disk error|code 5"),
            Command::Disconnect,
        ];

        let lines = load_lines("commands.txt");
        assert_eq!(lines.len(), expected.len(), "fixture and table out of sync");

        for (line, want) in lines.iter().zip(expected.iter()) {
            let got = Command::decode(line)
                .unwrap_or_else(|e| panic!("failed to decode {line:?}: {e}"));
            assert_eq!(&got, want, "decode mismatch for {line:?}");
        }
    }

    #[test]
    fn fixture_commands_reencode_verbatim() {
        for line in load_lines("commands.txt") {
            let cmd = Command::decode(&line).unwrap();
            let encoded = cmd.encode();
            // An absent reject reason comes back as an empty trailing field.
            let want = if line == "FILEREJECT|report.zip" {
                "FILEREJECT|report.zip|\n".to_string()
            } else {
                format!("{line}\n")
            };
            assert_eq!(encoded, want, "re-encode mismatch for {line:?}");
        }
    }

    #[test]
    fn fixture_rejected_lines_fail() {
        for line in load_lines("rejected.txt") {
            let err = Command::decode(&line)
                .err()
                .unwrap_or_else(|| panic!("{line:?} should not decode"));
            if line.starts_with("SENDFILE") {
                assert!(
                    matches!(err, CodecError::MalformedSendFile { .. }),
                    "{line:?} gave {err:?}"
                );
            }
        }
    }

    #[test]
    fn rejected_sendfile_keeps_name_for_reply() {
        for line in load_lines("rejected.txt")
            .iter()
            .filter(|l| l.starts_with("SENDFILE"))
        {
            match Command::decode(line) {
                Err(CodecError::MalformedSendFile { file_name, .. }) => {
                    assert_eq!(file_name.as_deref(), Some("a.bin"), "{line:?}");
                }
                other => panic!("{line:?} gave {other:?}"),
            }
        }
    }

    #[test]
    fn windows_line_endings_and_padding_are_tolerated() {
        let cmd = Command::decode("  sendfile | x.bin | 3 \r\n").unwrap();
        assert_eq!(cmd, Command::send_file("x.bin", 3));
        assert_eq!(
            Command::decode("FileAccept|x.bin\r\n").unwrap(),
            Command::file_accept("x.bin")
        );
    }
}

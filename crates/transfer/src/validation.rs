use std::path::{Component, Path};

use crate::TransferError;

/// Reduces a file name received from the wire to a bare base name.
///
/// Both `/` and `\` count as separators regardless of platform, so a peer
/// cannot steer the write outside the download directory. The result must
/// be a single normal path component.
pub fn sanitize_file_name(raw: &str) -> Result<String, TransferError> {
    let base = raw
        .trim()
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .trim();

    if base.is_empty() || base.contains('\0') {
        return Err(TransferError::InvalidFileName(raw.to_string()));
    }

    let mut components = Path::new(base).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(base.to_string()),
        _ => Err(TransferError::InvalidFileName(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_simple_name() {
        assert_eq!(sanitize_file_name("report.zip").unwrap(), "report.zip");
    }

    #[test]
    fn strips_unix_directories() {
        assert_eq!(sanitize_file_name("/etc/passwd").unwrap(), "passwd");
        assert_eq!(sanitize_file_name("../../secret.txt").unwrap(), "secret.txt");
    }

    #[test]
    fn strips_windows_directories() {
        assert_eq!(
            sanitize_file_name("C:\\Users\\me\\notes.txt").unwrap(),
            "notes.txt"
        );
        assert_eq!(sanitize_file_name("..\\..\\boot.ini").unwrap(), "boot.ini");
    }

    #[test]
    fn rejects_empty() {
        assert!(sanitize_file_name("").is_err());
        assert!(sanitize_file_name("   ").is_err());
        assert!(sanitize_file_name("dir/").is_err());
    }

    #[test]
    fn rejects_dot_components() {
        assert!(sanitize_file_name("..").is_err());
        assert!(sanitize_file_name("a/..").is_err());
        assert!(sanitize_file_name(".").is_err());
    }

    #[test]
    fn rejects_nul() {
        assert!(sanitize_file_name("a\0b").is_err());
    }

    #[test]
    fn accepts_dotfile() {
        assert_eq!(sanitize_file_name(".bashrc").unwrap(), ".bashrc");
    }
}

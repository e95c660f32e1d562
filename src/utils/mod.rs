//! Utility functions and helpers.

pub mod http;

use std::path::{Path, PathBuf};

/// Character substituted for anything that cannot appear in a filename.
const REPLACEMENT: char = '-';

/// Fallback name for titles that sanitize to nothing.
const UNTITLED: &str = "untitled";

fn is_illegal(c: char) -> bool {
    matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') || c.is_control()
}

/// Turn an item title into a filesystem-safe save key.
///
/// Surrounding whitespace (including tabs and newlines) is trimmed, then
/// path separators and other characters rejected by common filesystems are
/// replaced with `-`. The result never contains a separator, is never empty,
/// and `sanitize(sanitize(x)) == sanitize(x)`.
pub fn sanitize(title: &str) -> String {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return UNTITLED.to_string();
    }

    trimmed
        .chars()
        .map(|c| if is_illegal(c) { REPLACEMENT } else { c })
        .collect()
}

/// File name for a save key, e.g. `Nomadland.jpg`.
pub fn artifact_file_name(key: &str, extension: &str) -> String {
    format!("{key}.{extension}")
}

/// Full destination path for a save key.
pub fn artifact_path(destination_dir: &Path, key: &str, extension: &str) -> PathBuf {
    destination_dir.join(artifact_file_name(key, extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_separators() {
        assert_eq!(sanitize("AC/DC: Live"), "AC-DC- Live");
        assert_eq!(sanitize(r"C:\temp"), "C--temp");
        assert_eq!(sanitize("Who?<Me>|"), "Who--Me--");
    }

    #[test]
    fn test_sanitize_keeps_unicode() {
        assert_eq!(sanitize("千与千寻"), "千与千寻");
    }

    #[test]
    fn test_sanitize_empty_title() {
        assert_eq!(sanitize(""), "untitled");
        assert_eq!(sanitize("   "), "untitled");
        assert_eq!(sanitize("\t\n"), "untitled");
        assert_eq!(sanitize("\r\n\u{3000}"), "untitled");
    }

    #[test]
    fn test_sanitize_trims_before_replacing() {
        assert_eq!(sanitize("\tNomadland\n"), "Nomadland");
        assert_eq!(sanitize(" /Heat/ "), "-Heat-");
        assert_eq!(sanitize("line\nbreak"), "line-break");
        assert_eq!(sanitize("\0"), "-");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let titles = [
            "",
            "plain",
            "a/b/c",
            "../../etc/passwd",
            " padded / title ",
            "tab\tinside",
            "\t\n",
            "\n edge /\t",
            "\u{0}",
            "mixed\\/:*?\"<>|",
            "让子弹飞 / Let the Bullets Fly",
        ];
        for title in titles {
            let once = sanitize(title);
            assert_eq!(sanitize(&once), once, "not idempotent for {title:?}");
            assert!(!once.contains('/') && !once.contains('\\'));
        }
    }

    #[test]
    fn test_traversal_stays_inside_destination() {
        let dest = Path::new("covers");
        let path = artifact_path(dest, &sanitize("../../etc/passwd"), "jpg");
        assert_eq!(path.parent(), Some(dest));
    }

    #[test]
    fn test_artifact_path() {
        let path = artifact_path(Path::new("out"), "A", "jpg");
        assert_eq!(path, PathBuf::from("out/A.jpg"));
    }
}

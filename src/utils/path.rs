//! Path utilities for clip output names

use std::path::{Path, PathBuf};

/// Characters that are invalid in a file name on at least one supported platform
const INVALID_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Reserved device names on Windows
const RESERVED_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Replace every character that cannot appear in a file name (and spaces) with `_`
pub fn safe_file_name(name: &str) -> String {
    let mut safe: String = name
        .chars()
        .map(|c| {
            if INVALID_CHARS.contains(&c) || c.is_control() || c.is_whitespace() {
                '_'
            } else {
                c
            }
        })
        .collect();

    let stem = safe.split('.').next().unwrap_or_default().to_uppercase();
    if RESERVED_NAMES.contains(&stem.as_str()) {
        safe.insert(0, '_');
    }
    safe
}

/// Join a sanitized file name onto a base directory
pub fn library_path(base: &Path, name: &str) -> PathBuf {
    base.join(safe_file_name(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_file_name_replaces_invalid_characters() {
        assert_eq!(safe_file_name("a b"), "a_b");
        assert_eq!(safe_file_name("what?*.mp4"), "what__.mp4");
        assert_eq!(safe_file_name("..\\evil/path"), ".._evil_path");
        assert_eq!(safe_file_name("tab\there"), "tab_here");
    }

    #[test]
    fn test_safe_file_name_escapes_reserved_names() {
        assert_eq!(safe_file_name("CON.mp4"), "_CON.mp4");
        assert_eq!(safe_file_name("console.mp4"), "console.mp4");
    }

    #[test]
    fn test_library_path() {
        let path = library_path(Path::new("/out"), "my clip.mp4");
        assert_eq!(path, PathBuf::from("/out/my_clip.mp4"));
    }
}

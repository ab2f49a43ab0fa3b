//! Filesystem safety used by the directory driver: confines processing to
//! files actually inside the target directory, and sanitizes any filename
//! this crate derives (e.g. on `--rename`).
//!
//! Grounded in `_is_within_directory` from the original `utils.py` /
//! `removemetadata.py`, which resolves the candidate path and checks it is
//! still a descendant of the base directory — the same guard against
//! symlink or `..` escapes, expressed with `std::path::Path::canonicalize`.

use std::path::{Path, PathBuf};

use regex::Regex;

const MAX_FILENAME_LEN: usize = 128;

/// `true` if `path`, once resolved (symlinks followed, `..` collapsed),
/// is still inside `base_dir`'s resolved form.
pub fn is_within_directory(path: &Path, base_dir: &Path) -> bool {
    let (Ok(resolved_base), Ok(resolved_path)) = (base_dir.canonicalize(), path.canonicalize()) else {
        return false;
    };
    resolved_path.starts_with(resolved_base)
}

/// `true` if any component of `path` is itself a symlink (not just the
/// final component) — `fs::symlink_metadata` only inspects the last one,
/// so a symlinked parent directory would otherwise slip through.
pub fn is_or_contains_symlink(path: &Path) -> bool {
    let mut probe = PathBuf::new();
    for component in path.components() {
        probe.push(component);
        if let Ok(metadata) = std::fs::symlink_metadata(&probe) {
            if metadata.file_type().is_symlink() {
                return true;
            }
        }
    }
    false
}

/// Non-recursive directory listing of `.mp3` files, mirroring
/// `metaaudio.py`'s `os.listdir` loop: entries are skipped (not errored)
/// if they're symlinks or directories.
pub fn list_mp3_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        let is_symlink = entry
            .file_type()
            .map(|file_type| file_type.is_symlink())
            .unwrap_or(true);
        if is_symlink {
            continue;
        }

        if !path.is_file() {
            continue;
        }

        let has_mp3_extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("mp3"))
            .unwrap_or(false);

        if has_mp3_extension {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Recursive `.mp3` listing for [`crate::tags::strip_metadata_in_directory`],
/// mirroring `removemetadata.py`'s `os.walk`. Symlinked directories are not
/// descended into; symlinked files are omitted, same as [`list_mp3_files`].
pub fn walk_mp3_files_recursive(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending_dirs = vec![dir.to_path_buf()];

    while let Some(current_dir) = pending_dirs.pop() {
        for entry in std::fs::read_dir(&current_dir)? {
            let entry = entry?;
            let path = entry.path();

            let is_symlink = entry
                .file_type()
                .map(|file_type| file_type.is_symlink())
                .unwrap_or(true);
            if is_symlink {
                continue;
            }

            if path.is_dir() {
                pending_dirs.push(path);
                continue;
            }

            let has_mp3_extension = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("mp3"))
                .unwrap_or(false);

            if has_mp3_extension {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Replace characters unsafe in a filename (`\/:*?"<>|` and C0 controls)
/// with `-`, strip leading dots, and cap the total length (including
/// extension) at 128 bytes.
pub fn sanitize_filename(name: &str) -> String {
    let unsafe_chars = Regex::new(r#"[\\/:*?"<>|\x00-\x1F]"#).expect("static pattern is valid");
    let replaced = unsafe_chars.replace_all(name, "-");
    let without_leading_dots = replaced.trim_start_matches('.');

    if without_leading_dots.len() <= MAX_FILENAME_LEN {
        without_leading_dots.to_string()
    } else {
        // Truncate on a char boundary so multi-byte UTF-8 isn't split.
        let mut cut = MAX_FILENAME_LEN;
        while !without_leading_dots.is_char_boundary(cut) {
            cut -= 1;
        }
        without_leading_dots[..cut].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_a_path_outside_the_base_directory() {
        let base = std::env::temp_dir().join("songrec-fsguard-base");
        let outside = std::env::temp_dir().join("songrec-fsguard-outside");
        std::fs::create_dir_all(&base).unwrap();
        std::fs::create_dir_all(&outside).unwrap();

        assert!(!is_within_directory(&outside, &base));
        assert!(is_within_directory(&base, &base));

        let _ = std::fs::remove_dir_all(&base);
        let _ = std::fs::remove_dir_all(&outside);
    }

    #[test]
    fn detects_a_symlinked_file() {
        let dir = std::env::temp_dir().join("songrec-fsguard-symlink-test");
        std::fs::create_dir_all(&dir).unwrap();
        let target = dir.join("real.mp3");
        std::fs::write(&target, b"data").unwrap();
        let link = dir.join("link.mp3");

        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(&target, &link).unwrap();
            assert!(is_or_contains_symlink(&link));
            assert!(!is_or_contains_symlink(&target));
        }

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn list_mp3_files_is_case_insensitive_and_skips_other_extensions() {
        let dir = std::env::temp_dir().join("songrec-fsguard-listing-test");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("a.MP3"), b"x").unwrap();
        std::fs::write(dir.join("b.mp3"), b"x").unwrap();
        std::fs::write(dir.join("c.wav"), b"x").unwrap();

        let files = list_mp3_files(&dir).unwrap();
        assert_eq!(files.len(), 2);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn sanitize_filename_replaces_unsafe_characters_and_strips_leading_dots() {
        assert_eq!(sanitize_filename("..AC/DC: Back? In \"Black\""), "AC-DC- Back- In -Black-");
    }

    #[test]
    fn walk_mp3_files_recursive_descends_into_subdirectories() {
        let dir = std::env::temp_dir().join("songrec-fsguard-recursive-test");
        let sub_dir = dir.join("sub");
        std::fs::create_dir_all(&sub_dir).unwrap();
        std::fs::write(dir.join("top.mp3"), b"x").unwrap();
        std::fs::write(sub_dir.join("nested.mp3"), b"x").unwrap();
        std::fs::write(sub_dir.join("nested.txt"), b"x").unwrap();

        let files = walk_mp3_files_recursive(&dir).unwrap();
        assert_eq!(files.len(), 2);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn sanitize_filename_caps_total_length() {
        let long_name: String = std::iter::repeat('a').take(200).collect();
        assert_eq!(sanitize_filename(&long_name).len(), MAX_FILENAME_LEN);
    }
}

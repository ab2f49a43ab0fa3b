//! ID3 tag writeback, mirroring `setmp3metadata` from the original
//! `metaaudio.py`: overwrite the title/artist/album/genre/publisher/year
//! frames and embed cover art, replacing any prior instance of each frame
//! rather than appending duplicates.

use std::fmt;
use std::path::{Path, PathBuf};

use id3::frame::{Picture, PictureType};
use id3::{Tag, TagLike, Version};

use crate::fsguard;
use crate::metadata::RecognitionMetadata;

#[derive(Debug)]
pub enum TagError {
    ReadFailed(String),
    WriteFailed(String),
    CoverArtReadFailed(String),
}

impl fmt::Display for TagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagError::ReadFailed(detail) => write!(f, "failed to read existing ID3 tag: {}", detail),
            TagError::WriteFailed(detail) => write!(f, "failed to write ID3 tag: {}", detail),
            TagError::CoverArtReadFailed(detail) => write!(f, "failed to read cover art for embedding: {}", detail),
        }
    }
}

impl std::error::Error for TagError {}

/// Write `metadata` into `path`'s ID3 tag, replacing TIT2/TPE1/TALB/TCON/
/// TPUB/TYER/TDRC/APIC. `cover_art_path`, if given, is read and embedded as
/// a front-cover `image/jpeg` APIC frame. Fields absent from `metadata` are
/// left untouched in the tag rather than cleared.
pub fn write_recognition_tags(
    path: &Path,
    metadata: &RecognitionMetadata,
    cover_art_path: Option<&Path>,
) -> Result<(), TagError> {
    let mut tag = Tag::read_from_path(path).unwrap_or_else(|_| Tag::new());

    if let Some(title) = &metadata.title {
        tag.remove_title();
        tag.set_title(title);
    }
    if let Some(artist) = &metadata.artist {
        tag.remove_artist();
        tag.set_artist(artist);
    }
    if let Some(album) = &metadata.album {
        tag.remove_album();
        tag.set_album(album);
    }
    if let Some(genre) = &metadata.genre {
        tag.remove_genre();
        tag.set_genre(genre);
    }
    if let Some(label) = &metadata.label {
        tag.remove("TPUB");
        tag.set_text("TPUB", label);
    }
    if let Some(year_text) = &metadata.year {
        tag.remove("TYER");
        tag.set_text("TYER", year_text);

        if let Ok(year) = year_text.parse::<i32>() {
            tag.remove_date_recorded();
            tag.set_date_recorded(id3::Timestamp {
                year,
                month: None,
                day: None,
                hour: None,
                minute: None,
                second: None,
            });
        }
    }

    if let Some(cover_art_path) = cover_art_path {
        let picture_data = std::fs::read(cover_art_path).map_err(|e| TagError::CoverArtReadFailed(e.to_string()))?;
        tag.remove_picture_by_type(PictureType::CoverFront);
        tag.add_frame(Picture {
            mime_type: "image/jpeg".to_string(),
            picture_type: PictureType::CoverFront,
            description: "Cover".to_string(),
            data: picture_data,
        });
    }

    tag.write_to_path(path, Version::Id3v24).map_err(|e| TagError::WriteFailed(e.to_string()))?;
    Ok(())
}

/// `true` if the file at `path` already has a usable artist tag (anything
/// but empty or the literal string `"Unknown"`, case-insensitively) — the
/// driver uses this to skip files it has already tagged on a prior run.
pub fn has_known_artist_tag(path: &Path) -> bool {
    let Ok(tag) = Tag::read_from_path(path) else {
        return false;
    };
    match tag.artist() {
        Some(artist) => !artist.trim().is_empty() && !artist.eq_ignore_ascii_case("unknown"),
        None => false,
    }
}

/// Outcome of stripping one file's metadata, mirroring the per-file cases
/// `removemetadata.py`'s `remove_metadata`/`process_directory` print.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StripOutcome {
    Removed,
    NoTagPresent,
    SkippedSymlink,
    SkippedOutsideDirectory,
    Failed(String),
}

/// Recursively strip ID3 tags from every `.mp3` file under `dir`,
/// mirroring `removemetadata.py`'s `process_directory`: symlinked files
/// and paths resolving outside `dir` are skipped rather than erroring the
/// whole run, using the same guard the driver applies to recognition.
pub fn strip_metadata_in_directory(dir: &Path) -> std::io::Result<Vec<(PathBuf, StripOutcome)>> {
    let files = fsguard::walk_mp3_files_recursive(dir)?;
    Ok(files
        .into_iter()
        .map(|path| {
            let outcome = strip_metadata_file(&path, dir);
            (path, outcome)
        })
        .collect())
}

fn strip_metadata_file(path: &Path, base_dir: &Path) -> StripOutcome {
    if fsguard::is_or_contains_symlink(path) {
        return StripOutcome::SkippedSymlink;
    }
    if !fsguard::is_within_directory(path, base_dir) {
        return StripOutcome::SkippedOutsideDirectory;
    }

    let had_tag = Tag::read_from_path(path).is_ok();
    if !had_tag {
        return StripOutcome::NoTagPresent;
    }

    match Tag::remove_from_path(path) {
        Ok(()) => StripOutcome::Removed,
        Err(e) => StripOutcome::Failed(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_metadata_reports_no_tag_present_for_an_untagged_file() {
        let dir = std::env::temp_dir().join("songrec-tags-strip-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("untagged.mp3");
        std::fs::write(&path, b"not really an mp3").unwrap();

        let outcomes = strip_metadata_in_directory(&dir).unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].1, StripOutcome::NoTagPresent);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn unknown_or_missing_artist_is_not_known() {
        let dir = std::env::temp_dir().join("songrec-tags-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("untagged.mp3");
        std::fs::write(&path, b"not really an mp3").unwrap();

        assert!(!has_known_artist_tag(&path));

        let _ = std::fs::remove_dir_all(&dir);
    }
}

//! Directory-oriented recognition driver: walk an input directory's MP3
//! files, recognize each one from a centered excerpt, and write the result
//! back as ID3 tags (with optional cover art and renaming).
//!
//! Grounded in the main loop of the original `metaaudio.py`, which opens
//! every file in a directory, decodes and downsamples it, slides a
//! fingerprinting window across it with retry/backoff around the network
//! call, and writes back tags on a match.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;

use crate::config::Config;
use crate::coverart;
use crate::decode::{self, SAMPLE_RATE_HZ};
use crate::fingerprinting::algorithm::SignatureGenerator;
use crate::fingerprinting::communication::recognize_song_from_signature_with_config;
use crate::fsguard;
use crate::metadata;
use crate::tags;

/// A track longer than this is fingerprinted from a window centered on its
/// midpoint rather than from the start, the same heuristic the original
/// driver uses to dodge cold intros and fade-outs.
const LONG_TRACK_THRESHOLD_SECONDS: f32 = 36.0;
/// Width, in seconds, of the fingerprinting window fed to the generator.
const SIGNATURE_WINDOW_SECONDS: f32 = 12.0;

/// What happened to a single file during a driver run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// A match was found and tags (and, if configured, a rename) were written.
    Recognized { title: String, artist: String, renamed_to: Option<PathBuf> },
    /// Every signature drawn from the file came back with no match.
    NoMatchFound,
    /// The file already carries a known (non-"Unknown") artist tag.
    AlreadyTagged,
    /// The file, or one of its parent components, is a symlink.
    SkippedSymlink,
    /// The file resolved outside the input directory.
    SkippedOutsideDirectory,
    /// The file could not be decoded to PCM.
    DecodeFailed(String),
    /// Fewer than 128 samples were available to fingerprint.
    InsufficientAudio,
    /// Recognition kept failing at the transport level past the retry budget.
    NetworkFailed(String),
    /// A match was found but the tag write (or cover art fetch) failed.
    TagWriteFailed(String),
}

/// Computes the driver's retry backoff: one delay per retry, in order,
/// `max(base_delay, base_delay * 2^(retry_index))` for `retry_index` in
/// `0..max_retries`, which for the documented defaults (`base = 0.5s`,
/// `max_retries = 3`) yields `[0.5s, 1.0s, 2.0s]`.
pub fn backoff_schedule(max_retries: u32, base_delay_secs: f32) -> Vec<Duration> {
    (0..max_retries)
        .map(|retry_index| {
            let doubled = base_delay_secs * 2f32.powi(retry_index as i32);
            Duration::from_secs_f32(doubled.max(base_delay_secs))
        })
        .collect()
}

/// Walks an `input_dir` of MP3 files, recognizing and tagging each.
pub struct Driver {
    config: Config,
}

impl Driver {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Process every `.mp3` file directly inside `input_dir` (not
    /// recursive), returning each file's outcome. Fails only if the
    /// directory itself can't be listed; per-file problems are reported
    /// through [`FileOutcome`] instead of short-circuiting the run.
    pub fn run(&self, input_dir: &Path) -> crate::Result<Vec<(PathBuf, FileOutcome)>> {
        let files = fsguard::list_mp3_files(input_dir)
            .map_err(|e| crate::SongRecError::InvalidInput(format!("could not list '{}': {}", input_dir.display(), e)))?;

        Ok(files
            .into_iter()
            .map(|path| {
                let outcome = self.process_file(&path, input_dir);
                (path, outcome)
            })
            .collect())
    }

    /// Recognize and tag a single file. Never returns `Err`: every failure
    /// mode is represented as a [`FileOutcome`] variant so a directory run
    /// can keep going past one bad file.
    pub fn process_file(&self, path: &Path, base_dir: &Path) -> FileOutcome {
        if fsguard::is_or_contains_symlink(path) {
            return FileOutcome::SkippedSymlink;
        }
        if !fsguard::is_within_directory(path, base_dir) {
            return FileOutcome::SkippedOutsideDirectory;
        }
        if tags::has_known_artist_tag(path) {
            return FileOutcome::AlreadyTagged;
        }

        let samples = match decode::decode_to_16khz_mono(path) {
            Ok(samples) => samples,
            Err(e) => return FileOutcome::DecodeFailed(e.to_string()),
        };

        if samples.len() < 128 {
            return FileOutcome::InsufficientAudio;
        }

        let duration_seconds = samples.len() as f32 / SAMPLE_RATE_HZ as f32;

        let mut generator = SignatureGenerator::with_max_time_seconds(SIGNATURE_WINDOW_SECONDS);
        generator.feed_input(&samples);

        if duration_seconds > LONG_TRACK_THRESHOLD_SECONDS {
            let center_offset_seconds = (duration_seconds / 2.0) - (SIGNATURE_WINDOW_SECONDS / 2.0);
            let offset_samples = (center_offset_seconds * SAMPLE_RATE_HZ as f32).max(0.0) as usize;
            generator.advance_unprocessed_samples(offset_samples);
        }

        loop {
            let signature = match generator.get_next_signature() {
                Some(signature) => signature,
                None => return FileOutcome::NoMatchFound,
            };

            let response = match self.recognize_with_retry(&signature) {
                Ok(response) => response,
                Err(detail) => return FileOutcome::NetworkFailed(detail),
            };

            let matches_empty = response
                .get("matches")
                .and_then(Value::as_array)
                .map(|matches| matches.is_empty())
                .unwrap_or(true);

            if matches_empty {
                continue;
            }

            return self.tag_and_rename(path, &response);
        }
    }

    /// Perform one recognition attempt, retrying on transport failure (the
    /// response carrying an `error` key) up to `config.max_retries` times
    /// with the backoff from [`backoff_schedule`]. A response with an empty
    /// `matches` array but no `error` is returned immediately: that is a
    /// legitimate "no match for this excerpt", not a failure to retry.
    fn recognize_with_retry(&self, signature: &crate::DecodedSignature) -> Result<Value, String> {
        let schedule = backoff_schedule(self.config.max_retries, self.config.retry_base_delay_secs);

        let mut response = recognize_song_from_signature_with_config(signature, &self.config).map_err(|e| e.to_string())?;

        for delay in schedule {
            if response.get("error").is_none() {
                return Ok(response);
            }
            std::thread::sleep(delay);
            response = recognize_song_from_signature_with_config(signature, &self.config).map_err(|e| e.to_string())?;
        }

        if let Some(error) = response.get("error").and_then(Value::as_str) {
            return Err(error.to_string());
        }

        Ok(response)
    }

    fn tag_and_rename(&self, path: &Path, response: &Value) -> FileOutcome {
        let recognized = metadata::extract_metadata(response);

        let cover_art_file = recognized
            .cover_art_url
            .as_deref()
            .and_then(|url| coverart::fetch_cover_art(url).ok());

        if let Err(e) = tags::write_recognition_tags(path, &recognized, cover_art_file.as_ref().map(|f| f.path())) {
            return FileOutcome::TagWriteFailed(e.to_string());
        }

        let title = recognized.title.clone().unwrap_or_else(|| "Unknown".to_string());
        let artist = recognized.artist.clone().unwrap_or_else(|| "Unknown".to_string());

        let renamed_to = if self.config.rename {
            self.rename_recognized_file(path, &artist, &title)
        } else {
            None
        };

        FileOutcome::Recognized { title, artist, renamed_to }
    }

    fn rename_recognized_file(&self, path: &Path, artist: &str, title: &str) -> Option<PathBuf> {
        let sanitized_stem = fsguard::sanitize_filename(&format!("{} - {}", artist, title));
        let destination = path.with_file_name(format!("{}.mp3", sanitized_stem));

        if destination == path {
            return None;
        }
        if destination.exists() && !self.config.overwrite {
            return None;
        }

        std::fs::rename(path, &destination).ok().map(|_| destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_schedule_matches_the_documented_default_sequence() {
        let schedule = backoff_schedule(3, 0.5);
        assert_eq!(schedule, vec![
            Duration::from_secs_f32(0.5),
            Duration::from_secs_f32(1.0),
            Duration::from_secs_f32(2.0),
        ]);
    }

    #[test]
    fn backoff_schedule_never_drops_below_the_floor() {
        let schedule = backoff_schedule(2, 0.5);
        assert!(schedule.iter().all(|d| *d >= Duration::from_secs_f32(0.5)));
    }

    #[test]
    fn backoff_schedule_length_matches_max_retries() {
        assert_eq!(backoff_schedule(5, 0.5).len(), 5);
        assert_eq!(backoff_schedule(0, 0.5).len(), 0);
    }

    #[test]
    fn skips_a_file_outside_the_base_directory() {
        let base = std::env::temp_dir().join("songrec-driver-base-test");
        let outside_dir = std::env::temp_dir().join("songrec-driver-outside-test");
        std::fs::create_dir_all(&base).unwrap();
        std::fs::create_dir_all(&outside_dir).unwrap();
        let outside_file = outside_dir.join("track.mp3");
        std::fs::write(&outside_file, b"not really audio").unwrap();

        let driver = Driver::new(Config::default());
        let outcome = driver.process_file(&outside_file, &base);
        assert_eq!(outcome, FileOutcome::SkippedOutsideDirectory);

        let _ = std::fs::remove_dir_all(&base);
        let _ = std::fs::remove_dir_all(&outside_dir);
    }

    #[test]
    fn skips_a_symlinked_file() {
        let dir = std::env::temp_dir().join("songrec-driver-symlink-test");
        std::fs::create_dir_all(&dir).unwrap();
        let target = dir.join("real.mp3");
        std::fs::write(&target, b"not really audio").unwrap();
        let link = dir.join("link.mp3");

        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(&target, &link).unwrap();
            let driver = Driver::new(Config::default());
            let outcome = driver.process_file(&link, &dir);
            assert_eq!(outcome, FileOutcome::SkippedSymlink);
        }

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn reports_decode_failure_for_a_non_audio_file() {
        let dir = std::env::temp_dir().join("songrec-driver-decode-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("garbage.mp3");
        std::fs::write(&path, b"definitely not an mp3 frame").unwrap();

        let driver = Driver::new(Config::default());
        let outcome = driver.process_file(&path, &dir);
        assert!(matches!(outcome, FileOutcome::DecodeFailed(_)));

        let _ = std::fs::remove_dir_all(&dir);
    }
}

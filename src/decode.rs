//! Audio file decoding, the one external collaborator the fingerprinting
//! core assumes away: every caller in this crate hands it a file path and
//! gets back mono 16 kHz `i16` samples, or a [`DecodeError`].

use std::fmt;
use std::io::BufReader;
use std::path::Path;

pub const SAMPLE_RATE_HZ: u32 = 16000;

#[derive(Debug)]
pub enum DecodeError {
    NotFound(String),
    OpenFailed(String),
    UnsupportedFormat(String),
    Empty(String),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::NotFound(path) => write!(f, "file not found: {}", path),
            DecodeError::OpenFailed(msg) => write!(f, "{}", msg),
            DecodeError::UnsupportedFormat(msg) => write!(f, "{}", msg),
            DecodeError::Empty(path) => write!(f, "no audio samples could be extracted from '{}'", path),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Decode a file to mono 16 kHz `i16` PCM, regardless of its original
/// channel count or sample rate.
pub fn decode_to_16khz_mono(path: &Path) -> Result<Vec<i16>, DecodeError> {
    let path_display = path.display().to_string();

    if !path.exists() {
        return Err(DecodeError::NotFound(path_display));
    }

    let file = std::fs::File::open(path)
        .map_err(|e| DecodeError::OpenFailed(format!("failed to open '{}': {}", path_display, e)))?;

    let decoder = rodio::Decoder::new(BufReader::new(file)).map_err(|e| {
        DecodeError::UnsupportedFormat(format!(
            "failed to decode '{}': {}. Note: M4A/AAC format may not be fully supported on all platforms.",
            path_display, e
        ))
    })?;

    let converted = rodio::source::UniformSourceIterator::new(decoder, 1, SAMPLE_RATE_HZ);
    let samples: Vec<i16> = converted.collect();

    if samples.is_empty() {
        return Err(DecodeError::Empty(path_display));
    }

    Ok(samples)
}

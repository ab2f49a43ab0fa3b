use crate::config::Config;
use crate::fingerprinting::algorithm::SignatureGenerator;
use crate::fingerprinting::communication::{recognize_song_from_signature_with_config, recognize_song_from_signature};
use crate::{Result, SongRecError};

/// Single-shot recognition facade: decode (or accept pre-decoded) audio,
/// fingerprint it, and post the result to Shazam's discovery endpoint.
/// For recognizing every file in a directory with retry, metadata writeback
/// and cover art, see [`crate::driver::Driver`].
pub struct SongRec {
    config: Config,
}

/// Result of a song recognition
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RecognitionResult {
    pub song_name: String,
    pub artist_name: String,
    pub album_name: Option<String>,
    pub track_key: String,
    pub release_year: Option<String>,
    pub genre: Option<String>,
    pub recognition_timestamp: chrono::DateTime<chrono::Utc>,
    pub raw_response: serde_json::Value,
}

impl SongRec {
    /// Create a new SongRec instance with the given configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Recognize a song from an audio file
    pub fn recognize_from_file(&self, file_path: &str) -> Result<RecognitionResult> {
        // Generate signature from file
        let signature = SignatureGenerator::make_signature_from_file(file_path)
            .map_err(|e| SongRecError::FingerprintingError(e.to_string()))?;

        // Recognize song from signature with config
        let response = recognize_song_from_signature_with_config(&signature, &self.config)
            .map_err(|e| SongRecError::NetworkError(e.to_string()))?;

        // Parse response into RecognitionResult
        self.parse_recognition_response(response)
    }

    /// Recognize a song from raw audio samples. `sample_rate` must be 16000;
    /// callers are responsible for resampling to mono 16 kHz beforehand.
    pub fn recognize_from_samples(&self, samples: &[i16], sample_rate: u32) -> Result<RecognitionResult> {
        if sample_rate != 16000 {
            return Err(SongRecError::InvalidInput(format!(
                "expected 16000 Hz mono samples, got {} Hz",
                sample_rate
            )));
        }

        let mut generator = SignatureGenerator::new();
        generator.feed_input(samples);

        let signature = generator
            .get_next_signature()
            .ok_or_else(|| SongRecError::InsufficientInput("fewer than 128 samples were provided".to_string()))?;

        // Recognize song from signature
        let response = recognize_song_from_signature(&signature)
            .map_err(|e| SongRecError::NetworkError(e.to_string()))?;

        // Parse response into RecognitionResult
        self.parse_recognition_response(response)
    }

    /// Parse a recognition response from the API into a RecognitionResult
    fn parse_recognition_response(&self, response: serde_json::Value) -> Result<RecognitionResult> {
        // First check if we have any matches
        let matches = response.get("matches")
            .and_then(|m| m.as_array())
            .ok_or_else(|| SongRecError::NetworkError("Invalid response format: no matches array".to_string()))?;

        if matches.is_empty() {
            return Err(SongRecError::NetworkError("No track found in response".to_string()));
        }

        // The track info is at the top level of the response, not inside the matches
        let track = response.get("track")
            .ok_or_else(|| SongRecError::NetworkError("No track found in response".to_string()))?;

        // Extract song details from the track
        let song_name = track
            .get("title")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown")
            .to_string();

        let artist_name = track
            .get("subtitle")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown")
            .to_string();

        let album_name = crate::metadata::section_metadata_text(track, "Album").map(|s| s.to_string());

        let track_key = track
            .get("key")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        let release_year = crate::metadata::section_metadata_text(track, "Released").map(|s| s.to_string());

        let genre = track
            .pointer("/genres/primary")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        Ok(RecognitionResult {
            song_name,
            artist_name,
            album_name,
            track_key,
            release_year,
            genre,
            recognition_timestamp: chrono::Utc::now(),
            raw_response: response,
        })
    }
}

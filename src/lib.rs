//! # SongRec Library
//!
//! A Rust library for audio fingerprinting and song recognition using Shazam's algorithm.
//! Recognize a single file through [`SongRec`], or point [`Driver`] at a
//! directory of MP3s to recognize, tag, and optionally rename every file in it.
//!
//! ## Features
//!
//! - Audio fingerprinting using Shazam's algorithm
//! - Song recognition via Shazam's API
//! - Directory-wide recognition with ID3 tag and cover art write-back
//! - Multiple output formats (JSON, CSV, text)
//! - Both library and CLI interfaces
//! 
//! ## Example
//! 
//! ```rust,no_run
//! use songrec::{SongRec, Config};
//! 
//! let config = Config::default();
//! let songrec = SongRec::new(config);
//! 
//! // Recognize a song from an audio file
//! match songrec.recognize_from_file("song.mp3") {
//!     Ok(result) => println!("Recognized: {}", result.song_name),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

pub mod config;
pub mod coverart;
pub mod decode;
pub mod driver;
pub mod fsguard;
pub mod metadata;
pub mod output;
pub mod tags;

// Re-export fingerprinting modules
pub mod fingerprinting {
    pub mod algorithm;
    pub mod signature_format;
    pub mod communication;
    pub mod user_agent;
    pub mod hanning;
    pub mod ring_buffer;
}

// Core API
mod songrec;
pub use songrec::{SongRec, RecognitionResult};
pub use config::Config;
pub use driver::Driver;
pub use output::{OutputFormat, RecognitionOutput};

// Re-export key types for convenience
pub use fingerprinting::signature_format::DecodedSignature;
pub use fingerprinting::algorithm::SignatureGenerator;

/// Current version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error types for the library
#[derive(Debug)]
pub enum SongRecError {
    AudioError(String),
    NetworkError(String),
    FingerprintingError(String),
    InvalidInput(String),
    ConfigError(String),
    /// Fewer than 3 seconds of audio were available to fingerprint.
    InsufficientInput(String),
    /// A path escaped `input_dir`, or was a symlink, during driver processing.
    FilesystemGuardViolation(String),
    /// Cover art could not be fetched or embedded.
    CoverArtError(String),
}

impl std::fmt::Display for SongRecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SongRecError::AudioError(msg) => write!(f, "Audio error: {}", msg),
            SongRecError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            SongRecError::FingerprintingError(msg) => write!(f, "Fingerprinting error: {}", msg),
            SongRecError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            SongRecError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            SongRecError::InsufficientInput(msg) => write!(f, "Insufficient input: {}", msg),
            SongRecError::FilesystemGuardViolation(msg) => write!(f, "Filesystem guard violation: {}", msg),
            SongRecError::CoverArtError(msg) => write!(f, "Cover art error: {}", msg),
        }
    }
}

impl std::error::Error for SongRecError {}

/// Result type for the library
pub type Result<T> = std::result::Result<T, SongRecError>;

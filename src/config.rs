use serde::{Deserialize, Serialize};

/// Configuration for SongRec
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Recognition sensitivity (0.0 to 1.0)
    pub sensitivity: f32,
    
    /// Timeout for network requests in seconds
    pub network_timeout: u64,
    
    /// Minimum duration of audio to analyze (in seconds)
    pub min_audio_duration: f32,
    
    /// Maximum duration of audio to analyze (in seconds)  
    pub max_audio_duration: f32,
    
    /// Sample rate for audio processing
    pub sample_rate: u32,
    
    /// Buffer size for audio processing
    pub buffer_size: usize,
    
    /// Whether to enable continuous recognition
    pub continuous_recognition: bool,
    
    /// Interval between recognition attempts in continuous mode (seconds)
    pub recognition_interval: f32,
    
    /// Whether to suppress verbose debug output
    pub quiet_mode: bool,
    
    /// Whether to deduplicate requests (prevent sending same signature multiple times)
    pub deduplicate_requests: bool,
    
    /// Time in seconds to remember signatures for deduplication
    pub deduplication_cache_duration: u64,

    /// Whether the driver should rename recognized files to "Artist - Title".
    pub rename: bool,

    /// Whether renaming is allowed to overwrite an existing file. Ignored
    /// (and meaningless) unless `rename` is also set.
    pub overwrite: bool,

    /// Base delay, in seconds, for the driver's retry backoff. Floored to
    /// 0.5s: a shorter delay gives Shazam's API no time to recover.
    pub retry_base_delay_secs: f32,

    /// Maximum recognition attempts per file before the driver gives up.
    pub max_retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sensitivity: 0.5,
            network_timeout: 20,
            min_audio_duration: 3.0,
            max_audio_duration: 12.0,
            sample_rate: 16000,
            buffer_size: 4096,
            continuous_recognition: false,
            recognition_interval: 5.0,
            quiet_mode: true, // Default to quiet mode for clean output
            deduplicate_requests: true,
            deduplication_cache_duration: 300, // 5 minutes
            rename: false,
            overwrite: false,
            retry_base_delay_secs: 0.5,
            max_retries: 3,
        }
    }
}

impl Config {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }
    
    /// Set the sensitivity level
    pub fn with_sensitivity(mut self, sensitivity: f32) -> Self {
        self.sensitivity = sensitivity.clamp(0.0, 1.0);
        self
    }
    
    /// Set the network timeout
    pub fn with_network_timeout(mut self, timeout: u64) -> Self {
        self.network_timeout = timeout;
        self
    }
    
    /// Set the minimum audio duration
    pub fn with_min_audio_duration(mut self, duration: f32) -> Self {
        self.min_audio_duration = duration;
        self
    }
    
    /// Set the maximum audio duration
    pub fn with_max_audio_duration(mut self, duration: f32) -> Self {
        self.max_audio_duration = duration;
        self
    }
    
    /// Set the sample rate
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }
    
    /// Set the buffer size
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }
    
    /// Enable or disable continuous recognition
    pub fn with_continuous_recognition(mut self, enabled: bool) -> Self {
        self.continuous_recognition = enabled;
        self
    }
    
    /// Set the recognition interval for continuous mode
    pub fn with_recognition_interval(mut self, interval: f32) -> Self {
        self.recognition_interval = interval;
        self
    }
    
    /// Enable or disable quiet mode (suppress verbose output)
    pub fn with_quiet_mode(mut self, quiet: bool) -> Self {
        self.quiet_mode = quiet;
        self
    }
    
    /// Enable or disable request deduplication
    pub fn with_deduplication(mut self, enabled: bool) -> Self {
        self.deduplicate_requests = enabled;
        self
    }
    
    /// Set the deduplication cache duration
    pub fn with_deduplication_cache_duration(mut self, duration: u64) -> Self {
        self.deduplication_cache_duration = duration;
        self
    }

    /// Enable or disable renaming recognized files.
    pub fn with_rename(mut self, rename: bool) -> Self {
        self.rename = rename;
        self
    }

    /// Enable or disable overwriting on rename.
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Set the driver's retry base delay, floored to 0.5s.
    pub fn with_retry_base_delay_secs(mut self, delay: f32) -> Self {
        self.retry_base_delay_secs = delay.max(0.5);
        self
    }

    /// Set the driver's maximum retry count.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
    
    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_driver_settings_match_the_documented_defaults() {
        let config = Config::default();
        assert!(!config.rename);
        assert!(!config.overwrite);
        assert_eq!(config.retry_base_delay_secs, 0.5);
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn retry_base_delay_is_floored_at_half_a_second() {
        let config = Config::new().with_retry_base_delay_secs(0.1);
        assert_eq!(config.retry_base_delay_secs, 0.5);
    }

    #[test]
    fn round_trips_through_a_toml_file() {
        let dir = std::env::temp_dir().join(format!("songrec-config-test-{:?}", std::thread::current().id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let config = Config::new().with_rename(true).with_max_retries(5);
        config.to_file(path.to_str().unwrap()).unwrap();

        let loaded = Config::from_file(path.to_str().unwrap()).unwrap();
        assert!(loaded.rename);
        assert_eq!(loaded.max_retries, 5);

        let _ = std::fs::remove_dir_all(&dir);
    }
}

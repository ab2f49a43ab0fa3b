use serde::{Deserialize, Serialize};
use crate::songrec::RecognitionResult;

/// Output format for recognition results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Simple song name format: "Artist - Song"
    Simple,
    /// Full JSON with all metadata
    Json,
    /// CSV format for logging
    Csv,
    /// Custom format with placeholders
    Custom(&'static str),
}

/// Formatted recognition output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionOutput {
    pub format: String,
    pub content: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl RecognitionOutput {
    /// Format a recognition result according to the specified format
    pub fn format_result(result: &RecognitionResult, format: OutputFormat) -> Self {
        let content = match format {
            OutputFormat::Simple => {
                format!("{} - {}", result.artist_name, result.song_name)
            },
            OutputFormat::Json => {
                serde_json::to_string(&result).unwrap_or_else(|_| "{}".to_string()) // Avoid verbose error messages
            },
            OutputFormat::Csv => Self::format_csv_row(result),
            OutputFormat::Custom(template) => {
                Self::format_custom(result, template)
            },
        };

        RecognitionOutput {
            format: format.to_string(),
            content,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Format a single CSV row, letting the `csv` crate handle quoting and
    /// escaping instead of hand-building a quoted string.
    fn format_csv_row(result: &RecognitionResult) -> String {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(vec![]);
        let timestamp = result.recognition_timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string();

        let _ = writer.write_record([
            result.song_name.as_str(),
            result.artist_name.as_str(),
            result.album_name.as_deref().unwrap_or(""),
            result.release_year.as_deref().unwrap_or(""),
            result.genre.as_deref().unwrap_or(""),
            timestamp.as_str(),
        ]);

        let bytes = writer.into_inner().unwrap_or_default();
        String::from_utf8(bytes).unwrap_or_default().trim_end().to_string()
    }

    /// Format using a custom template with placeholders
    fn format_custom(result: &RecognitionResult, template: &str) -> String {
        template
            .replace("{song}", &result.song_name)
            .replace("{artist}", &result.artist_name)
            .replace("{album}", result.album_name.as_deref().unwrap_or("Unknown"))
            .replace("{year}", result.release_year.as_deref().unwrap_or("Unknown"))
            .replace("{genre}", result.genre.as_deref().unwrap_or("Unknown"))
            .replace("{timestamp}", &result.recognition_timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string())
    }

    /// Get CSV header
    pub fn csv_header() -> &'static str {
        "\"Song\",\"Artist\",\"Album\",\"Year\",\"Genre\",\"Timestamp\""
    }
}

impl std::fmt::Display for RecognitionOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Simple => write!(f, "Simple"),
            OutputFormat::Json => write!(f, "Json"),
            OutputFormat::Csv => write!(f, "Csv"),
            OutputFormat::Custom(template) => write!(f, "Custom({})", template),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> RecognitionResult {
        RecognitionResult {
            song_name: "Track, \"Title\"".to_string(),
            artist_name: "Artist".to_string(),
            album_name: Some("Album".to_string()),
            track_key: "123".to_string(),
            release_year: Some("2024".to_string()),
            genre: Some("Pop".to_string()),
            recognition_timestamp: chrono::Utc::now(),
            raw_response: serde_json::json!({}),
        }
    }

    #[test]
    fn csv_escapes_fields_containing_commas_and_quotes() {
        let output = RecognitionOutput::format_result(&sample_result(), OutputFormat::Csv);
        assert!(output.content.starts_with("\"Track, \"\"Title\"\"\",Artist,Album,2024,Pop,"));
    }

    #[test]
    fn simple_format_is_artist_dash_song() {
        let output = RecognitionOutput::format_result(&sample_result(), OutputFormat::Simple);
        assert_eq!(output.content, "Artist - Track, \"Title\"");
    }
}

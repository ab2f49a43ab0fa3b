//! Pulls the fields the file driver writes into ID3 tags out of a Shazam
//! recognition response, mirroring `extractmetadata` from the original
//! `metaaudio.py`.

use serde_json::Value;

/// Find `sections[0].metadata[*]` entry whose `title` matches, and return
/// its `text`. Shared by the driver's metadata extraction and
/// [`crate::songrec::SongRec`]'s lighter-weight result parsing.
pub fn section_metadata_text<'a>(track: &'a Value, title: &str) -> Option<&'a str> {
    track.pointer("/sections/0/metadata").and_then(|metadata| {
        metadata.as_array()?.iter().find_map(|entry| {
            let entry_title = entry.get("title")?.as_str()?;
            if entry_title == title {
                entry.get("text")?.as_str()
            } else {
                None
            }
        })
    })
}

/// The subset of a Shazam track's metadata the driver writes back into the
/// recognized file's ID3 tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecognitionMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub label: Option<String>,
    pub cover_art_url: Option<String>,
    pub year: Option<String>,
}

/// Extract [`RecognitionMetadata`] from a raw Shazam `/discovery` response.
/// Fields with no corresponding value in the response are left `None`
/// rather than defaulted to an empty string, so the tag writer can tell
/// "absent" apart from "present but blank".
pub fn extract_metadata(response: &Value) -> RecognitionMetadata {
    let track = match response.get("track") {
        Some(track) => track,
        None => return RecognitionMetadata::default(),
    };

    RecognitionMetadata {
        title: track.get("title").and_then(Value::as_str).map(str::to_string),
        artist: track.get("subtitle").and_then(Value::as_str).map(str::to_string),
        album: section_metadata_text(track, "Album").map(str::to_string),
        genre: track.pointer("/genres/primary").and_then(Value::as_str).map(str::to_string),
        label: section_metadata_text(track, "Label").map(str::to_string),
        cover_art_url: track.pointer("/images/coverarthq").and_then(Value::as_str).map(str::to_string),
        year: section_metadata_text(track, "Released").map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_every_field_from_a_well_formed_response() {
        let response = json!({
            "track": {
                "title": "Song Title",
                "subtitle": "Artist Name",
                "genres": { "primary": "Pop" },
                "images": { "coverarthq": "https://example.com/art.jpg" },
                "sections": [{
                    "metadata": [
                        { "title": "Album", "text": "Album Name" },
                        { "title": "Label", "text": "Label Name" },
                        { "title": "Released", "text": "2024" }
                    ]
                }]
            }
        });

        let metadata = extract_metadata(&response);
        assert_eq!(metadata.title.as_deref(), Some("Song Title"));
        assert_eq!(metadata.artist.as_deref(), Some("Artist Name"));
        assert_eq!(metadata.album.as_deref(), Some("Album Name"));
        assert_eq!(metadata.genre.as_deref(), Some("Pop"));
        assert_eq!(metadata.label.as_deref(), Some("Label Name"));
        assert_eq!(metadata.cover_art_url.as_deref(), Some("https://example.com/art.jpg"));
        assert_eq!(metadata.year.as_deref(), Some("2024"));
    }

    #[test]
    fn missing_track_yields_all_none_fields() {
        let metadata = extract_metadata(&json!({ "matches": [] }));
        assert_eq!(metadata, RecognitionMetadata::default());
    }

    #[test]
    fn missing_sections_leaves_section_backed_fields_none() {
        let response = json!({ "track": { "title": "T", "subtitle": "A" } });
        let metadata = extract_metadata(&response);
        assert_eq!(metadata.title.as_deref(), Some("T"));
        assert_eq!(metadata.album, None);
        assert_eq!(metadata.year, None);
    }
}

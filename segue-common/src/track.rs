//! Track catalog model
//!
//! A `Track` is an immutable description of one playable item. Tracks are
//! produced by catalog lookups outside the player and are only ever read by
//! the playback engine.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One playable item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Stable catalog identifier
    pub id: String,

    pub title: String,

    #[serde(default, alias = "albumId")]
    pub album_id: Option<String>,

    #[serde(default, alias = "artistId")]
    pub artist_id: Option<String>,

    #[serde(default, alias = "trackNumber")]
    pub track_number: Option<u32>,

    #[serde(default, alias = "discNumber")]
    pub disc_number: Option<u32>,

    /// Nominal duration from the catalog
    ///
    /// Used for transition timing until the live session reports its own
    /// duration.
    #[serde(default, alias = "durationSeconds", alias = "duration")]
    pub duration_seconds: f64,
}

impl Track {
    /// Convenience constructor for a track without album/artist linkage
    pub fn new(id: impl Into<String>, title: impl Into<String>, duration_seconds: f64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            album_id: None,
            artist_id: None,
            track_number: None,
            disc_number: None,
            duration_seconds,
        }
    }

    pub fn with_album(mut self, album_id: impl Into<String>) -> Self {
        self.album_id = Some(album_id.into());
        self
    }

    pub fn with_artist(mut self, artist_id: impl Into<String>) -> Self {
        self.artist_id = Some(artist_id.into());
        self
    }

    pub fn with_position(mut self, disc_number: u32, track_number: u32) -> Self {
        self.disc_number = Some(disc_number);
        self.track_number = Some(track_number);
        self
    }
}

/// Parse a JSON array of tracks
pub fn parse_tracks(json: &str) -> Result<Vec<Track>> {
    let tracks: Vec<Track> = serde_json::from_str(json)?;
    if let Some(bad) = tracks.iter().find(|t| t.id.is_empty()) {
        return Err(Error::InvalidInput(format!(
            "track '{}' has an empty id",
            bad.title
        )));
    }
    Ok(tracks)
}

/// Load a JSON array of tracks from disk
pub fn load_tracks(path: &Path) -> Result<Vec<Track>> {
    if !path.exists() {
        return Err(Error::NotFound(format!("{}", path.display())));
    }
    let content = std::fs::read_to_string(path)?;
    parse_tracks(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tracks_accepts_camel_case() {
        let json = r#"[
            {"id": "t1", "title": "Intro", "albumId": "al1", "artistId": "ar1",
             "trackNumber": 1, "discNumber": 1, "durationSeconds": 30.5},
            {"id": "t2", "title": "Outro", "duration": 12}
        ]"#;

        let tracks = parse_tracks(json).unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].album_id.as_deref(), Some("al1"));
        assert_eq!(tracks[0].artist_id.as_deref(), Some("ar1"));
        assert_eq!(tracks[0].track_number, Some(1));
        assert_eq!(tracks[0].duration_seconds, 30.5);
        assert_eq!(tracks[1].duration_seconds, 12.0);
        assert!(tracks[1].album_id.is_none());
    }

    #[test]
    fn test_parse_tracks_rejects_empty_id() {
        let json = r#"[{"id": "", "title": "Nameless"}]"#;
        let err = parse_tracks(json).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_load_tracks_missing_file() {
        let err = load_tracks(Path::new("/nonexistent/segue/playlist.json")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_builders() {
        let track = Track::new("t1", "Song", 200.0)
            .with_album("al")
            .with_artist("ar")
            .with_position(2, 7);
        assert_eq!(track.disc_number, Some(2));
        assert_eq!(track.track_number, Some(7));
        assert_eq!(track.album_id.as_deref(), Some("al"));
        assert_eq!(track.artist_id.as_deref(), Some("ar"));
    }
}

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Placeholder stored when a file carries no artist or album tag
pub const UNKNOWN: &str = "unknown";

/// Metadata stored for one audio file in the repository.
///
/// On disk a record is the array `[title, album, artist, duration]`; the field
/// order is fixed here and nowhere else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredRecord", into = "StoredRecord")]
pub struct TrackRecord {
    pub title: String,
    pub album: String,
    pub artist: String,
    pub duration: f64, // seconds
}

#[derive(Serialize, Deserialize)]
struct StoredRecord(String, String, String, f64);

impl From<StoredRecord> for TrackRecord {
    fn from(StoredRecord(title, album, artist, duration): StoredRecord) -> Self {
        Self {
            title,
            album,
            artist,
            duration: duration.max(0.0),
        }
    }
}

impl From<TrackRecord> for StoredRecord {
    fn from(record: TrackRecord) -> Self {
        StoredRecord(record.title, record.album, record.artist, record.duration)
    }
}

impl TrackRecord {
    pub fn new(
        title: impl Into<String>,
        album: impl Into<String>,
        artist: impl Into<String>,
        duration: f64,
    ) -> Self {
        Self {
            title: title.into(),
            album: album.into(),
            artist: artist.into(),
            duration: duration.max(0.0),
        }
    }

    /// The record used when a file's tags can't be read: file stem as title,
    /// unknown album and artist, zero duration
    pub fn unknown(path: &Path) -> Self {
        Self::new(title_from_path(path), UNKNOWN, UNKNOWN, 0.0)
    }

    /// Duration as `m:ss`, or `h:mm:ss` for anything an hour or longer
    pub fn duration_string(&self) -> String {
        let total = self.duration.round() as u64;
        let hours = total / 3600;
        let minutes = (total % 3600) / 60;
        let seconds = total % 60;

        if hours > 0 {
            format!("{}:{:02}:{:02}", hours, minutes, seconds)
        } else {
            format!("{}:{:02}", minutes, seconds)
        }
    }
}

pub(crate) fn title_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("Unknown")
        .to_string()
}

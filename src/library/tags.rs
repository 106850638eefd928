// Tag reading - turns a file into a TrackRecord, never fails
// Anything unreadable falls back to TrackRecord::unknown

use super::track::{title_from_path, TrackRecord, UNKNOWN};
use anyhow::Result;
use id3::TagLike;
use std::path::Path;
use tracing::debug;

/// Extracts metadata for one file. Implementations must not fail: unreadable
/// files map to [`TrackRecord::unknown`].
pub trait TagReader: Send + Sync {
    fn extract(&self, path: &Path) -> TrackRecord;
}

/// Raw tag values before defaults are applied
#[derive(Debug, Default)]
struct RawTags {
    title: Option<String>,
    album: Option<String>,
    artist: Option<String>,
    duration: Option<f64>,
}

impl RawTags {
    fn into_record(self, path: &Path) -> TrackRecord {
        TrackRecord::new(
            non_empty(self.title).unwrap_or_else(|| title_from_path(path)),
            non_empty(self.album).unwrap_or_else(|| UNKNOWN.to_string()),
            non_empty(self.artist).unwrap_or_else(|| UNKNOWN.to_string()),
            self.duration.unwrap_or(0.0),
        )
    }

    #[cfg_attr(not(feature = "probe"), allow(dead_code))]
    fn merge_missing(&mut self, other: RawTags) {
        self.title = self.title.take().or(other.title);
        self.album = self.album.take().or(other.album);
        self.artist = self.artist.take().or(other.artist);
        self.duration = self.duration.take().or(other.duration);
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Reads tags straight from the file: ID3 for mp3/wav, MP4 atoms for
/// m4a/aac/alac, and symphonia probing for everything else when the `probe`
/// feature is on.
#[derive(Debug, Clone, Default)]
pub struct FileTagReader;

impl FileTagReader {
    pub fn new() -> Self {
        Self
    }

    fn read_tags(&self, path: &Path) -> Result<RawTags> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        #[allow(unused_mut)]
        let mut tags = match extension.as_str() {
            "mp3" => Self::extract_id3(path, id3::Tag::read_from_path(path)),
            "wav" => Self::extract_id3(path, id3::Tag::read_from_wav_path(path)),
            "m4a" | "aac" | "alac" => Self::extract_mp4(path)?,
            _ => RawTags::default(),
        };

        // Fill whatever the container tags missed (mostly durations)
        #[cfg(feature = "probe")]
        {
            if tags.title.is_none() || tags.duration.is_none() {
                match probe::probe_tags(path) {
                    Ok(probed) => tags.merge_missing(probed),
                    Err(e) => debug!("Probe failed for {}: {}", path.display(), e),
                }
            }
        }

        Ok(tags)
    }

    /// A missing or broken ID3 block is not fatal; probing may still fill in
    /// the gaps
    fn extract_id3(path: &Path, tag: id3::Result<id3::Tag>) -> RawTags {
        let tag = match tag {
            Ok(tag) => tag,
            Err(e) => {
                debug!("No ID3 tag in {}: {}", path.display(), e);
                return RawTags::default();
            }
        };

        RawTags {
            title: tag.title().map(|s| s.to_string()),
            album: tag.album().map(|s| s.to_string()),
            artist: tag.artist().map(|s| s.to_string()),
            // TLEN is milliseconds
            duration: tag.duration().map(|ms| ms as f64 / 1000.0),
        }
    }

    fn extract_mp4(path: &Path) -> Result<RawTags> {
        let tag = mp4ameta::Tag::read_from_path(path)?;

        Ok(RawTags {
            title: tag.title().map(|s| s.to_string()),
            album: tag.album().map(|s| s.to_string()),
            artist: tag.artist().map(|s| s.to_string()),
            duration: tag.duration().map(|d| d.as_secs_f64()),
        })
    }
}

impl TagReader for FileTagReader {
    fn extract(&self, path: &Path) -> TrackRecord {
        match self.read_tags(path) {
            Ok(tags) => tags.into_record(path),
            Err(e) => {
                debug!("No readable tags in {}: {}", path.display(), e);
                TrackRecord::unknown(path)
            }
        }
    }
}

/// Feature-gated tag and duration probing using symphonia
#[cfg(feature = "probe")]
mod probe {
    use super::RawTags;
    use anyhow::Result;
    use std::fs::File;
    use std::path::Path;
    use symphonia::core::formats::FormatOptions;
    use symphonia::core::io::MediaSourceStream;
    use symphonia::core::meta::{MetadataOptions, MetadataRevision, StandardTagKey};
    use symphonia::core::probe::Hint;

    pub(super) fn probe_tags(path: &Path) -> Result<RawTags> {
        let file = File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
            hint.with_extension(extension);
        }

        let meta_opts: MetadataOptions = Default::default();
        let fmt_opts: FormatOptions = Default::default();

        let mut probed = symphonia::default::get_probe().format(&hint, mss, &fmt_opts, &meta_opts)?;

        let mut tags = RawTags::default();

        // Container-level tags (vorbis comments, RIFF INFO) first, then any
        // metadata found while probing (leading ID3 blocks)
        if let Some(revision) = probed.format.metadata().current() {
            apply_revision(&mut tags, revision);
        }
        if let Some(metadata) = probed.metadata.get() {
            if let Some(revision) = metadata.current() {
                apply_revision(&mut tags, revision);
            }
        }

        let track = probed
            .format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL);

        if let Some(track) = track {
            if let (Some(time_base), Some(n_frames)) = (track.codec_params.time_base, track.codec_params.n_frames) {
                let time = time_base.calc_time(n_frames);
                tags.duration = Some(time.seconds as f64 + time.frac);
            }
        }

        Ok(tags)
    }

    fn apply_revision(tags: &mut RawTags, revision: &MetadataRevision) {
        for tag in revision.tags() {
            let slot = match tag.std_key {
                Some(StandardTagKey::TrackTitle) => &mut tags.title,
                Some(StandardTagKey::Album) => &mut tags.album,
                Some(StandardTagKey::Artist) => &mut tags.artist,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(tag.value.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_untagged_file_falls_back_to_unknown() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("b.wav");
        fs::write(&path, b"not really a wav").unwrap();

        let record = FileTagReader::new().extract(&path);
        assert_eq!(record, TrackRecord::new("b", UNKNOWN, UNKNOWN, 0.0));
    }

    #[test]
    fn test_untagged_mp3_still_reads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plain.mp3");
        fs::write(&path, b"no id3 header").unwrap();

        // No ID3 block is not an error, so probing gets its turn
        let tags = FileTagReader::new().read_tags(&path).unwrap();
        assert!(tags.title.is_none());
        assert!(tags.artist.is_none());
    }

    #[cfg(feature = "probe")]
    #[test]
    fn test_untagged_wav_gets_probed_duration() {
        // One second of 8 kHz mono 16-bit silence
        let rate: u32 = 8000;
        let data_len: u32 = rate * 2;
        let mut wav = Vec::new();
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&(36 + data_len).to_le_bytes());
        wav.extend_from_slice(b"WAVEfmt ");
        wav.extend_from_slice(&16u32.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes());
        wav.extend_from_slice(&rate.to_le_bytes());
        wav.extend_from_slice(&(rate * 2).to_le_bytes());
        wav.extend_from_slice(&2u16.to_le_bytes());
        wav.extend_from_slice(&16u16.to_le_bytes());
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&data_len.to_le_bytes());
        wav.resize(wav.len() + data_len as usize, 0);

        let dir = tempdir().unwrap();
        let path = dir.path().join("silence.wav");
        fs::write(&path, wav).unwrap();

        let record = FileTagReader::new().extract(&path);
        assert_eq!(record.title, "silence");
        assert!((record.duration - 1.0).abs() < 0.01, "{}", record.duration);
    }

    #[test]
    fn test_missing_file_never_fails() {
        let record = FileTagReader::new().extract(Path::new("/definitely/not/here/song.mp3"));
        assert_eq!(record.title, "song");
        assert_eq!(record.artist, UNKNOWN);
    }

    #[test]
    fn test_id3_tags_are_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.mp3");
        fs::write(&path, b"").unwrap();

        let mut tag = id3::Tag::new();
        tag.set_title("Song A");
        tag.set_artist("X");
        tag.set_album("Alpha");
        tag.set_duration(215_000);
        tag.write_to_path(&path, id3::Version::Id3v24).unwrap();

        let record = FileTagReader::new().extract(&path);
        assert_eq!(record, TrackRecord::new("Song A", "Alpha", "X", 215.0));
    }

    #[test]
    fn test_blank_tags_use_defaults() {
        let tags = RawTags {
            title: Some("   ".to_string()),
            album: None,
            artist: Some("".to_string()),
            duration: None,
        };
        let record = tags.into_record(Path::new("/music/Track 01.flac"));
        assert_eq!(record, TrackRecord::new("Track 01", UNKNOWN, UNKNOWN, 0.0));
    }

    #[test]
    fn test_merge_keeps_existing_values() {
        let mut tags = RawTags {
            title: Some("Kept".to_string()),
            ..RawTags::default()
        };
        tags.merge_missing(RawTags {
            title: Some("Ignored".to_string()),
            artist: Some("Filled".to_string()),
            duration: Some(12.0),
            ..RawTags::default()
        });
        assert_eq!(tags.title.as_deref(), Some("Kept"));
        assert_eq!(tags.artist.as_deref(), Some("Filled"));
        assert_eq!(tags.duration, Some(12.0));
    }
}

use crate::library::{Repository, TrackRecord};
use rand::seq::SliceRandom;
use rand::Rng;
use std::path::PathBuf;

/// One playable item: where the file is and what to call it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlaylistEntry {
    pub path: PathBuf,
    pub title: String,
}

/// Ordered sequence handed to the playback controller
pub type Playlist = Vec<PlaylistEntry>;

/// How a playlist is picked out of the library
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistPolicy {
    Random,
    Album(String),
    Artist(String),
}

impl PlaylistPolicy {
    pub fn build(&self, repository: &Repository) -> Playlist {
        match self {
            PlaylistPolicy::Random => shuffle_all(repository),
            PlaylistPolicy::Album(album) => shuffle_by_album(repository, album),
            PlaylistPolicy::Artist(artist) => shuffle_by_artist(repository, artist),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            PlaylistPolicy::Random => "random shuffle".to_string(),
            PlaylistPolicy::Album(album) => format!("album '{}'", album),
            PlaylistPolicy::Artist(artist) => format!("artist '{}'", artist),
        }
    }
}

/// Every track in the library, shuffled
pub fn shuffle_all(repository: &Repository) -> Playlist {
    shuffle_all_with_rng(repository, &mut rand::thread_rng())
}

/// Tracks whose album is exactly `album`, shuffled. Untagged tracks sit
/// under the "unknown" album.
pub fn shuffle_by_album(repository: &Repository, album: &str) -> Playlist {
    shuffle_by_album_with_rng(repository, album, &mut rand::thread_rng())
}

/// Tracks whose artist is exactly `artist`, shuffled
pub fn shuffle_by_artist(repository: &Repository, artist: &str) -> Playlist {
    shuffle_by_artist_with_rng(repository, artist, &mut rand::thread_rng())
}

pub fn shuffle_all_with_rng<R: Rng + ?Sized>(repository: &Repository, rng: &mut R) -> Playlist {
    shuffled(repository, |_| true, rng)
}

pub fn shuffle_by_album_with_rng<R: Rng + ?Sized>(repository: &Repository, album: &str, rng: &mut R) -> Playlist {
    shuffled(repository, |record| record.album == album, rng)
}

pub fn shuffle_by_artist_with_rng<R: Rng + ?Sized>(repository: &Repository, artist: &str, rng: &mut R) -> Playlist {
    shuffled(repository, |record| record.artist == artist, rng)
}

fn shuffled<F, R>(repository: &Repository, keep: F, rng: &mut R) -> Playlist
where
    F: Fn(&TrackRecord) -> bool,
    R: Rng + ?Sized,
{
    let mut entries: Playlist = repository
        .iter()
        .filter(|(_, record)| keep(record))
        .map(|(path, record)| PlaylistEntry {
            path: PathBuf::from(path),
            title: record.title.clone(),
        })
        .collect();

    entries.shuffle(rng);
    entries
}

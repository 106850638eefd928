// Music library - scanning, tag reading and the JSON repository

pub mod scanner; // finds audio files under a root
pub mod store;   // load/save/update of the persisted repository
pub mod tags;    // per-file metadata extraction
pub mod track;   // the record stored per file

pub use scanner::{MusicScanner, SUPPORTED_EXTENSIONS};
pub use store::{Repository, RepositoryStore, UpdateSummary};
pub use tags::{FileTagReader, TagReader};
pub use track::{TrackRecord, UNKNOWN};

use std::collections::BTreeSet;

/// Every album in the repository, sorted and deduplicated
pub fn distinct_albums(repository: &Repository) -> Vec<String> {
    distinct(repository, |record| &record.album)
}

/// Every artist in the repository, sorted and deduplicated
pub fn distinct_artists(repository: &Repository) -> Vec<String> {
    distinct(repository, |record| &record.artist)
}

fn distinct<F>(repository: &Repository, field: F) -> Vec<String>
where
    F: Fn(&TrackRecord) -> &String,
{
    repository
        .values()
        .map(|record| field(record).clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

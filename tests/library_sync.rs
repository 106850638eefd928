use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::tempdir;
use tokio::sync::mpsc;
use zka_player::audio::{playlist, AudioEngine, PlaybackController};
use zka_player::input::InputReader;
use zka_player::library::{RepositoryStore, TrackRecord, UNKNOWN};
use zka_player::{LibraryError, PlaybackError, PlaybackState, Repository};

fn key(path: &Path) -> String {
    path.to_str().unwrap().to_string()
}

fn write_tagged_mp3(path: &Path, title: &str, artist: &str, album: &str, duration_ms: u32) {
    fs::write(path, b"").unwrap();
    let mut tag = id3::Tag::new();
    id3::TagLike::set_title(&mut tag, title);
    id3::TagLike::set_artist(&mut tag, artist);
    id3::TagLike::set_album(&mut tag, album);
    id3::TagLike::set_duration(&mut tag, duration_ms);
    tag.write_to_path(path, id3::Version::Id3v24).unwrap();
}

#[tokio::test]
async fn update_reads_tags_and_falls_back_for_untagged_files() {
    let dir = tempdir().unwrap();
    let music = dir.path().join("music");
    fs::create_dir_all(&music).unwrap();
    let music = music.canonicalize().unwrap();
    write_tagged_mp3(&music.join("a.mp3"), "Song A", "X", "Alpha", 200_000);
    fs::write(music.join("b.wav"), b"no tags in here").unwrap();
    fs::write(music.join("readme.txt"), b"skip me").unwrap();

    let store = RepositoryStore::new(dir.path().join("library").join("repo.json"));
    let summary = store.update(&music).await.unwrap();
    assert_eq!(summary.added, 2);
    assert!(summary.written);

    let repository = store.load().await.unwrap();
    assert_eq!(repository.len(), 2);
    assert_eq!(
        repository[&key(&music.join("a.mp3"))],
        TrackRecord::new("Song A", "Alpha", "X", 200.0)
    );
    assert_eq!(
        repository[&key(&music.join("b.wav"))],
        TrackRecord::new("b", UNKNOWN, UNKNOWN, 0.0)
    );

    // On disk each record is [title, album, artist, duration]
    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
    assert_eq!(raw[key(&music.join("a.mp3"))], serde_json::json!(["Song A", "Alpha", "X", 200.0]));
}

#[tokio::test]
async fn second_update_without_changes_writes_nothing() {
    let dir = tempdir().unwrap();
    let music = dir.path().join("music");
    fs::create_dir_all(music.join("sub")).unwrap();
    fs::write(music.join("one.ogg"), b"x").unwrap();
    fs::write(music.join("sub").join("two.flac"), b"x").unwrap();

    let store = RepositoryStore::new(dir.path().join("repo.json"));
    store.update(&music).await.unwrap();
    let first = store.load().await.unwrap();

    // Rewrite the same content compactly; a second save would pretty-print it again
    let compact = serde_json::to_string(&first).unwrap();
    fs::write(store.path(), &compact).unwrap();

    let summary = store.update(&music).await.unwrap();
    assert_eq!(summary.scanned, 2);
    assert_eq!(summary.added, 0);
    assert!(!summary.written);
    assert_eq!(fs::read_to_string(store.path()).unwrap(), compact);
    assert_eq!(store.load().await.unwrap(), first);
}

#[tokio::test]
async fn new_files_are_merged_into_existing_library() {
    let dir = tempdir().unwrap();
    let music = dir.path().join("music");
    fs::create_dir_all(&music).unwrap();
    let music = music.canonicalize().unwrap();
    fs::write(music.join("first.mp3"), b"x").unwrap();

    let store = RepositoryStore::new(dir.path().join("repo.json"));
    store.update(&music).await.unwrap();

    fs::write(music.join("second.opus"), b"x").unwrap();
    let summary = store.update(&music).await.unwrap();
    assert_eq!(summary.added, 1);

    let repository = store.load().await.unwrap();
    assert!(repository.contains_key(&key(&music.join("first.mp3"))));
    assert_eq!(repository[&key(&music.join("second.opus"))].title, "second");
}

#[tokio::test]
async fn empty_directory_leaves_library_alone() {
    let dir = tempdir().unwrap();
    let music = dir.path().join("empty");
    fs::create_dir_all(&music).unwrap();
    let music = music.canonicalize().unwrap();

    let store = RepositoryStore::new(dir.path().join("repo.json"));
    store.save(&Repository::new()).await.unwrap();
    fs::write(store.path(), "{ }").unwrap();

    let summary = store.update(&music).await.unwrap();
    assert_eq!(summary.scanned, 0);
    assert!(!summary.written);
    assert_eq!(fs::read_to_string(store.path()).unwrap(), "{ }");
}

#[tokio::test]
async fn missing_root_is_reported() {
    let dir = tempdir().unwrap();
    let store = RepositoryStore::new(dir.path().join("repo.json"));

    let result = store.update(dir.path().join("gone")).await;
    assert!(matches!(result, Err(LibraryError::NotFound(_))));
}

/// Engine where every track ends as soon as it starts
#[derive(Default)]
struct InstantEngine {
    played: Arc<Mutex<Vec<PathBuf>>>,
}

impl AudioEngine for InstantEngine {
    fn load(&mut self, path: &Path) -> Result<(), PlaybackError> {
        self.played.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        Ok(())
    }

    fn pause(&mut self) -> Result<(), PlaybackError> {
        Ok(())
    }

    fn resume(&mut self) -> Result<(), PlaybackError> {
        Ok(())
    }

    fn stop(&mut self) -> Result<(), PlaybackError> {
        Ok(())
    }

    fn is_busy(&self) -> bool {
        false
    }
}

/// Reader that never sends anything and waits to be told to stop
struct IdleInput;

impl InputReader for IdleInput {
    fn run(self: Box<Self>, _keys: mpsc::UnboundedSender<char>, stop: Arc<AtomicBool>) {
        while !stop.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(1));
        }
    }
}

#[tokio::test]
async fn scanned_album_plays_through() {
    let dir = tempdir().unwrap();
    let music = dir.path().join("music");
    fs::create_dir_all(&music).unwrap();
    let music = music.canonicalize().unwrap();
    write_tagged_mp3(&music.join("one.mp3"), "One", "X", "Alpha", 1_000);
    write_tagged_mp3(&music.join("two.mp3"), "Two", "X", "Alpha", 1_000);
    write_tagged_mp3(&music.join("other.mp3"), "Other", "Y", "Beta", 1_000);

    let store = RepositoryStore::new(dir.path().join("repo.json"));
    store.update(&music).await.unwrap();
    let repository = store.load().await.unwrap();

    let album = playlist::shuffle_by_album(&repository, "Alpha");
    assert_eq!(album.len(), 2);
    let expected: Vec<PathBuf> = album.iter().map(|entry| entry.path.clone()).collect();

    let engine = InstantEngine::default();
    let played = Arc::clone(&engine.played);
    let mut controller = PlaybackController::new(engine, Duration::from_millis(1));

    let state = controller.run(album, Box::new(IdleInput)).await;
    assert_eq!(state, PlaybackState::Finished);
    assert_eq!(*played.lock().unwrap(), expected);
}

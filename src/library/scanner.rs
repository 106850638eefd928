use crate::error::LibraryError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Extensions (lower-case, no dot) picked up by a scan
pub const SUPPORTED_EXTENSIONS: [&str; 9] = [
    "mp3", "flac", "wav", "aac", "m4a", "ogg", "wma", "alac", "opus",
];

#[derive(Debug, Clone, Default)]
pub struct MusicScanner;

impl MusicScanner {
    pub fn new() -> Self {
        Self
    }

    /// Walks `root` on the blocking pool and resolves once with every audio
    /// file found. Fails with `NotFound` before any work is scheduled when the
    /// root isn't a directory. Paths come back absolute and canonical, so the
    /// same file maps to the same path however the root was spelled. Result
    /// order is unspecified.
    pub async fn scan<P: AsRef<Path>>(&self, root: P) -> Result<Vec<PathBuf>, LibraryError> {
        let root = resolve_root(root.as_ref())?;

        let scanner = self.clone();
        tokio::task::spawn_blocking(move || scanner.scan_blocking(&root))
            .await
            .map_err(|e| LibraryError::Task(e.to_string()))?
    }

    /// Synchronous form of [`scan`](Self::scan)
    pub fn scan_blocking(&self, root: &Path) -> Result<Vec<PathBuf>, LibraryError> {
        let root = resolve_root(root)?;
        let root = root.as_path();

        let mut found = Vec::new();

        for entry in WalkDir::new(root).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    // Unreadable subdirectories are skipped, not fatal
                    warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                    continue;
                }
            };

            if entry.file_type().is_file() && self.is_supported_file(entry.path()) {
                found.push(entry.into_path());
            }
        }

        debug!("Scanned {}: {} audio files", root.display(), found.len());
        Ok(found)
    }

    pub fn is_supported_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let normalized = ext.to_ascii_lowercase();
                SUPPORTED_EXTENSIONS.contains(&normalized.as_str())
            })
            .unwrap_or(false)
    }
}

/// Checks `root` is a directory and returns its canonical form
fn resolve_root(root: &Path) -> Result<PathBuf, LibraryError> {
    if !root.is_dir() {
        return Err(LibraryError::NotFound(root.to_path_buf()));
    }

    std::fs::canonicalize(root).map_err(|e| {
        debug!("Could not resolve {}: {}", root.display(), e);
        LibraryError::NotFound(root.to_path_buf())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_supported_extensions_case_insensitive() {
        let scanner = MusicScanner::new();
        for name in ["a.mp3", "a.MP3", "a.Flac", "a.wav", "a.opus", "a.wma", "a.alac", "a.m4a"] {
            assert!(scanner.is_supported_file(Path::new(name)), "{}", name);
        }
        for name in ["a.txt", "a.mp4", "a", "mp3"] {
            assert!(!scanner.is_supported_file(Path::new(name)), "{}", name);
        }
    }

    #[tokio::test]
    async fn test_scan_recurses_and_filters() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("albums").join("alpha");
        fs::create_dir_all(&nested).unwrap();

        fs::write(dir.path().join("top.MP3"), b"x").unwrap();
        fs::write(nested.join("deep.ogg"), b"x").unwrap();
        fs::write(nested.join("cover.jpg"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let mut found = MusicScanner::new().scan(dir.path()).await.unwrap();
        found.sort();

        let root = dir.path().canonicalize().unwrap();
        let mut expected = vec![root.join("top.MP3"), root.join("albums").join("alpha").join("deep.ogg")];
        expected.sort();
        assert_eq!(found, expected);
    }

    #[tokio::test]
    async fn test_scan_missing_root_is_not_found() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing");

        let err = MusicScanner::new().scan(&missing).await.unwrap_err();
        assert!(matches!(err, LibraryError::NotFound(p) if p == missing));
    }

    #[tokio::test]
    async fn test_scan_file_root_is_not_found() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("song.mp3");
        fs::write(&file, b"x").unwrap();

        let err = MusicScanner::new().scan(&file).await.unwrap_err();
        assert!(matches!(err, LibraryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_scan_returns_canonical_paths() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("music").join("sub")).unwrap();
        fs::write(dir.path().join("music").join("a.mp3"), b"x").unwrap();

        let scanner = MusicScanner::new();
        let plain = scanner.scan(dir.path().join("music")).await.unwrap();
        let dotted = scanner
            .scan(dir.path().join("music").join("sub").join("..").join("."))
            .await
            .unwrap();

        let expected = vec![dir.path().canonicalize().unwrap().join("music").join("a.mp3")];
        assert_eq!(plain, expected);
        assert_eq!(dotted, expected);
        assert!(plain[0].is_absolute());
    }

    #[tokio::test]
    async fn test_scan_empty_directory() {
        let dir = tempdir().unwrap();
        assert!(MusicScanner::new().scan(dir.path()).await.unwrap().is_empty());
    }
}

use super::scanner::MusicScanner;
use super::tags::{FileTagReader, TagReader};
use super::track::TrackRecord;
use crate::error::LibraryError;
use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};

/// The whole library: file path -> metadata
pub type Repository = HashMap<String, TrackRecord>;

/// What a call to [`RepositoryStore::update`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateSummary {
    /// Audio files found under the root
    pub scanned: usize,
    /// Records created for paths the repository didn't know yet
    pub added: usize,
    /// Whether the repository file was rewritten
    pub written: bool,
}

/// JSON-backed repository living at a fixed location.
///
/// Load/merge/save is not atomic: two `update` calls racing on the same file
/// end with the last writer's view. Run one update at a time.
pub struct RepositoryStore {
    path: PathBuf,
    scanner: MusicScanner,
    tag_reader: Arc<dyn TagReader>,
}

impl RepositoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_tag_reader(path, Arc::new(FileTagReader::new()))
    }

    pub fn with_tag_reader(path: impl Into<PathBuf>, tag_reader: Arc<dyn TagReader>) -> Self {
        Self {
            path: path.into(),
            scanner: MusicScanner::new(),
            tag_reader,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the repository. A missing file is created as `{}` (parents
    /// included) and yields an empty repository.
    pub async fn load(&self) -> Result<Repository, LibraryError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.create_empty().await?;
                return Ok(Repository::new());
            }
            Err(e) => return Err(LibraryError::storage(&self.path, e)),
        };

        let repository: Repository = serde_json::from_str(&content).map_err(|source| LibraryError::Decode {
            path: self.path.clone(),
            source,
        })?;

        debug!("Loaded {} tracks from {}", repository.len(), self.path.display());
        Ok(repository)
    }

    /// [`load`](Self::load), logging any failure and falling back to an empty
    /// repository
    pub async fn load_or_empty(&self) -> Repository {
        match self.load().await {
            Ok(repository) => repository,
            Err(e) => {
                warn!("Using an empty library for this run: {}", e);
                Repository::new()
            }
        }
    }

    /// Overwrites the repository file with `repository`
    pub async fn save(&self, repository: &Repository) -> Result<(), LibraryError> {
        let json = serde_json::to_string_pretty(repository).map_err(|e| {
            LibraryError::storage(&self.path, std::io::Error::new(ErrorKind::InvalidData, e))
        })?;

        self.ensure_parent().await?;
        fs::write(&self.path, json)
            .await
            .map_err(|e| LibraryError::storage(&self.path, e))?;

        info!("Saved {} tracks to {}", repository.len(), self.path.display());
        Ok(())
    }

    /// Scans `root`, reads tags for paths not yet in the repository and saves
    /// when anything was added. Known paths are left untouched, so running it
    /// again over an unchanged tree writes nothing.
    pub async fn update<P: AsRef<Path>>(&self, root: P) -> Result<UpdateSummary, LibraryError> {
        let root = root.as_ref();

        // Scan first: a bad root must not touch the repository file
        let candidates = self.scanner.scan(root).await?;
        let mut repository = self.load().await?;

        let mut seen = HashSet::new();
        let new_paths: Vec<(String, PathBuf)> = candidates
            .iter()
            .filter_map(|path| match path.to_str() {
                Some(key) => Some((key.to_string(), path.clone())),
                None => {
                    warn!("Skipping non UTF-8 path {}", path.display());
                    None
                }
            })
            .filter(|(key, _)| !repository.contains_key(key) && seen.insert(key.clone()))
            .collect();

        let mut summary = UpdateSummary {
            scanned: candidates.len(),
            ..UpdateSummary::default()
        };

        if new_paths.is_empty() {
            info!("No new tracks under {} ({} already known)", root.display(), summary.scanned);
            return Ok(summary);
        }

        let reader = Arc::clone(&self.tag_reader);
        let records = tokio::task::spawn_blocking(move || {
            new_paths
                .into_iter()
                .map(|(key, path)| {
                    let record = reader.extract(&path);
                    (key, record)
                })
                .collect::<Vec<_>>()
        })
        .await
        .map_err(|e| LibraryError::Task(e.to_string()))?;

        summary.added = records.len();
        repository.extend(records);

        self.save(&repository).await?;
        summary.written = true;

        info!("Added {} new tracks from {}", summary.added, root.display());
        Ok(summary)
    }

    async fn create_empty(&self) -> Result<(), LibraryError> {
        self.ensure_parent().await?;
        fs::write(&self.path, "{}")
            .await
            .map_err(|e| LibraryError::storage(&self.path, e))?;
        info!("Created empty repository at {}", self.path.display());
        Ok(())
    }

    async fn ensure_parent(&self) -> Result<(), LibraryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| LibraryError::storage(parent, e))?;
        }
        Ok(())
    }
}

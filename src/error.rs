// Error types for the library and playback layers
// Binaries wrap these in anyhow; everything below them stays typed

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LibraryError {
    /// Scan root is missing or is not a directory
    #[error("Music directory not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Repository document exists but is not valid JSON
    #[error("Repository file {} is corrupted: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Permission or I/O failure while reading or writing the repository
    #[error("Could not access repository file {}: {source}", .path.display())]
    StorageAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Background scan or tag task died before returning
    #[error("Background task failed: {0}")]
    Task(String),
}

impl LibraryError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LibraryError::StorageAccess {
            path: path.into(),
            source,
        }
    }

    /// Errors the interactive session can shrug off and keep going
    pub fn is_recoverable(&self) -> bool {
        matches!(self, LibraryError::Decode { .. } | LibraryError::StorageAccess { .. })
    }
}

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("Failed to open audio file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode audio file '{}': {reason}. This file may be corrupted or use an unsupported format.", .path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("Audio output unavailable: {0}")]
    Output(String),

    #[error("No track loaded")]
    NoTrackLoaded,
}

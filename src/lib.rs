// ZKA Player Library - Core modules for the terminal shuffle player
// Library sync and playback are kept apart from the terminal front end

pub mod audio;   // playlists, the playback loop and the rodio engine
pub mod config;  // settings and preferences
pub mod error;   // typed errors for library and playback
pub mod input;   // key capture for transport controls
pub mod library; // scanning, tags and the JSON repository
pub mod ui;      // console output and prompts

// Export the stuff other modules actually use
pub use audio::{AudioConfig, AudioEngine, PlaybackController, PlaybackState, PlayerEvent, Playlist, PlaylistPolicy};
pub use config::Config;
pub use error::{LibraryError, PlaybackError};
pub use library::{MusicScanner, Repository, RepositoryStore, TrackRecord};

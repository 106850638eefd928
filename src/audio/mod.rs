pub mod controller;
#[cfg(feature = "audio")]
pub mod player;
pub mod playlist;

pub use controller::{PlaybackController, PlayerEvent};
#[cfg(feature = "audio")]
pub use player::RodioEngine;
pub use playlist::{Playlist, PlaylistEntry, PlaylistPolicy};

use crate::error::PlaybackError;
use std::path::Path;
use std::time::Duration;

/// Sound output as the controller sees it. Failures are per track; the
/// controller logs them and moves on.
pub trait AudioEngine {
    /// Prepares `path` for playback, replacing whatever was loaded
    fn load(&mut self, path: &Path) -> Result<(), PlaybackError>;
    fn play(&mut self) -> Result<(), PlaybackError>;
    fn pause(&mut self) -> Result<(), PlaybackError>;
    fn resume(&mut self) -> Result<(), PlaybackError>;
    fn stop(&mut self) -> Result<(), PlaybackError>;
    /// True while the loaded track still has audio left, paused or not
    fn is_busy(&self) -> bool;
}

#[derive(Debug, Clone)]
pub struct AudioConfig {
    pub volume: f32,           // 0.0 to 1.0
    pub fade_in_duration: u64,  // milliseconds for smooth track start
    pub fade_out_duration: u64, // milliseconds for smooth track stop
    pub poll_interval: Duration,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            volume: 0.7,
            fade_in_duration: 300,
            fade_out_duration: 200,
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl From<&crate::config::Config> for AudioConfig {
    fn from(config: &crate::config::Config) -> Self {
        let playback = &config.playback;
        Self {
            volume: playback.volume.clamp(0.0, 1.0),
            fade_in_duration: playback.fade_in_ms,
            fade_out_duration: playback.fade_out_ms,
            // A zero interval would spin the scheduler
            poll_interval: Duration::from_millis(playback.poll_interval_ms.max(1)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Loading(usize),
    Playing(usize),
    Paused(usize),
    Skipping,
    Stopped,
    Finished,
}

impl PlaybackState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlaybackState::Stopped | PlaybackState::Finished)
    }
}

/// Transport commands typed during playback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackCommand {
    Pause,
    Resume,
    Skip,
    Quit,
}

impl PlaybackCommand {
    pub fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'p' => Some(PlaybackCommand::Pause),
            'r' => Some(PlaybackCommand::Resume),
            's' => Some(PlaybackCommand::Skip),
            'q' => Some(PlaybackCommand::Quit),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PlaybackCommand::Pause => "pause",
            PlaybackCommand::Resume => "resume",
            PlaybackCommand::Skip => "skip",
            PlaybackCommand::Quit => "quit",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_keys() {
        assert_eq!(PlaybackCommand::from_key('p'), Some(PlaybackCommand::Pause));
        assert_eq!(PlaybackCommand::from_key('R'), Some(PlaybackCommand::Resume));
        assert_eq!(PlaybackCommand::from_key('s'), Some(PlaybackCommand::Skip));
        assert_eq!(PlaybackCommand::from_key('q'), Some(PlaybackCommand::Quit));
        assert_eq!(PlaybackCommand::from_key('x'), None);
        assert_eq!(PlaybackCommand::from_key(' '), None);
    }

    #[test]
    fn test_audio_config_from_settings() {
        let mut config = crate::config::Config::default();
        config.playback.volume = 3.0;
        config.playback.poll_interval_ms = 0;

        let audio = AudioConfig::from(&config);
        assert_eq!(audio.volume, 1.0);
        assert_eq!(audio.poll_interval, Duration::from_millis(1));
    }
}

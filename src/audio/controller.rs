use super::playlist::{Playlist, PlaylistEntry};
use super::{AudioEngine, PlaybackCommand, PlaybackState};
use crate::error::PlaybackError;
use crate::input::InputReader;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    TrackStarted { index: usize, entry: PlaylistEntry },
    TrackFailed { index: usize, entry: PlaylistEntry, error: String },
    TrackFinished { index: usize },
    TrackSkipped { index: usize },
    Paused { index: usize },
    Resumed { index: usize },
    InvalidCommand(char),
    SessionEnded(PlaybackState),
}

/// How the wait on a single track ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackEnd {
    Completed,
    Skipped,
    Quit,
}

/// Plays a playlist front to back while reacting to keys from an
/// [`InputReader`] running on its own thread.
pub struct PlaybackController<E: AudioEngine> {
    engine: E,
    poll_interval: Duration,
    state: PlaybackState,
    event_sender: Option<mpsc::UnboundedSender<PlayerEvent>>,
}

impl<E: AudioEngine> PlaybackController<E> {
    pub fn new(engine: E, poll_interval: Duration) -> Self {
        Self {
            engine,
            poll_interval,
            state: PlaybackState::Idle,
            event_sender: None,
        }
    }

    pub fn set_event_sender(&mut self, sender: mpsc::UnboundedSender<PlayerEvent>) {
        self.event_sender = Some(sender);
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Plays every entry in order. Returns `Finished` when the list ran out
    /// or `Stopped` on quit; either way the input thread has been joined.
    pub async fn run(&mut self, playlist: Playlist, input: Box<dyn InputReader>) -> PlaybackState {
        let (key_tx, mut key_rx) = mpsc::unbounded_channel();
        let stop = Arc::new(AtomicBool::new(false));

        let reader = {
            let stop = Arc::clone(&stop);
            std::thread::Builder::new()
                .name("zka-input".to_string())
                .spawn(move || input.run(key_tx, stop))
        };
        let reader = match reader {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Could not start input reader, controls disabled: {}", e);
                None
            }
        };

        info!("Starting playback of {} tracks", playlist.len());
        let outcome = self.play_all(&playlist, &mut key_rx).await;

        stop.store(true, Ordering::SeqCst);
        if let Some(handle) = reader {
            join_reader(handle).await;
        }

        if let Err(e) = self.engine.stop() {
            debug!("Engine stop after session: {}", e);
        }

        self.state = outcome;
        info!("Playback session ended: {:?}", outcome);
        self.emit(PlayerEvent::SessionEnded(outcome));
        outcome
    }

    async fn play_all(&mut self, playlist: &Playlist, keys: &mut mpsc::UnboundedReceiver<char>) -> PlaybackState {
        for (index, entry) in playlist.iter().enumerate() {
            self.state = PlaybackState::Loading(index);

            if let Err(e) = self.start_track(entry) {
                // One bad file never ends the session
                warn!("Couldn't play {}: {}", entry.title, e);
                self.emit(PlayerEvent::TrackFailed {
                    index,
                    entry: entry.clone(),
                    error: e.to_string(),
                });
                continue;
            }

            self.state = PlaybackState::Playing(index);
            info!("Playing: {}", entry.title);
            self.emit(PlayerEvent::TrackStarted {
                index,
                entry: entry.clone(),
            });

            match self.wait_for_track(index, keys).await {
                TrackEnd::Completed => self.emit(PlayerEvent::TrackFinished { index }),
                TrackEnd::Skipped => {
                    self.state = PlaybackState::Skipping;
                    self.emit(PlayerEvent::TrackSkipped { index });
                }
                TrackEnd::Quit => return PlaybackState::Stopped,
            }
        }

        PlaybackState::Finished
    }

    fn start_track(&mut self, entry: &PlaylistEntry) -> Result<(), PlaybackError> {
        self.engine.load(&entry.path)?;
        self.engine.play()
    }

    /// Polls both the key channel and the engine every tick until the track
    /// ends one way or another
    async fn wait_for_track(&mut self, index: usize, keys: &mut mpsc::UnboundedReceiver<char>) -> TrackEnd {
        loop {
            // Disconnected just means the reader is gone; keep playing
            while let Ok(key) = keys.try_recv() {
                if let Some(end) = self.handle_key(index, key) {
                    return end;
                }
            }

            // A paused track is still loaded, never treat it as done
            if self.state == PlaybackState::Playing(index) && !self.engine.is_busy() {
                debug!("Track {} finished", index);
                return TrackEnd::Completed;
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    fn handle_key(&mut self, index: usize, key: char) -> Option<TrackEnd> {
        let Some(command) = PlaybackCommand::from_key(key) else {
            warn!("Invalid command {:?}. Use: p, r, s, q", key);
            self.emit(PlayerEvent::InvalidCommand(key));
            return None;
        };

        debug!("Command: {}", command.label());

        match command {
            PlaybackCommand::Pause => {
                if self.state == PlaybackState::Playing(index) {
                    if let Err(e) = self.engine.pause() {
                        warn!("Pause failed: {}", e);
                        return None;
                    }
                    self.state = PlaybackState::Paused(index);
                    self.emit(PlayerEvent::Paused { index });
                }
                None
            }
            PlaybackCommand::Resume => {
                if self.state == PlaybackState::Paused(index) {
                    if let Err(e) = self.engine.resume() {
                        warn!("Resume failed: {}", e);
                        return None;
                    }
                    self.state = PlaybackState::Playing(index);
                    self.emit(PlayerEvent::Resumed { index });
                }
                None
            }
            PlaybackCommand::Skip => {
                self.stop_engine();
                Some(TrackEnd::Skipped)
            }
            PlaybackCommand::Quit => {
                self.stop_engine();
                Some(TrackEnd::Quit)
            }
        }
    }

    fn stop_engine(&mut self) {
        if let Err(e) = self.engine.stop() {
            warn!("Stop failed: {}", e);
        }
    }

    fn emit(&self, event: PlayerEvent) {
        if let Some(sender) = &self.event_sender {
            let _ = sender.send(event);
        }
    }
}

/// Joins the reader thread without blocking the async scheduler
async fn join_reader(handle: JoinHandle<()>) {
    match tokio::task::spawn_blocking(move || handle.join()).await {
        Ok(Ok(())) => debug!("Input reader joined"),
        Ok(Err(_)) => warn!("Input reader panicked"),
        Err(e) => warn!("Failed to join input reader: {}", e),
    }
}

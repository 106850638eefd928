use super::{AudioConfig, AudioEngine};
use crate::error::PlaybackError;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// rodio-backed engine: one sink per loaded track.
///
/// Every call returns right away. Volume fades run on a short-lived thread so
/// the playback loop keeps its poll tick.
pub struct RodioEngine {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    sink: Option<Arc<Sink>>,
    loaded: Option<PathBuf>,
    config: AudioConfig,
    fader: Fader,
}

impl RodioEngine {
    /// Opens the default output device
    pub fn new(config: AudioConfig) -> Result<Self, PlaybackError> {
        let (stream, stream_handle) =
            OutputStream::try_default().map_err(|e| PlaybackError::Output(e.to_string()))?;

        Ok(Self {
            _stream: stream,
            stream_handle,
            sink: None,
            loaded: None,
            config,
            fader: Fader::default(),
        })
    }

    fn sink(&self) -> Result<Arc<Sink>, PlaybackError> {
        self.sink.clone().ok_or(PlaybackError::NoTrackLoaded)
    }
}

impl AudioEngine for RodioEngine {
    fn load(&mut self, path: &Path) -> Result<(), PlaybackError> {
        self.stop()?;

        let file = File::open(path).map_err(|source| PlaybackError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        // Decode audio file - M4A/AAC codec support comes from Symphonia
        let source = Decoder::new(BufReader::new(file)).map_err(|e| PlaybackError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let sink = Sink::try_new(&self.stream_handle).map_err(|e| PlaybackError::Output(e.to_string()))?;
        sink.pause();
        sink.set_volume(0.0);
        sink.append(source);

        debug!("Loaded {}", path.display());
        self.sink = Some(Arc::new(sink));
        self.loaded = Some(path.to_path_buf());
        Ok(())
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        let sink = self.sink()?;
        sink.set_volume(0.0);
        self.fader
            .start(sink, Fade::In, self.config.volume, self.config.fade_in_duration);
        Ok(())
    }

    fn pause(&mut self) -> Result<(), PlaybackError> {
        // Quick fade for pause transitions
        self.fader.start(self.sink()?, Fade::OutPause, 0.0, 100);
        Ok(())
    }

    fn resume(&mut self) -> Result<(), PlaybackError> {
        self.fader
            .start(self.sink()?, Fade::In, self.config.volume, self.config.fade_in_duration);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), PlaybackError> {
        if let Some(sink) = self.sink.take() {
            let duration = if sink.is_paused() { 0 } else { self.config.fade_out_duration };
            self.fader.start(sink, Fade::OutStop, 0.0, duration);
        }
        if let Some(path) = self.loaded.take() {
            debug!("Stopped {}", path.display());
        }
        Ok(())
    }

    fn is_busy(&self) -> bool {
        self.sink.as_ref().map(|sink| !sink.empty()).unwrap_or(false)
    }
}

/// What a volume ramp does at either end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fade {
    /// Start playing, then ramp up
    In,
    /// Ramp down, then pause
    OutPause,
    /// Ramp down, then stop. Never cancelled: nobody else owns the sink any more
    OutStop,
}

/// The parts of a sink a fade touches
trait FadeTarget: Send + Sync + 'static {
    fn volume(&self) -> f32;
    fn set_volume(&self, volume: f32);
    fn play(&self);
    fn pause(&self);
    fn stop(&self);
}

impl FadeTarget for Sink {
    fn volume(&self) -> f32 {
        Sink::volume(self)
    }

    fn set_volume(&self, volume: f32) {
        Sink::set_volume(self, volume)
    }

    fn play(&self) {
        Sink::play(self)
    }

    fn pause(&self) {
        Sink::pause(self)
    }

    fn stop(&self) {
        Sink::stop(self)
    }
}

const FADE_STEPS: u64 = 10;

/// Runs volume ramps off the caller's thread. Each new ramp supersedes the
/// one before it, which then skips its remaining steps and its final pause.
#[derive(Debug, Default)]
struct Fader {
    generation: Arc<Mutex<u64>>,
}

impl Fader {
    fn start<T: FadeTarget>(&self, target: Arc<T>, fade: Fade, to: f32, duration_ms: u64) -> Option<JoinHandle<()>> {
        let generation = {
            let mut current = lock(&self.generation);
            *current += 1;
            // Under the lock so a superseded pause can't land after this
            if fade == Fade::In {
                target.play();
            }
            *current
        };

        if duration_ms == 0 {
            target.set_volume(to);
            finish(target.as_ref(), fade);
            return None;
        }

        let shared = Arc::clone(&self.generation);
        let worker = Arc::clone(&target);
        let spawned = thread::Builder::new()
            .name("zka-fade".to_string())
            .spawn(move || ramp(worker.as_ref(), &shared, generation, fade, to, duration_ms));

        match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Could not start fade thread, applying volume at once: {}", e);
                target.set_volume(to);
                finish(target.as_ref(), fade);
                None
            }
        }
    }
}

fn ramp<T: FadeTarget>(target: &T, shared: &Mutex<u64>, generation: u64, fade: Fade, to: f32, duration_ms: u64) {
    let superseded = |current: u64| fade != Fade::OutStop && current != generation;

    let from = target.volume();
    let step_duration = Duration::from_millis(duration_ms / FADE_STEPS);

    for step in 1..=FADE_STEPS {
        {
            let current = lock(shared);
            if superseded(*current) {
                return;
            }
            let progress = step as f32 / FADE_STEPS as f32;
            target.set_volume((from + (to - from) * progress).max(0.0));
        }
        thread::sleep(step_duration);
    }

    let current = lock(shared);
    if !superseded(*current) {
        target.set_volume(to);
        finish(target, fade);
    }
}

fn finish<T: FadeTarget + ?Sized>(target: &T, fade: Fade) {
    match fade {
        Fade::In => {}
        Fade::OutPause => target.pause(),
        Fade::OutStop => target.stop(),
    }
}

fn lock(generation: &Mutex<u64>) -> MutexGuard<'_, u64> {
    generation.lock().unwrap_or_else(PoisonError::into_inner)
}

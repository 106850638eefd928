// Key capture for the transport controls
// Runs on its own thread; the playback loop only ever sees a channel of chars

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Produces command keys on a dedicated thread.
///
/// `run` must return soon after `stop` is raised; the controller joins the
/// thread before handing control back.
pub trait InputReader: Send + 'static {
    fn run(self: Box<Self>, keys: mpsc::UnboundedSender<char>, stop: Arc<AtomicBool>);
}

/// Reads single key presses from the terminal in raw mode
#[derive(Debug, Clone)]
pub struct KeyboardReader {
    poll_interval: Duration,
}

impl KeyboardReader {
    pub fn new() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
        }
    }

    fn read_keys(&self, keys: &mpsc::UnboundedSender<char>, stop: &AtomicBool) -> std::io::Result<()> {
        while !stop.load(Ordering::SeqCst) {
            if !event::poll(self.poll_interval)? {
                continue;
            }

            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                let forwarded = match key.code {
                    // Raw mode swallows SIGINT, treat Ctrl+C as quit
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some('q'),
                    KeyCode::Char(c) if !c.is_control() => Some(c),
                    _ => None,
                };

                if let Some(c) = forwarded {
                    debug!("Key pressed: {:?}", c);
                    if keys.send(c).is_err() {
                        // Nobody is listening any more
                        break;
                    }
                }
            }
        }

        Ok(())
    }
}

impl Default for KeyboardReader {
    fn default() -> Self {
        Self::new()
    }
}

impl InputReader for KeyboardReader {
    fn run(self: Box<Self>, keys: mpsc::UnboundedSender<char>, stop: Arc<AtomicBool>) {
        let _raw_mode = match RawModeGuard::enable() {
            Ok(guard) => guard,
            Err(e) => {
                warn!("Keyboard controls unavailable: {}", e);
                return;
            }
        };

        if let Err(e) = self.read_keys(&keys, &stop) {
            warn!("Keyboard reader stopped: {}", e);
        }
    }
}

/// Restores cooked mode however the reader exits
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> std::io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

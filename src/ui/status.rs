use crate::audio::{PlaybackState, PlayerEvent};
use crossterm::{
    cursor::MoveToColumn,
    queue,
    style::{Print, Stylize},
    terminal::{Clear, ClearType},
};
use std::io::{self, Write};

/// Single rewritten line of playback status.
///
/// The terminal is in raw mode while a session runs, so every message
/// returns to column 0 and clears the line instead of relying on newlines.
pub struct StatusLine<W: Write> {
    out: W,
    total: usize,
}

impl StatusLine<io::Stdout> {
    pub fn stdout(total: usize) -> Self {
        Self::new(io::stdout(), total)
    }
}

impl<W: Write> StatusLine<W> {
    pub fn new(out: W, total: usize) -> Self {
        Self { out, total }
    }

    pub fn show_controls(&mut self) -> io::Result<()> {
        self.show("🎵 Controls: p (pause), r (resume), s (skip), q (quit)".to_string())
    }

    pub fn handle(&mut self, event: &PlayerEvent) -> io::Result<()> {
        let message = match event {
            PlayerEvent::TrackStarted { index, entry } => {
                format!("▶ [{}/{}] Playing: {} 🎶", index + 1, self.total, entry.title)
            }
            PlayerEvent::TrackFailed { entry, error, .. } => {
                format!("{} Couldn't play {}: {}", "[ERROR]".red(), entry.title, error)
            }
            PlayerEvent::TrackFinished { .. } => return Ok(()),
            PlayerEvent::TrackSkipped { .. } => "⏭ Skipped".to_string(),
            PlayerEvent::Paused { .. } => "⏸ Paused (r to resume)".to_string(),
            PlayerEvent::Resumed { .. } => "▶ Resumed".to_string(),
            PlayerEvent::InvalidCommand(key) => {
                format!("{} Invalid command '{}'. Use: p, r, s, q", "[WARNING]".yellow(), key)
            }
            PlayerEvent::SessionEnded(state) => {
                let message = match state {
                    PlaybackState::Stopped => "⏹ Playback stopped",
                    _ => "✅ Done playing all tracks",
                };
                self.show(message.to_string())?;
                // Leave the final message on its own line
                queue!(self.out, Print("\r\n"))?;
                return self.out.flush();
            }
        };

        self.show(message)
    }

    fn show(&mut self, message: String) -> io::Result<()> {
        queue!(self.out, MoveToColumn(0), Clear(ClearType::CurrentLine), Print(message))?;
        self.out.flush()
    }
}

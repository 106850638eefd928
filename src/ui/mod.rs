// Terminal front end - the face of ZKA Player
// Plain line-based prompts plus a status line while playback owns the keyboard

mod status;

pub use status::StatusLine;

use crate::audio::PlaylistPolicy;
use crate::library::{self, Repository};
use anyhow::{bail, Result};
use crossterm::style::Stylize;
use fuzzy_matcher::{clangd::ClangdMatcher, FuzzyMatcher};
use std::io::{self, BufRead, Write};

pub fn print_banner() {
    println!("{}", "🎧 ZKA Player".magenta().bold());
    println!("{}", "=============".magenta());
}

/// Library table sorted by artist, album, then title
pub fn print_library(repository: &Repository) {
    if repository.is_empty() {
        println!("{}", "Your library is empty - add a folder to get started.".yellow());
        return;
    }

    let mut records: Vec<_> = repository.values().collect();
    records.sort_by(|a, b| {
        (a.artist.to_lowercase(), a.album.to_lowercase(), a.title.to_lowercase())
            .cmp(&(b.artist.to_lowercase(), b.album.to_lowercase(), b.title.to_lowercase()))
    });

    let header = format!("{:<32} {:<24} {:<24} {:>8}", "Title", "Artist", "Album", "Time");
    println!("{}", header.bold());
    for record in records {
        println!(
            "{:<32} {:<24} {:<24} {:>8}",
            truncate(&record.title, 32),
            truncate(&record.artist, 24),
            truncate(&record.album, 24),
            record.duration_string()
        );
    }
    println!("{} tracks", repository.len());
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

/// Closest candidate to `query`: exact (case-insensitive) match first, then
/// the best fuzzy score
pub fn best_match(query: &str, candidates: &[String]) -> Option<String> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }

    if let Some(exact) = candidates.iter().find(|c| c.eq_ignore_ascii_case(query)) {
        return Some(exact.clone());
    }

    // ClangdMatcher parameter order is fuzzy_match(choice, pattern)
    let matcher = ClangdMatcher::default();
    candidates
        .iter()
        .filter_map(|candidate| matcher.fuzzy_match(candidate, query).map(|score| (score, candidate)))
        .max_by_key(|(score, _)| *score)
        .map(|(_, candidate)| candidate.clone())
}

/// Line-based prompts over any reader/writer pair
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Prints `question` and returns the trimmed answer
    pub fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{} ", question)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            bail!("Input closed");
        }
        Ok(line.trim().to_string())
    }

    /// y/n question; anything other than y/yes/s/si counts as no
    pub fn confirm(&mut self, question: &str) -> Result<bool> {
        let answer = self.ask(&format!("{} (y/n)", question))?;
        Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes" | "s" | "si"))
    }

    /// Asks how to build the playlist. Returns `None` when the user backs out
    /// or nothing in the library matches.
    pub fn choose_policy(&mut self, repository: &Repository) -> Result<Option<PlaylistPolicy>> {
        let albums = library::distinct_albums(repository);
        let artists = library::distinct_artists(repository);

        // Nothing to choose between
        if albums.len() <= 1 && artists.len() <= 1 {
            return Ok(Some(PlaylistPolicy::Random));
        }

        let choice = self.ask("Play [r]andom, by [a]lbum or by ar[t]ist?")?;
        match choice.to_lowercase().as_str() {
            "" | "r" | "random" => Ok(Some(PlaylistPolicy::Random)),
            "a" | "album" => Ok(self.pick("Album", &albums)?.map(PlaylistPolicy::Album)),
            "t" | "artist" => Ok(self.pick("Artist", &artists)?.map(PlaylistPolicy::Artist)),
            other => {
                writeln!(self.output, "Unknown choice '{}'", other)?;
                Ok(None)
            }
        }
    }

    fn pick(&mut self, kind: &str, candidates: &[String]) -> Result<Option<String>> {
        writeln!(self.output, "{}s: {}", kind, candidates.join(", "))?;
        let query = self.ask(&format!("{}:", kind))?;

        let picked = best_match(&query, candidates);
        match &picked {
            Some(name) => writeln!(self.output, "→ {}", name)?,
            None => writeln!(self.output, "No {} matches '{}'", kind.to_lowercase(), query)?,
        }
        Ok(picked)
    }
}

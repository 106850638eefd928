// ZKA Player - Terminal Shuffle Player
// Add a folder, look at the library, pick how to shuffle, listen

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use zka_player::{
    audio::{AudioConfig, PlaybackController, RodioEngine},
    input::KeyboardReader,
    library::RepositoryStore,
    ui::{self, Prompter, StatusLine},
    Config, LibraryError, PlaybackState,
};

#[derive(Parser)]
#[command(name = "zka-player")]
#[command(about = "Scan your music folders and shuffle them from the terminal")]
struct Args {
    /// Enable developer logging (stderr + debug output)
    #[arg(long)]
    dev: bool,

    /// Use this config file instead of the default location
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn init_logging(log_dir: &Path, dev: bool) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    // Daily rotating file appender
    let file_appender = tracing_appender::rolling::daily(log_dir, "zka-player.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,zka_player=debug"));

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_target(true)
        .with_level(true)
        .with_ansi(false);

    // Dev mode also logs to stderr
    let stderr_layer = dev.then(|| fmt::layer().with_writer(std::io::stderr).with_target(true));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()?;

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let _log_guard = init_logging(&config.log_dir, args.dev)?;
    info!("🎧 ZKA Player starting up");

    // ALSA likes to chat on stderr; keep it off the status line unless debugging
    #[cfg(unix)]
    {
        if !args.dev {
            if let Err(e) = redirect_stderr_to_null() {
                warn!("Could not silence stderr: {}", e);
            }
        }
    }

    ui::print_banner();

    let store = RepositoryStore::new(&config.repository_path);
    let mut repository = match store.load().await {
        Ok(repository) => repository,
        Err(e) => {
            eprintln!("⚠️  {}", e);
            println!("⚠️  Could not read your library, starting from an empty one.");
            store.load_or_empty().await
        }
    };

    let mut prompter = Prompter::stdio();

    if prompter.confirm("Add songs from a folder?")? {
        let suggested = config.music_directories.first().cloned();
        let question = match &suggested {
            Some(dir) => format!("Path to your music [{}]:", dir.display()),
            None => "Path to your music:".to_string(),
        };

        let answer = prompter.ask(&question)?;
        let root = if answer.is_empty() {
            suggested.unwrap_or_default()
        } else {
            PathBuf::from(answer)
        };

        println!("📁 Scanning {}...", root.display());
        match store.update(&root).await {
            Ok(summary) if summary.added > 0 => {
                println!("✅ Added {} new tracks ({} audio files found)", summary.added, summary.scanned);
            }
            Ok(summary) => {
                println!("Nothing new - all {} audio files were already in your library", summary.scanned);
            }
            Err(LibraryError::NotFound(path)) => {
                println!("❌ {} is not a folder", path.display());
            }
            Err(e) => {
                error!("Library update failed: {}", e);
                println!("❌ Library update failed: {}", e);
            }
        }

        repository = store.load_or_empty().await;
    }

    ui::print_library(&repository);

    if repository.is_empty() || !prompter.confirm("Play your songs?")? {
        println!("👋 Bye!");
        return Ok(());
    }

    let Some(policy) = prompter.choose_policy(&repository)? else {
        println!("👋 Bye!");
        return Ok(());
    };

    let playlist = policy.build(&repository);
    if playlist.is_empty() {
        println!("No tracks for {}", policy.describe());
        return Ok(());
    }

    // The key reader takes over the terminal from here
    drop(prompter);

    let audio_config = AudioConfig::from(&config);
    let poll_interval = audio_config.poll_interval;
    let engine = match RodioEngine::new(audio_config) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Audio output unavailable: {}", e);
            println!("❌ {}", e);
            return Ok(());
        }
    };

    println!("\n🎶 Playing {} tracks ({})", playlist.len(), policy.describe());

    let mut controller = PlaybackController::new(engine, poll_interval);
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    controller.set_event_sender(event_tx);

    let total = playlist.len();
    let status_task = tokio::spawn(async move {
        let mut status = StatusLine::stdout(total);
        let _ = status.show_controls();
        while let Some(event) = event_rx.recv().await {
            if let Err(e) = status.handle(&event) {
                debug!("Status line write failed: {}", e);
            }
        }
    });

    let outcome = controller.run(playlist, Box::new(KeyboardReader::new())).await;

    // Dropping the controller closes the event channel
    drop(controller);
    let _ = status_task.await;

    match outcome {
        PlaybackState::Stopped => info!("Playback quit by user"),
        _ => info!("Playlist finished"),
    }

    println!("👋 Thanks for listening!");
    Ok(())
}

#[cfg(unix)]
fn redirect_stderr_to_null() -> Result<()> {
    unsafe {
        let null_fd = libc::open(b"/dev/null\0".as_ptr() as *const libc::c_char, libc::O_WRONLY);

        if null_fd == -1 {
            return Err(anyhow::anyhow!("Failed to open /dev/null"));
        }

        if libc::dup2(null_fd, libc::STDERR_FILENO) == -1 {
            libc::close(null_fd);
            return Err(anyhow::anyhow!("Failed to redirect stderr"));
        }

        libc::close(null_fd);
    }

    Ok(())
}

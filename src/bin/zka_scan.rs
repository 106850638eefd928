// Non-interactive library update: scan a folder into the repository and report

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use zka_player::{library::RepositoryStore, ui, Config};

#[derive(Parser)]
#[command(name = "zka-scan")]
#[command(about = "Add every audio file under a folder to the ZKA Player library")]
struct Args {
    /// Folder to scan (recursively)
    path: PathBuf,

    /// Use this config file instead of the default location
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the whole library after updating
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let store = RepositoryStore::new(&config.repository_path);
    println!("📁 Scanning {}", args.path.display());

    let summary = store.update(&args.path).await?;
    println!("🎵 Found {} audio files", summary.scanned);
    println!("✅ Added {} new tracks", summary.added);
    if summary.written {
        println!("💾 Library saved to {}", store.path().display());
    }

    if args.list {
        let repository = store.load().await?;
        ui::print_library(&repository);
    }

    Ok(())
}

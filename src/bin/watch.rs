//! Import the library roots once, then keep importing new books as they appear.

use anyhow::Result;
use bookworm::watch::run_watcher;
use bookworm::{Config, DirectoryImporter, SqliteStore};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "watch")]
#[command(about = "Watch library directories and import new books automatically")]
struct Args {
    /// Directories to watch (defaults to library.directories)
    directories: Vec<PathBuf>,

    /// Debounce delay in milliseconds before importing a changed file
    #[arg(long)]
    debounce_ms: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load()?;

    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or("RUST_LOG", config.library.log_level.as_str()),
    )
    .init();

    let roots = if args.directories.is_empty() {
        config.library.directories.clone()
    } else {
        args.directories
    };
    if roots.is_empty() {
        anyhow::bail!("No directories to watch. Pass them as arguments or set library.directories in config.toml.");
    }
    let debounce_ms = args.debounce_ms.unwrap_or(config.import.watch_debounce_ms);

    log::info!("Starting Bookworm watcher");
    log::info!("Database path: {}", config.db_path().display());
    log::info!("Debounce: {} ms", debounce_ms);

    let store = SqliteStore::open(config.db_path())?;
    let mut importer = DirectoryImporter::with_walk_options(store, config.import.walk_options());

    for root in &roots {
        importer.import_directory(root)?;
    }

    log::info!("Watching for new books (Ctrl+C to stop)");
    run_watcher(&mut importer, roots, debounce_ms)?;
    Ok(())
}

use anyhow::{Context, Result};
use bookworm::{BookStore, Config, DirectoryImporter, ImportSummary, MemoryStore, SqliteStore};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "bookworm")]
#[command(about = "Import FB2 book metadata into a local library")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import books found under the given directories (or the configured ones)
    Import {
        directories: Vec<PathBuf>,

        /// Extract metadata and print it without touching the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Create or upgrade the database schema
    Syncdb,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", config.library.log_level.as_str())
    ).init();

    match cli.command {
        Command::Import { directories, dry_run } => {
            let directories = if directories.is_empty() {
                config.library.directories.clone()
            } else {
                directories
            };
            if directories.is_empty() {
                anyhow::bail!("No directories to import. Pass them as arguments or set library.directories in config.toml.");
            }
            run_timed(|| import(&config, &directories, dry_run))
        }
        Command::Syncdb => {
            SqliteStore::open(config.db_path())
                .with_context(|| format!("Failed to open {}", config.db_path().display()))?;
            log::info!("Database ready at {}", config.db_path().display());
            Ok(())
        }
    }
}

/// Report how long `f` ran, whether it finished or failed
fn run_timed(f: impl FnOnce() -> Result<()>) -> Result<()> {
    let start = Instant::now();
    match f() {
        Ok(()) => {
            log::info!("Finished. It took {:?}", start.elapsed());
            Ok(())
        }
        Err(e) => {
            log::error!("Unhandled error. Worked for {:?}", start.elapsed());
            Err(e)
        }
    }
}

fn import(config: &Config, directories: &[PathBuf], dry_run: bool) -> Result<()> {
    let walk_options = config.import.walk_options();

    if dry_run {
        let mut importer = DirectoryImporter::with_walk_options(MemoryStore::new(), walk_options);
        let summary = import_all(&mut importer, directories)?;
        for book in importer.store().books() {
            println!("{}\t{}", book.path, book);
        }
        log_summary(&summary);
        return Ok(());
    }

    log::info!("Database path: {}", config.db_path().display());
    let store = SqliteStore::open(config.db_path())
        .with_context(|| format!("Failed to open {}", config.db_path().display()))?;
    let mut importer = DirectoryImporter::with_walk_options(store, walk_options);
    let summary = import_all(&mut importer, directories)?;
    log_summary(&summary);
    Ok(())
}

fn import_all<S: BookStore>(
    importer: &mut DirectoryImporter<S>,
    directories: &[PathBuf],
) -> Result<ImportSummary> {
    let mut total = ImportSummary::default();
    for directory in directories {
        log::info!("Importing {}", directory.display());
        total += importer
            .import_directory(directory)
            .with_context(|| format!("Import of {} aborted", directory.display()))?;
    }
    Ok(total)
}

fn log_summary(summary: &ImportSummary) {
    log::info!("=== Import Complete ===");
    log::info!("Files seen: {}", summary.total());
    log::info!("  Imported: {}", summary.imported);
    log::info!("  Already imported (skipped): {}", summary.already_imported);
    log::info!("  Unsupported (skipped): {}", summary.unsupported);
}

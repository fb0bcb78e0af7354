use bookworm::{config::Config, SqliteStore};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "stats")]
#[command(about = "Show what the library database holds")]
struct Args {
    /// Print the counts as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = Config::load()?;

    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or("RUST_LOG", config.library.log_level.as_str()),
    )
    .init();

    let store = SqliteStore::open(config.db_path())?;

    let books = store.count_books()?;
    let authors = store.count_authors()?;
    let genres = store.count_genres()?;

    if args.json {
        let stats = serde_json::json!({
            "db_path": config.db_path().display().to_string(),
            "books": books,
            "authors": authors,
            "genres": genres,
        });
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("\n=== Bookworm Library Statistics ===\n");
    println!("Database: {}", config.db_path().display());
    println!("Books:    {}", books);
    println!("Authors:  {}", authors);
    println!("Genres:   {}", genres);

    if books == 0 {
        println!("\nNo books yet. Run `bookworm import <DIR>` to fill the library.");
    }

    Ok(())
}

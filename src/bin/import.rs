use clap::Parser;
use ownreg::Config;
use ownreg::db::{Db, migrate};
use ownreg::import::{import_document, ImportDocument};
use std::path::{Path, PathBuf};
use std::time::Instant;
use anyhow::{Context, Result};

#[derive(Parser, Debug)]
#[command(name = "import")]
#[command(about = "Import entities and ownership relationships into the register")]
struct Args {
    /// JSON import documents, applied in order
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load()?;

    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", &config.register.log_level)
    ).init();

    let db = Db::new(config.db_path());
    let migrations_dir = Path::new("migrations");
    db.with_connection(|conn| {
        migrate::run_migrations(conn, migrations_dir)
    }).await?;

    let start = Instant::now();
    let (mut entities, mut relationships, mut skipped) = (0, 0, 0);

    for (idx, file) in args.files.iter().enumerate() {
        log::info!("[{}/{}] Importing {}", idx + 1, args.files.len(), file.display());

        let doc = ImportDocument::from_path(file)
            .with_context(|| format!("Failed to read import document {}", file.display()))?;
        let summary = db.with_connection(move |conn| import_document(conn, &doc)).await?;

        entities += summary.entities;
        relationships += summary.relationships;
        skipped += summary.skipped;
    }

    println!("\n=== Import Complete ===");
    println!("Files:         {}", args.files.len());
    println!("Entities:      {}", entities);
    println!("Relationships: {}", relationships);
    println!("Skipped:       {}", skipped);
    println!("Time:          {:?}", start.elapsed());

    Ok(())
}

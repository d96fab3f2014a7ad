use ownreg::Config;
use ownreg::db::{Db, migrate};
use ownreg::error::OwnregError;
use std::path::Path;
use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;

    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", &config.register.log_level)
    ).init();

    log::info!("Starting Ownreg v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Database path: {}", config.db_path().display());
    log::info!("Chain result limit: {}", config.traversal.max_results);

    let db = Db::new(config.db_path());

    let migrations_dir = Path::new("migrations");
    db.with_connection(|conn| {
        migrate::run_migrations(conn, migrations_dir)
    }).await?;

    log::info!("Database initialized successfully");

    verify_database_schema(&db).await?;

    Ok(())
}

/// Verify that all expected database objects exist
async fn verify_database_schema(db: &Db) -> Result<()> {
    db.with_connection(|conn| {
        let mut stmt =
            conn.prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")?;
        let tables: Vec<String> = stmt.query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

        for table in ["entities", "relationships", "schema_migrations"] {
            if !tables.iter().any(|t| t == table) {
                return Err(OwnregError::Config(format!("Missing table: {}", table)));
            }
            log::debug!("✓ Table exists: {}", table);
        }

        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master WHERE type='index' AND name='idx_relationships_target'"
        )?;
        if !stmt.exists([])? {
            // without it every chain query scans the whole relationships table
            log::warn!("Index idx_relationships_target not found");
        }

        let journal_mode: String = conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?;
        if journal_mode.to_uppercase() != "WAL" {
            return Err(OwnregError::Config(format!("Journal mode is not WAL: {}", journal_mode)));
        }

        let foreign_keys: i32 = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
        if foreign_keys != 1 {
            return Err(OwnregError::Config("Foreign keys not enabled".to_string()));
        }

        let integrity: String = conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        if integrity != "ok" {
            return Err(OwnregError::Config(format!("Database integrity check failed: {}", integrity)));
        }

        let (entities, relationships): (i64, i64) = conn.query_row(
            "SELECT (SELECT COUNT(*) FROM entities), (SELECT COUNT(*) FROM relationships)",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        log::info!("Register holds {} entities and {} relationships", entities, relationships);

        Ok(())
    }).await?;

    log::info!("✓ Database schema verification complete");
    Ok(())
}

use clap::{Parser, Subcommand};
use ownreg::db::Db;
use ownreg::graph::{ChainRelationship, PathFinder, SqliteGraphStore};
use ownreg::{Config, EntityId, OwnregError};
use std::time::Instant;
use anyhow::Result;

#[derive(Parser, Debug)]
#[command(name = "chains")]
#[command(about = "Query ownership chains in the register")]
struct Args {
    /// Print chains as JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Chains from ENTITY up to every owner that has no owner itself
    Ultimate {
        entity: String,
    },
    /// Every ownership path from START up to TARGET
    Paths {
        start: String,
        target: String,
    },
}

/// Look up an entity's display name, failing on unknown ids.
fn entity_name(store: &SqliteGraphStore, id: &EntityId) -> ownreg::Result<String> {
    store
        .entity(id)?
        .map(|e| e.name)
        .ok_or_else(|| OwnregError::EntityNotFound(id.to_string()))
}

fn run_query(
    db: Db,
    command: Command,
    max_results: usize,
) -> ownreg::Result<Vec<ChainRelationship>> {
    let store = SqliteGraphStore::open(&db)?;
    log::debug!("Register holds {} relationships", store.relationship_count()?);
    match command {
        Command::Ultimate { entity } => {
            let start = EntityId::new(entity);
            log::info!("Ultimate sources of {} ({})", start, entity_name(&store, &start)?);
            PathFinder::new(store)
                .with_max_results(max_results)
                .find_ultimate_sources(&start)
        }
        Command::Paths { start, target } => {
            let (start, target) = (EntityId::new(start), EntityId::new(target));
            log::info!(
                "Paths from {} ({}) to {} ({})",
                start,
                entity_name(&store, &start)?,
                target,
                entity_name(&store, &target)?
            );
            PathFinder::new(store)
                .with_max_results(max_results)
                .find_paths_to(&start, &target)
        }
    }
}

fn print_chain(rank: usize, chain: &ChainRelationship) {
    println!("─────────────────────────────────────────────────────────────────────────────");
    println!(
        "#{}: {} owns {} ({} hop{})",
        rank,
        chain.source(),
        chain.target(),
        chain.edge_count(),
        if chain.edge_count() == 1 { "" } else { "s" }
    );
    if !chain.intermediate_entities().is_empty() {
        let via: Vec<_> = chain.intermediate_entities().iter().map(|e| e.as_str()).collect();
        println!("Via: {}", via.join(" <- "));
    }
    for rel in chain.intermediate_relationships() {
        let since = rel.started_date.as_deref().unwrap_or("?");
        let until = rel.ended_date.as_deref().unwrap_or("");
        println!("  {} -> {}  [{}] {}..{}", rel.source, rel.target, rel.id, since, until);
    }
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
    let max_results = config.traversal.max_results;
    let command = args.command;

    let start = Instant::now();
    let chains = tokio::task::spawn_blocking(move || run_query(db, command, max_results)).await??;
    let duration = start.elapsed();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&chains)?);
        return Ok(());
    }

    if chains.is_empty() {
        println!("No ownership chains found.");
    } else {
        for (idx, chain) in chains.iter().enumerate() {
            print_chain(idx + 1, chain);
        }
        println!("─────────────────────────────────────────────────────────────────────────────");
    }
    println!("Chains: {}", chains.len());
    println!("Latency: {:?}", duration);

    Ok(())
}

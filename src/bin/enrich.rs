use clap::Parser;
use ownreg::clients::OpencorporatesClient;
use ownreg::db::Db;
use ownreg::import::update_entity_name;
use ownreg::{Config, EntityId, OwnregError};
use anyhow::Result;

#[derive(Parser, Debug)]
#[command(name = "enrich")]
#[command(about = "Refresh a company's name in the register from OpenCorporates")]
struct Args {
    /// OpenCorporates jurisdiction code, e.g. `gb`, or a jurisdiction name
    /// with `--match-jurisdiction`
    jurisdiction: String,

    /// Company number within the jurisdiction
    company_number: String,

    /// Fall back to a company-number search when the exact lookup fails
    #[arg(short, long)]
    search: bool,

    /// Resolve JURISDICTION as a free-text name, e.g. "United Kingdom"
    #[arg(short, long)]
    match_jurisdiction: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load()?;

    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", &config.register.log_level)
    ).init();

    let client = OpencorporatesClient::with_base_url(
        config.opencorporates_token()?,
        &config.opencorporates.api_url,
        &config.opencorporates.api_version,
        config.opencorporates_timeout(),
    )?;

    let jurisdiction_code = if args.match_jurisdiction {
        match client.get_jurisdiction_code(&args.jurisdiction).await? {
            Some(code) => {
                log::info!("Matched jurisdiction \"{}\" to {}", args.jurisdiction, code);
                code
            }
            None => {
                println!("OpenCorporates has no jurisdiction matching \"{}\"", args.jurisdiction);
                return Ok(());
            }
        }
    } else {
        args.jurisdiction.trim().to_lowercase()
    };

    let mut company = client
        .get_company(&jurisdiction_code, &args.company_number, true)
        .await?;
    if company.is_none() && args.search {
        log::info!(
            "Exact lookup failed, searching {} for {}",
            jurisdiction_code,
            args.company_number
        );
        company = client
            .search_companies(&jurisdiction_code, &args.company_number)
            .await?
            .into_iter()
            .next();
    }

    let Some(company) = company else {
        println!(
            "OpenCorporates has no company {}/{}",
            jurisdiction_code, args.company_number
        );
        return Ok(());
    };

    let id = EntityId::for_company(&jurisdiction_code, &args.company_number);
    let db = Db::new(config.db_path());
    let (id_for_update, name) = (id.clone(), company.name.clone());
    let updated = db
        .with_connection(move |conn| update_entity_name(conn, &id_for_update, &name))
        .await?;

    if !updated {
        return Err(OwnregError::EntityNotFound(id.to_string()).into());
    }

    println!("{} is now \"{}\"", id, company.name);
    if let Some(status) = company.current_status {
        println!("Status: {}", status);
    }
    Ok(())
}

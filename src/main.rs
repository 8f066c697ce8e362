use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ordervox::catalog::{self, CatalogEntry, CatalogIndex, CatalogSource, Embedder, VecCatalogIndex};
use ordervox::{Config, Daemon};

/// Ordervox - voice order intake for building-materials merchants
#[derive(Parser)]
#[command(name = "ordervox", version, about)]
struct Cli {
    /// Path to config file (default: ~/.config/ordervox/config.toml)
    #[arg(short, long, env = "ORDERVOX_CONFIG")]
    config: Option<PathBuf>,

    /// Raise log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the order intake service (default)
    Serve,
    /// Load catalog entries from a JSON file into the index
    Seed {
        /// Path to a JSON array of catalog entries
        file: PathBuf,
    },
    /// Pull the upstream catalog and re-index it once
    Sync,
    /// Query the catalog index from the command line
    Search {
        /// Free text to match against product names
        query: String,
        /// Number of results
        #[arg(short = 'k', long, default_value = "5")]
        top_k: usize,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,ordervox=info",
        1 => "info,ordervox=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "exiting");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load_with_options(cli.config.as_deref())?;
    tracing::debug!(?config, "configuration resolved");

    match cli.command {
        None | Some(Command::Serve) => serve(config).await,
        Some(Command::Seed { file }) => seed(&config, &file).await,
        Some(Command::Sync) => sync(&config).await,
        Some(Command::Search { query, top_k }) => search(&config, &query, top_k).await,
    }
}

/// Run the daemon until interrupted
async fn serve(config: Config) -> anyhow::Result<()> {
    tracing::info!(port = config.port, "starting ordervox");

    let daemon = Daemon::new(config)?;
    daemon.run().await?;

    Ok(())
}

/// Open the configured catalog database with an embedder attached
fn open_index(config: &Config) -> anyhow::Result<VecCatalogIndex> {
    let api_key = config.require_api_key()?;
    let pool = catalog::init(config.db_path())?;
    let embedder = Embedder::new(
        &api_key,
        &config.openai.embed_model,
        &config.openai.base_url,
        config.openai.timeout,
    )?;
    Ok(VecCatalogIndex::new(pool, embedder))
}

/// Load catalog entries from a JSON file into the index
async fn seed(config: &Config, file: &Path) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(file)?;
    let entries: Vec<CatalogEntry> = serde_json::from_str(&raw)?;

    let index = open_index(config)?;
    let written = index.upsert(&entries).await?;

    println!("Indexed {written} catalog entries from {}", file.display());
    Ok(())
}

/// Pull the upstream catalog and re-index it once
async fn sync(config: &Config) -> anyhow::Result<()> {
    let Some(ref sync_config) = config.sync else {
        anyhow::bail!("ORDERVOX_CATALOG_URL is not configured");
    };

    let source = CatalogSource::new(&sync_config.catalog_url, config.openai.timeout)?;
    let index = open_index(config)?;
    let synced = catalog::sync::sync_once(&source, &index).await?;

    println!("Synced {synced} catalog entries");
    Ok(())
}

/// Query the catalog index from the command line
async fn search(config: &Config, query: &str, top_k: usize) -> anyhow::Result<()> {
    let index = open_index(config)?;
    let results = index.search(query, top_k).await?;

    if results.is_empty() {
        println!("No matches");
        return Ok(());
    }

    for result in results {
        println!(
            "{:.4}  [{}] {} - {} per {}",
            result.distance, result.entry.id, result.entry.name, result.entry.price, result.entry.unit
        );
    }
    Ok(())
}

mod run;
mod warehouses;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "whsnap")]
#[command(about = "Warehouse catalog snapshots with change tracking")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch, enrich and snapshot one warehouse's catalog
    Run {
        /// Warehouse id from the catalog file
        #[arg(long)]
        warehouse: String,
    },
    /// List warehouses in the catalog file
    Warehouses {
        /// Case-insensitive name or id filter
        #[arg(long)]
        search: Option<String>,
    },
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = whsnap_core::load_app_config_from_env()?;
    init_tracing(&config.log_level);

    match cli.command {
        Commands::Run { warehouse } => run::run_warehouse(&config, &warehouse).await,
        Commands::Warehouses { search } => warehouses::list(&config, search.as_deref()),
    }
}

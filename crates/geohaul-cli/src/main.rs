mod commands;
mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "geohaul",
    version,
    about = "Bulk extractor for row-capped spatial service catalogs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract every queryable layer under the configured endpoint
    Run {
        /// Path to job YAML file
        job: PathBuf,
    },
    /// Resolve the catalog and list its queryable layers without fetching
    Discover {
        /// Path to job YAML file
        job: PathBuf,
    },
    /// Validate configuration, credentials, and endpoint reachability
    Check {
        /// Path to job YAML file
        job: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init(&cli.log_level);

    match cli.command {
        Commands::Run { job } => commands::run::execute(&job).await,
        Commands::Discover { job } => commands::discover::execute(&job).await,
        Commands::Check { job } => commands::check::execute(&job).await,
    }
}

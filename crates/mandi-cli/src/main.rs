mod market;
mod weather;

use clap::{Parser, Subcommand};
use mandi_core::AppConfig;
use tracing_subscriber::EnvFilter;

use crate::market::FilterArgs;

#[derive(Debug, Parser)]
#[command(name = "mandi-cli")]
#[command(about = "Mandi prices and farm weather from the command line")]
struct Cli {
    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List price records for the given filters
    Prices(FilterArgs),
    /// Show the district, market, and commodity choices under the filters
    Options(FilterArgs),
    /// Show the modal-price trend (oldest first, newest 20 points)
    Trend(FilterArgs),
    /// Summarize prices in one short paragraph
    Insight(FilterArgs),
    /// List Indian states and union territories
    States,
    /// Current conditions and 7-day forecast at a location
    Weather {
        /// Latitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Longitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    run(Cli::parse(), load_config).await
}

/// Dispatches a parsed command. `load` is called only by commands that reach
/// an upstream API, so a bad `MANDI_*` value never breaks `states`.
async fn run(cli: Cli, load: impl Fn() -> anyhow::Result<AppConfig>) -> anyhow::Result<()> {
    let json = cli.json;
    let Some(command) = cli.command else {
        println!("mandi-cli: run with --help to see commands");
        return Ok(());
    };

    match command {
        Commands::Prices(args) => market::run_prices(&load()?, &args, json).await,
        Commands::Options(args) => market::run_options(&load()?, &args, json).await,
        Commands::Trend(args) => market::run_trend(&load()?, &args, json).await,
        Commands::Insight(args) => market::run_insight(&load()?, &args, json).await,
        Commands::States => market::run_states(json),
        Commands::Weather { lat, lon } => weather::run_weather(&load()?, lat, lon, json).await,
    }
}

/// Loads configuration and starts logging at its level.
fn load_config() -> anyhow::Result<AppConfig> {
    let config = mandi_core::load_app_config_from_env()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(config)
}

#[cfg(test)]
mod tests;

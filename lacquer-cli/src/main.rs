//! lacquer CLI - marketplace backend for nail-care supplies
//!
//! This is the main entry point for the lacquer command-line tool, which provides:
//! - HTTP API server for the marketplace (`serve` subcommand)
//! - Schema migrations (`migrate` subcommand)
//! - Catalog seeding with the default category tree (`seed` subcommand)
//! - Denormalized counter verification and repair (`recount` subcommand)
//! - Configuration management (`config` subcommand)

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "lacquer",
    author,
    version,
    about = "Marketplace backend for nail-care products",
    long_about = "Run the lacquer marketplace API and its maintenance tooling. The server keeps \
                  cart totals, favorite counts, and seller reputations in step with their source \
                  rows; `recount` verifies and repairs them offline."
)]
struct Cli {
    /// Enable debug logging (equivalent to RUST_LOG=debug)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Create or update the database schema
    Migrate(commands::migrate::MigrateArgs),
    /// Seed the catalog with the default categories
    Seed(commands::seed::SeedArgs),
    /// Verify and repair denormalized counters
    Recount(commands::recount::RecountArgs),
    /// Manage lacquer configuration (init, show, path)
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_setup::init(&tracing_setup::TracingConfig { debug: cli.debug })?;

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args).await,
        Commands::Migrate(args) => commands::run_migrate(args).await,
        Commands::Seed(args) => commands::run_seed(args).await,
        Commands::Recount(args) => commands::run_recount(args).await,
        Commands::Config(args) => config::run_config(args),
    }
}

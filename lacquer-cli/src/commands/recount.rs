//! Counter verification and repair command
//!
//! Recomputes every denormalized column (product favorite counts, cart
//! totals, reputation tallies and averages) from its source rows and
//! rewrites the ones that drifted. Safe to run while the server is up;
//! each statement only touches rows whose stored value is wrong.

use anyhow::{Context, Result};
use clap::Parser;

use lacquer_server::db::{counters, create_pool};

/// Arguments for the recount command
#[derive(Parser, Debug)]
pub struct RecountArgs {
    /// Database URL (overrides config/environment)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

/// Verify and repair the denormalized counters
pub async fn run_recount(args: RecountArgs) -> Result<()> {
    let database_url = super::resolve_database_url(args.database_url)?;

    let pool = create_pool(&database_url)
        .await
        .context("Failed to create database pool")?;

    let report = counters::recount_all(&pool)
        .await
        .context("Recount failed")?;

    println!("Favorite counts corrected:    {}", report.products_corrected);
    println!("Cart totals corrected:        {}", report.carts_corrected);
    println!("Reputation tallies corrected: {}", report.reputation_counts_corrected);
    println!("Reputation averages corrected:{}", report.reputation_averages_corrected);

    if report.total() == 0 {
        println!("✅ All counters already consistent");
    } else {
        println!("✅ Repaired {} drifted rows", report.total());
    }

    Ok(())
}

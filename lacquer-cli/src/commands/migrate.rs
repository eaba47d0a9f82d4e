//! Schema migration command
//!
//! Applies the idempotent CREATE TABLE IF NOT EXISTS migrations so the
//! server can be pointed at a fresh database.

use anyhow::{Context, Result};
use clap::Parser;

use lacquer_server::db::{create_pool, migrations};

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    /// Database URL (overrides config/environment)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

/// Apply schema migrations
pub async fn run_migrate(args: MigrateArgs) -> Result<()> {
    let database_url = super::resolve_database_url(args.database_url)?;

    let pool = create_pool(&database_url)
        .await
        .context("Failed to create database pool")?;

    migrations::run(&pool)
        .await
        .context("Failed to apply schema migrations")?;

    println!("✅ Schema is up to date");

    Ok(())
}

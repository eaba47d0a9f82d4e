//! HTTP server command for the lacquer marketplace API
//!
//! Runs the full route surface: users, catalog, carts, favorites,
//! exchanges, and reviews.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;

use lacquer_server::db::{create_pool_with_options, migrations};
use lacquer_server::http::{run_server, ServerConfig};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (default: 127.0.0.1:3030)
    #[arg(long, short = 'b', default_value = "127.0.0.1:3030")]
    pub bind: SocketAddr,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Database URL (overrides config/environment)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Maximum database pool connections
    #[arg(long)]
    pub max_connections: Option<u32>,

    /// Skip the schema check on startup
    #[arg(long)]
    pub no_migrate: bool,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let config_file = lacquer_core::LacquerConfig::load().ok();

    let database_url = super::resolve_database_url(args.database_url)?;
    let max_connections = args
        .max_connections
        .or_else(|| config_file.as_ref().map(|c| c.database.max_connections))
        .unwrap_or(5);

    tracing::info!("Starting lacquer server on {}", args.bind);

    let pool = create_pool_with_options(&database_url, max_connections)
        .await
        .context("Failed to create database pool")?;

    if !args.no_migrate {
        migrations::run(&pool)
            .await
            .context("Failed to apply schema migrations")?;
    }

    let config = ServerConfig {
        bind_addr: args.bind,
        cors_permissive: args.cors_permissive
            || config_file.as_ref().is_some_and(|c| c.server.cors_permissive),
    };

    // Blocks until shutdown
    run_server(pool, config).await.context("Server error")?;

    Ok(())
}

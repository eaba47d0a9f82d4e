//! Command implementations for the lacquer CLI

use anyhow::{Context, Result};
use lacquer_core::LacquerConfig;

pub mod migrate;
pub mod recount;
pub mod seed;
pub mod serve;

// Re-export main dispatcher functions for flat access from main.rs
pub use migrate::run_migrate;
pub use recount::run_recount;
pub use seed::run_seed;
pub use serve::run_serve;

/// Resolve the database URL: flag, then DATABASE_URL, then the config file.
pub fn resolve_database_url(flag: Option<String>) -> Result<String> {
    if let Some(url) = flag {
        return Ok(url);
    }
    if let Ok(url) = std::env::var("DATABASE_URL") {
        return Ok(url);
    }
    LacquerConfig::load()
        .ok()
        .and_then(|config| config.database_url())
        .context(
            "DATABASE_URL not set. Set via --database-url, the DATABASE_URL env var, \
             or database.url in the config file (lacquer config init)",
        )
}

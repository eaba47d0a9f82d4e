//! Configuration loading for the lacquer tools
//!
//! Lives at ~/.lacquer/config.toml. CLI flags and environment variables
//! always win over file values; the file is a convenience for local setups.

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// ${VAR} references inside config values
static VAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("invalid var regex"));

/// Top-level configuration for the lacquer ecosystem
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LacquerConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub database: DatabaseSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    /// Address the HTTP server binds to
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// Allow permissive CORS (all origins)
    #[serde(default)]
    pub cors_permissive: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            cors_permissive: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSection {
    /// PostgreSQL connection string; may reference env vars as ${VAR}
    pub url: Option<String>,

    /// Maximum pool connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3030))
}

fn default_max_connections() -> u32 {
    5
}

impl LacquerConfig {
    /// Load config from ~/.lacquer/config.toml
    ///
    /// Fails hard with an actionable error if the config doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("Config not found at {:?}\n\nRun: lacquer config init", path);
        }

        let content = fs::read_to_string(path)
            .context(format!("Failed to read config file: {:?}", path))?;

        let config: Self =
            toml::from_str(&content).context("Failed to parse config file (invalid TOML)")?;

        Ok(config)
    }

    /// Get config file path: ~/.lacquer/config.toml
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".lacquer/config.toml")
    }

    /// Database URL with ${VAR} references expanded from the environment.
    pub fn database_url(&self) -> Option<String> {
        self.database.url.as_deref().map(expand_vars)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save config to an explicit path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let toml_str =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(path, toml_str).context(format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }
}

/// Expand ${VAR} references against the process environment.
///
/// Unset variables expand to the empty string.
fn expand_vars(s: &str) -> String {
    VAR_RE
        .replace_all(s, |caps: &regex::Captures<'_>| {
            env::var(&caps[1]).unwrap_or_default()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = LacquerConfig::default();
        config.database.url = Some("postgres://localhost/lacquer".into());
        config.database.max_connections = 8;
        config.save_to(&path).unwrap();

        let loaded = LacquerConfig::load_from(&path).unwrap();
        assert_eq!(
            loaded.database.url.as_deref(),
            Some("postgres://localhost/lacquer")
        );
        assert_eq!(loaded.database.max_connections, 8);
        assert_eq!(loaded.server.bind_addr, default_bind_addr());
    }

    #[test]
    fn missing_config_is_actionable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope.toml");

        let err = LacquerConfig::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("lacquer config init"));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[database]\nurl = \"postgres://db/x\"\n").unwrap();

        let loaded = LacquerConfig::load_from(&path).unwrap();
        assert_eq!(loaded.database.max_connections, 5);
        assert!(!loaded.server.cors_permissive);
    }

    #[test]
    fn expands_env_references() {
        env::set_var("LACQUER_TEST_DB_HOST", "db.internal");
        let mut config = LacquerConfig::default();
        config.database.url = Some("postgres://${LACQUER_TEST_DB_HOST}/lacquer".into());

        assert_eq!(
            config.database_url().as_deref(),
            Some("postgres://db.internal/lacquer")
        );
        env::remove_var("LACQUER_TEST_DB_HOST");
    }
}

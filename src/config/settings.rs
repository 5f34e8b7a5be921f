//! Application settings.
//!
//! Settings come from an optional TOML file (`config.toml` by default, or the path
//! in `FINANCE_CONFIG`). The `DATABASE_URL` environment variable overrides the
//! file so deployments can point at a different database without editing it.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

/// Default database location when neither the file nor the environment sets one.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/finance.sqlite?mode=rwc";

/// Default page size for schedule listings.
pub const DEFAULT_PAGE_LIMIT: u64 = 100;

/// Settings for the whole application
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// `SeaORM` connection string
    pub database_url: String,
    /// Maximum number of schedules returned by one listing call
    pub page_limit: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl AppConfig {
    fn validate(self) -> Result<Self> {
        if self.database_url.trim().is_empty() {
            return Err(Error::Config {
                message: "database_url cannot be empty".to_string(),
            });
        }
        if self.page_limit == 0 {
            return Err(Error::Config {
                message: "page_limit must be at least 1".to_string(),
            });
        }
        Ok(self)
    }
}

/// Parses settings from a TOML string.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str::<AppConfig>(contents)
        .map_err(|e| Error::Config {
            message: format!("Failed to parse config.toml: {e}"),
        })?
        .validate()
}

/// Loads settings from a TOML file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    parse_config(&contents)
}

/// Loads the application configuration from file and environment.
///
/// A missing file is not an error; defaults are used instead.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var("FINANCE_CONFIG").unwrap_or_else(|_| "config.toml".to_string());

    let mut config = if Path::new(&path).exists() {
        info!(path = %path, "Loading configuration file");
        load_config(&path)?
    } else {
        warn!(path = %path, "Configuration file not found, using defaults");
        AppConfig::default()
    };

    if let Ok(url) = std::env::var("DATABASE_URL") {
        config.database_url = url;
    }

    config.validate()
}

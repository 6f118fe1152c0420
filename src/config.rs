//! Application configuration management

use std::env;

use anyhow::{Context, Result};

/// Default naming template applied when renaming episode files.
pub const DEFAULT_NAMING_TEMPLATE: &str = "{show} - S{season:02}E{episode:02} - {title}";

/// Engine configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Database path (SQLite)
    pub database_path: String,

    /// Naming template for the rename engine
    pub naming_template: String,

    /// Override for the catalog API base URL (tests point this at a stub)
    pub catalog_base_url: Option<String>,

    /// Minimum similarity score for a folder-name match to be considered confident
    pub match_threshold: f64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "./data/curator.db".to_string()),

            naming_template: env::var("NAMING_TEMPLATE")
                .unwrap_or_else(|_| DEFAULT_NAMING_TEMPLATE.to_string()),

            catalog_base_url: env::var("CATALOG_URL").ok(),

            match_threshold: env::var("MATCH_THRESHOLD")
                .unwrap_or_else(|_| "0.85".to_string())
                .parse()
                .context("Invalid MATCH_THRESHOLD")?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "./data/curator.db".to_string(),
            naming_template: DEFAULT_NAMING_TEMPLATE.to_string(),
            catalog_base_url: None,
            match_threshold: 0.85,
        }
    }
}

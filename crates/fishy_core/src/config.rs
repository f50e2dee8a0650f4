//! Runtime configuration for catalog front ends.
//!
//! # Responsibility
//! - Resolve the database path and logging settings from the environment.
//!
//! # Invariants
//! - Unset or blank variables fall back to defaults.
//! - Logging stays disabled unless a log directory is configured.

use crate::logging::default_log_level;
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "FISHY_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "FISHY_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "FISHY_LOG_DIR";
pub const DEFAULT_DB_PATH: &str = "./db.sqlite";

/// Settings needed to open the catalog and start logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CatalogConfig {
    /// Reads `FISHY_DB_PATH`, `FISHY_LOG_LEVEL` and `FISHY_LOG_DIR`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        config.log_dir = read(ENV_LOG_DIR).map(PathBuf::from);
        config
    }
}

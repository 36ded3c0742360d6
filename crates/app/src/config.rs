//! Application configuration
//!
//! Loaded from `matinee.toml` in the platform config directory. Venue
//! settings (company details, VAT, invoice numbering) live in the
//! database; this file only covers machine-local concerns.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use matinee_core::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Override for the database file location
    pub database_path: Option<PathBuf>,
    /// Directory report exports are written to; defaults to the data dir
    pub export_dir: Option<PathBuf>,
    /// Seconds between maintenance passes (outbox dispatch, overdue sweep)
    pub maintenance_interval_secs: u64,
    /// Delivery attempts before an outbox entry is marked failed
    pub outbox_max_attempts: u32,
    /// Base delay between delivery retries; doubles per attempt
    pub outbox_backoff_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            export_dir: None,
            maintenance_interval_secs: 60,
            outbox_max_attempts: 5,
            outbox_backoff_secs: 60,
        }
    }
}

impl AppConfig {
    /// Load from the default config location, falling back to defaults
    /// when the file does not exist
    pub fn load() -> Result<Self> {
        let Some(dirs) = ProjectDirs::from("dev", "matinee", "matinee") else {
            return Ok(Self::default());
        };
        let path = dirs.config_dir().join("matinee.toml");
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| Error::Validation(format!("Bad config file: {}", e)))
    }
}

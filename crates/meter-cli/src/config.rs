//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use meter_core::AttentionConfig;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// Attention detection thresholds and weights.
    #[serde(default)]
    pub attention: AttentionConfig,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("meter.db"),
            attention: AttentionConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // METER_DATABASE_PATH, METER_ATTENTION__GRACE_PERIOD_MS, ...
        figment = figment.merge(Env::prefixed("METER_").split("__"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for meter.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("meter"))
}

/// Returns the platform-specific data directory for meter.
///
/// On Linux: `~/.local/share/meter`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("meter"))
}

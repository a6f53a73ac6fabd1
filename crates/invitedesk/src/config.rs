//! Application configuration.
//!
//! A small JSON file under the platform config directory, with the
//! gateway endpoint overridable through the environment for scripted use.

use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Environment variable overriding the gateway endpoint.
const ENDPOINT_ENV: &str = "INVITEDESK_ENDPOINT";

/// Settings that persist across sessions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Gateway endpoint URL.
    pub endpoint: String,
    /// Override for the local state directory.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Loads configuration from the config file and environment.
    ///
    /// The environment variable wins over the file; a missing file is
    /// fine as long as the endpoint arrives from the environment.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            _ => Self::default(),
        };

        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
            config.endpoint = endpoint;
        }

        if config.endpoint.trim().is_empty() {
            anyhow::bail!(
                "no gateway endpoint configured; set {ENDPOINT_ENV} or write {}",
                Self::config_path()
                    .map_or_else(|| "the config file".to_string(), |p| p.display().to_string())
            );
        }

        Ok(config)
    }

    /// Path of the config file, if a platform config dir exists.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("invitedesk").join("config.json"))
    }

    /// Path of the local state database, creating its directory.
    pub fn database_path(&self) -> anyhow::Result<PathBuf> {
        let dir = match &self.data_dir {
            Some(dir) => dir.clone(),
            None => dirs::data_dir()
                .context("no platform data directory available")?
                .join("invitedesk"),
        };
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("creating {}", dir.display()))?;
        Ok(dir.join("state.db"))
    }
}

//! Configuration for the strive-sync client

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub account: AccountConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the hosted store
    #[serde(default = "default_url")]
    pub url: String,

    /// Opaque access token (issued by the backend provider; auth flows are
    /// delegated there)
    #[serde(default)]
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Owner identity every remote collection is scoped by
    pub owner_id: String,

    /// Human-readable device label
    #[serde(default)]
    pub device_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Quiet window after the last local mutation, in seconds
    #[serde(default = "default_debounce_secs")]
    pub debounce_secs: u64,

    /// Scheduler period, in seconds
    #[serde(default = "default_poll_secs")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_url() -> String {
    "https://sync.strive.app".to_string()
}

fn default_debounce_secs() -> u64 {
    5
}

fn default_poll_secs() -> u64 {
    2
}

fn default_enabled() -> bool {
    true
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_secs: default_debounce_secs(),
            poll_interval_secs: default_poll_secs(),
            enabled: default_enabled(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                url: default_url(),
                access_token: String::new(),
            },
            account: AccountConfig {
                owner_id: String::new(),
                device_name: None,
            },
            sync: SyncConfig::default(),
        }
    }
}

impl Config {
    /// Default config path
    pub fn default_path() -> Result<PathBuf> {
        // Check environment variable first
        if let Ok(env_path) = std::env::var("STRIVE_SYNC_CONFIG") {
            return Ok(PathBuf::from(env_path));
        }

        // Check for config in current directory
        let local = PathBuf::from("config.toml");
        if local.exists() {
            return Ok(local);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("strive-sync");

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from default path
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).context("Failed to read config file")?;
        toml::from_str(&content).context("Failed to parse config file")
    }

    /// Save config to specific path
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        let with_comments = format!(
            "# strive-sync configuration\n\
             # See: https://github.com/strive-app/strive-sync\n\n\
             {}\n",
            content
        );

        std::fs::write(path, with_comments).context("Failed to write config file")?;

        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_secs(self.sync.debounce_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.sync.poll_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            access_token = "tok"

            [account]
            owner_id = "u1"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.url, "https://sync.strive.app");
        assert_eq!(config.sync.debounce_secs, 5);
        assert!(config.sync.enabled);
        assert_eq!(config.debounce(), Duration::from_secs(5));
    }

    #[test]
    fn config_round_trips_through_toml() {
        let mut config = Config::default();
        config.account.owner_id = "u1".to_string();
        config.sync.debounce_secs = 9;

        let text = toml::to_string_pretty(&config).unwrap();
        let restored: Config = toml::from_str(&text).unwrap();
        assert_eq!(restored.account.owner_id, "u1");
        assert_eq!(restored.sync.debounce_secs, 9);
    }
}

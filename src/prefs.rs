//! Local preference flags
//!
//! Small key-value flags (onboarding completion, notification preference)
//! persisted as a TOML file in the platform config directory. These are
//! device-local and never part of the synced-entity model.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prefs {
    #[serde(default)]
    pub onboarding_done: bool,
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
    #[serde(default)]
    pub last_signed_in_owner: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for Prefs {
    fn default() -> Self {
        Self {
            onboarding_done: false,
            notifications_enabled: true,
            last_signed_in_owner: None,
        }
    }
}

impl Prefs {
    /// Note the owner of a successful sync. Returns `true` when the stored
    /// value changed and the prefs are worth saving.
    pub fn record_sign_in(&mut self, owner: &str) -> bool {
        if self.last_signed_in_owner.as_deref() == Some(owner) {
            return false;
        }
        self.last_signed_in_owner = Some(owner.to_string());
        true
    }

    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("strive-sync");
        Ok(config_dir.join("prefs.toml"))
    }

    /// Load from the default path; missing file means defaults.
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).context("Failed to read prefs file")?;
        toml::from_str(&content).context("Failed to parse prefs file")
    }

    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create prefs directory")?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize prefs")?;
        std::fs::write(path, content).context("Failed to write prefs file")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let prefs = Prefs::load_from(&PathBuf::from("/nonexistent/prefs.toml")).unwrap();
        assert!(!prefs.onboarding_done);
        assert!(prefs.notifications_enabled);
    }

    #[test]
    fn sign_in_is_recorded_once_per_owner() {
        let mut prefs = Prefs::default();
        assert!(prefs.record_sign_in("u1"));
        assert_eq!(prefs.last_signed_in_owner.as_deref(), Some("u1"));

        // Same owner again: nothing changed, no save needed.
        assert!(!prefs.record_sign_in("u1"));
        assert!(prefs.record_sign_in("u2"));
        assert_eq!(prefs.last_signed_in_owner.as_deref(), Some("u2"));
    }

    #[test]
    fn partial_file_fills_remaining_defaults() {
        let prefs: Prefs = toml::from_str("onboarding_done = true").unwrap();
        assert!(prefs.onboarding_done);
        assert!(prefs.notifications_enabled);
        assert!(prefs.last_signed_in_owner.is_none());
    }
}

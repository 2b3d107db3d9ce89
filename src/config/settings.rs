use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{KeystashError, Result};
use crate::store::{Environment, RotationReminder};

/// Project-level settings, loaded from `keystash.toml`.
///
/// Every field has a default so Keystash works without any settings file.
/// Unknown keys are rejected so a typo never silently does nothing.
/// Secrets never live here; see [`super::KeyConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Store file location (relative paths resolve against the project dir).
    #[serde(default = "default_store_path")]
    pub store_path: String,

    /// Environment given to new keys when `--env` is omitted.
    #[serde(default = "default_environment")]
    pub default_environment: Environment,

    /// Reminder given to new keys when `--reminder` is omitted.
    #[serde(default = "default_rotation_reminder")]
    pub default_rotation_reminder: RotationReminder,

    /// How many days before a rotation is due it shows as "due soon".
    #[serde(default = "default_reminder_warning_days")]
    pub reminder_warning_days: u32,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_store_path() -> String {
    ".keystash/keys.store".to_string()
}

fn default_environment() -> Environment {
    Environment::Development
}

fn default_rotation_reminder() -> RotationReminder {
    RotationReminder::Days90
}

fn default_reminder_warning_days() -> u32 {
    7
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            default_environment: default_environment(),
            default_rotation_reminder: default_rotation_reminder(),
            reminder_warning_days: default_reminder_warning_days(),
        }
    }
}

impl Settings {
    /// Name of the settings file we look for in the project root.
    pub const FILE_NAME: &'static str = "keystash.toml";

    /// Load settings from `<project_dir>/keystash.toml`.
    ///
    /// If the file does not exist, defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            KeystashError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        Ok(settings)
    }

    /// Full path of the store file for a project directory.
    pub fn store_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.store_path)
    }
}

// ── Tests ────────────────────────────────────────────────────────────

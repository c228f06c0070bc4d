//! Global, user-level CLI configuration (distinct from a workspace's
//! `hidra.toml`, which holds engine parameters for one simulation).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

/// Global CLI configuration, loaded from `$XDG_CONFIG_HOME/hidra/config.toml`
/// (or platform equivalent) unless overridden by `--config`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Workspace directory used when `--workspace` is not given.
    pub default_workspace: Option<String>,
    /// Log level passed to `env_logger` when `RUST_LOG` is unset.
    pub log_level: String,
    /// User display preferences.
    pub preferences: UserPreferences,
}

/// Cosmetic output preferences.
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPreferences {
    /// Emit JSON instead of human-readable tables for `inspect`/`snapshot show`.
    pub json_output: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            default_workspace: None,
            log_level: "info".to_string(),
            preferences: UserPreferences::default(),
        }
    }
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self { json_output: false }
    }
}

impl CliConfig {
    /// Load from `path`, falling back to defaults if the file does not exist.
    pub fn load_from_file(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|err| CliError::config(format!("invalid config file: {err}")))
    }

    /// Persist to `path`, creating parent directories as needed.
    pub fn save_to_file(&self, path: &Path) -> CliResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|err| CliError::config(format!("failed to serialize config: {err}")))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// The platform-conventional path for the global config file.
    pub fn default_config_path() -> CliResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CliError::config("could not determine a config directory for this platform"))?;
        Ok(config_dir.join("hidra").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = CliConfig::load_from_file(&dir.path().join("nope.toml")).expect("load");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        let mut config = CliConfig::default();
        config.log_level = "debug".to_string();
        config.save_to_file(&path).expect("save");
        let restored = CliConfig::load_from_file(&path).expect("load");
        assert_eq!(restored.log_level, "debug");
    }
}

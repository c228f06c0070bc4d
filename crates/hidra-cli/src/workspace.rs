//! Workspace discovery and layout: the on-disk shape `hidra init` scaffolds
//! and every other command expects to find.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use hidra_engine::HidraConfig;

use crate::error::{CliError, CliResult};

/// The name of the workspace manifest file, analogous to a `Cargo.toml`.
pub const MANIFEST_FILE: &str = "hidra.toml";

/// Top-level `hidra.toml` document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Workspace identity.
    pub workspace: WorkspaceInfo,
    /// Engine configuration applied to every world this workspace builds.
    #[serde(default)]
    pub engine: HidraConfig,
    /// Default parameters for `hidra run` when not overridden on the command line.
    #[serde(default)]
    pub run: RunDefaults,
}

/// Identity block of a workspace manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceInfo {
    /// Human-readable workspace name.
    pub name: String,
    /// Manifest schema version (independent of the snapshot format version).
    pub version: String,
}

/// Defaults for a `hidra run` invocation, overridable per command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunDefaults {
    /// Genome file, relative to the workspace root.
    pub genome: String,
    /// Tick ceiling for an unattended run.
    pub max_ticks: u64,
    /// Key XORed into the RNG seed when `engine.auto_reseed_per_run` is set.
    pub reseed_key: String,
}

impl Default for RunDefaults {
    fn default() -> Self {
        Self {
            genome: "genome.hgl".to_string(),
            max_ticks: 1000,
            reseed_key: "default".to_string(),
        }
    }
}

impl WorkspaceConfig {
    /// A fresh manifest for a newly initialized workspace named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            workspace: WorkspaceInfo {
                name: name.into(),
                version: "0.1.0".to_string(),
            },
            engine: HidraConfig::default(),
            run: RunDefaults::default(),
        }
    }
}

/// A resolved Hidra workspace: a root directory and its parsed manifest.
pub struct Workspace {
    /// The workspace root directory.
    pub root: PathBuf,
    /// The parsed `hidra.toml`, once loaded.
    pub config: Option<WorkspaceConfig>,
}

impl Workspace {
    /// Wrap a root directory without loading its manifest yet.
    pub fn new(root: PathBuf) -> Self {
        Self { root, config: None }
    }

    /// Parse `hidra.toml` from the workspace root into [`Self::config`].
    pub fn load_config(&mut self) -> CliResult<()> {
        let path = self.root.join(MANIFEST_FILE);
        let text = std::fs::read_to_string(&path).map_err(|err| {
            CliError::workspace(format!("cannot read {}: {err}", path.display()))
        })?;
        self.config = Some(
            toml::from_str(&text).map_err(|err| CliError::config(format!("invalid {}: {err}", MANIFEST_FILE)))?,
        );
        Ok(())
    }

    /// Whether `root` looks like a Hidra workspace (carries a manifest).
    pub fn is_valid(&self) -> bool {
        self.root.join(MANIFEST_FILE).exists()
    }

    /// Directory holding per-run snapshots.
    pub fn snapshots_dir(&self) -> PathBuf {
        self.root.join("snapshots")
    }

    /// Directory holding genome text files.
    pub fn genomes_dir(&self) -> PathBuf {
        self.root.join("genomes")
    }

    /// Walk up from `start` looking for the nearest ancestor carrying a manifest.
    pub fn find_root(start: &Path) -> Option<PathBuf> {
        let mut current = start;
        loop {
            if current.join(MANIFEST_FILE).exists() {
                return Some(current.to_path_buf());
            }
            current = current.parent()?;
        }
    }

    /// Create the standard subdirectories for a new workspace.
    pub fn ensure_directories(&self) -> CliResult<()> {
        for dir in [self.snapshots_dir(), self.genomes_dir()] {
            std::fs::create_dir_all(&dir)
                .map_err(|err| CliError::workspace(format!("failed to create {}: {err}", dir.display())))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_manifest_round_trips_through_toml() {
        let config = WorkspaceConfig::new("test-world");
        let text = toml::to_string_pretty(&config).expect("serialize");
        let restored: WorkspaceConfig = toml::from_str(&text).expect("deserialize");
        assert_eq!(restored.workspace.name, "test-world");
        assert_eq!(restored.run.genome, "genome.hgl");
    }

    #[test]
    fn find_root_walks_up_to_the_nearest_manifest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "").unwrap();
        assert_eq!(Workspace::find_root(&nested), Some(dir.path().to_path_buf()));
    }

    #[test]
    fn find_root_is_none_outside_any_workspace() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(Workspace::find_root(dir.path()), None);
    }
}

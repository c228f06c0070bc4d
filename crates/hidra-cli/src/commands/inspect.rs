//! Inspect a workspace's layout and manifest without touching a world.

use std::path::PathBuf;

use clap::Args;
use log::info;

use crate::error::CliResult;
use crate::workspace::{Workspace, MANIFEST_FILE};

/// Report whether a directory looks like a valid Hidra workspace, and what's in it.
#[derive(Args, Debug)]
pub struct InspectCommand {
    /// Print the full parsed manifest as well as the summary.
    #[arg(short, long)]
    pub detailed: bool,
}

impl InspectCommand {
    /// Inspect `root` as a Hidra workspace.
    pub fn execute(self, root: PathBuf) -> CliResult<()> {
        let mut workspace = Workspace::new(root.clone());
        info!("workspace: {}", root.display());

        if !workspace.is_valid() {
            println!("no {MANIFEST_FILE} found at {}", root.display());
            println!("run `hidra init <name>` to scaffold one");
            return Ok(());
        }
        workspace.load_config()?;
        let manifest = workspace.config.as_ref().expect("load_config populates config");

        println!("name: {}", manifest.workspace.name);
        println!("manifest version: {}", manifest.workspace.version);
        println!("default genome: {}", manifest.run.genome);
        println!("default max_ticks: {}", manifest.run.max_ticks);

        for (label, dir) in [("genomes", workspace.genomes_dir()), ("snapshots", workspace.snapshots_dir())] {
            let count = std::fs::read_dir(&dir).map(|entries| entries.count()).unwrap_or(0);
            println!("{label}: {count} file(s) in {}", dir.display());
        }

        if self.detailed {
            let text = toml::to_string_pretty(manifest).expect("serialize manifest");
            println!("\n--- {MANIFEST_FILE} ---\n{text}");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_missing_manifest_without_erroring() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cmd = InspectCommand { detailed: false };
        cmd.execute(dir.path().to_path_buf()).expect("inspect");
    }

    #[test]
    fn reports_an_initialized_workspace() {
        let dir = tempfile::tempdir().expect("tempdir");
        super::super::init::InitCommand { name: "ws".to_string(), examples: false }
            .execute(dir.path().to_path_buf())
            .expect("init");
        let cmd = InspectCommand { detailed: true };
        cmd.execute(dir.path().join("ws")).expect("inspect");
    }
}

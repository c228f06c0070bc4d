//! Workspace scaffolding.

use std::path::PathBuf;

use clap::Args;
use log::info;

use crate::error::{CliError, CliResult};
use crate::workspace::{Workspace, WorkspaceConfig, MANIFEST_FILE};

/// Default genome written into a freshly scaffolded workspace: four empty
/// (`Nop`) genes, satisfying `system_gene_count = 4` with a present Gene 0
/// so the world builds with no starting neurons. Real organisms are authored
/// by hand or produced by the (out-of-scope) HGL assembler.
const DEFAULT_GENOME: &str = "00GN00GN00GN00";

const DEFAULT_README: &str = "\
# genomes/

Hex-bytecode genomes, genes delimited by the literal two-character sequence\n\
`GN`. Gene 0 (Genesis) is mandatory; `hidra.toml`'s `engine.system_gene_count`\n\
reserves the next N-1 slots (Gestation, Mitosis, Apoptosis, ...). The starter\n\
`genome.hgl` wires nothing: every reserved gene is `Nop`.\n";

/// Scaffold a new Hidra workspace at `<target>/<name>`.
#[derive(Args, Debug)]
pub struct InitCommand {
    /// Workspace name; also the directory created under the target path.
    pub name: String,

    /// Seed a starter genome with example structure instead of an all-Nop one.
    #[arg(long)]
    pub examples: bool,
}

impl InitCommand {
    /// Scaffold the workspace under `target/<name>`.
    pub fn execute(self, target: PathBuf) -> CliResult<()> {
        let root = target.join(&self.name);
        if root.join(MANIFEST_FILE).exists() {
            return Err(CliError::workspace(format!(
                "{} already contains a {MANIFEST_FILE}",
                root.display()
            )));
        }
        std::fs::create_dir_all(&root)?;

        let workspace = Workspace::new(root.clone());
        workspace.ensure_directories()?;

        let manifest = WorkspaceConfig::new(&self.name);
        let manifest_text = toml::to_string_pretty(&manifest)
            .map_err(|err| CliError::config(format!("failed to render {MANIFEST_FILE}: {err}")))?;
        std::fs::write(root.join(MANIFEST_FILE), manifest_text)?;

        let genome_text = if self.examples { example_genome() } else { DEFAULT_GENOME.to_string() };
        std::fs::write(workspace.genomes_dir().join(&manifest.run.genome), genome_text)?;
        std::fs::write(workspace.genomes_dir().join("README.md"), DEFAULT_README)?;

        info!("initialized Hidra workspace {:?} at {}", self.name, root.display());
        info!("run `hidra run --workspace {}` to step it", root.display());
        Ok(())
    }
}

/// A Genesis gene that spawns a single neuron at the origin, for `--examples`.
/// Encodes `AddNeuron(Const(0.0), Const(0.0), Const(0.0))` as raw bytes:
/// opcode `0x32` followed by three `Const` leaves (`0x01` + little-endian f32).
fn example_genome() -> String {
    let mut bytes = vec![0x32u8];
    for _ in 0..3 {
        bytes.push(0x01);
        bytes.extend_from_slice(&0.0f32.to_le_bytes());
    }
    let genesis: String = bytes.iter().map(|b| format!("{b:02X}")).collect();
    format!("{genesis}GN00GN00GN00")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_genome_round_trips_through_the_parser() {
        let text = example_genome();
        let parsed = hidra_hgl::parse_genome_text(&text).expect("parse");
        assert_eq!(parsed.genes.len(), 4);
        let compiled = hidra_hgl::compile_genome(&parsed).expect("compile");
        assert_eq!(compiled.gene(0).unwrap().op, hidra_hgl::GeneOp::AddNeuron);
    }

    #[test]
    fn scaffolds_manifest_and_genome_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cmd = InitCommand { name: "demo".to_string(), examples: false };
        cmd.execute(dir.path().to_path_buf()).expect("init");

        let root = dir.path().join("demo");
        assert!(root.join(MANIFEST_FILE).exists());
        assert!(root.join("genomes").join("genome.hgl").exists());
        assert!(root.join("snapshots").is_dir());
    }

    #[test]
    fn refuses_to_overwrite_an_existing_workspace() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cmd = InitCommand { name: "demo".to_string(), examples: false };
        cmd.execute(dir.path().to_path_buf()).expect("init");
        let cmd = InitCommand { name: "demo".to_string(), examples: false };
        assert!(cmd.execute(dir.path().to_path_buf()).is_err());
    }
}

//! Inspect or advance a persisted snapshot, independent of any workspace.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use hidra_engine::HidraWorld;
use log::info;
use serde::Serialize;

use crate::error::{CliError, CliResult};

/// Snapshot inspection and replay.
#[derive(Args, Debug)]
pub struct SnapshotCommand {
    /// Which snapshot operation to run.
    #[command(subcommand)]
    pub sub: SnapshotSubcommand,
}

/// Snapshot subcommands.
#[derive(Subcommand, Debug)]
pub enum SnapshotSubcommand {
    /// Print a summary of a snapshot file.
    Show(ShowCommand),
    /// Restore a snapshot, step it N further ticks, and write the result out.
    Step(StepCommand),
}

impl SnapshotCommand {
    /// Dispatch to the chosen subcommand.
    pub fn execute(self) -> CliResult<()> {
        match self.sub {
            SnapshotSubcommand::Show(cmd) => cmd.execute(),
            SnapshotSubcommand::Step(cmd) => cmd.execute(),
        }
    }
}

/// Print a snapshot's tick counter and graph population, as text or JSON.
#[derive(Args, Debug)]
pub struct ShowCommand {
    /// Snapshot file to inspect.
    pub snapshot: PathBuf,

    /// The genome the snapshot was paired with (required to recompile and
    /// restore; the snapshot format deliberately never embeds genome text).
    pub genome: PathBuf,

    /// Emit a JSON document instead of a human-readable summary.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct SnapshotSummary {
    current_tick: u64,
    neuron_count: usize,
}

impl ShowCommand {
    /// Load the snapshot and print a summary.
    pub fn execute(self) -> CliResult<()> {
        let world = load_world(&self.snapshot, &self.genome)?;
        let summary = SnapshotSummary {
            current_tick: world.current_tick(),
            neuron_count: world.neuron_count(),
        };
        if self.json {
            println!("{}", serde_json::to_string_pretty(&summary).expect("serialize summary"));
        } else {
            println!("current_tick: {}", summary.current_tick);
            println!("neuron_count: {}", summary.neuron_count);
        }
        Ok(())
    }
}

/// Restore a snapshot, advance it, and persist the result.
#[derive(Args, Debug)]
pub struct StepCommand {
    /// Snapshot file to restore from.
    pub snapshot: PathBuf,

    /// The genome the snapshot was paired with.
    pub genome: PathBuf,

    /// Number of additional ticks to run.
    #[arg(long, default_value_t = 1)]
    pub ticks: u64,

    /// Where to write the advanced snapshot. Defaults to overwriting the input.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

impl StepCommand {
    /// Restore, advance, and persist.
    pub fn execute(self) -> CliResult<()> {
        let world = load_world(&self.snapshot, &self.genome)?;
        for _ in 0..self.ticks {
            world.step();
        }
        let out_path = self.out.unwrap_or_else(|| self.snapshot.clone());
        let text = world.to_snapshot_json()?;
        std::fs::write(&out_path, text)?;
        info!("advanced to tick {}, wrote {}", world.current_tick(), out_path.display());
        Ok(())
    }
}

fn load_world(snapshot: &PathBuf, genome: &PathBuf) -> CliResult<HidraWorld> {
    let snapshot_text = std::fs::read_to_string(snapshot)
        .map_err(|err| CliError::workspace(format!("cannot read snapshot {}: {err}", snapshot.display())))?;
    let genome_text = std::fs::read_to_string(genome)
        .map_err(|err| CliError::workspace(format!("cannot read genome {}: {err}", genome.display())))?;
    Ok(HidraWorld::from_snapshot_json(&snapshot_text, genome_text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hidra_engine::{Brain, HidraConfig};

    fn write_nop_genome(path: &PathBuf) {
        std::fs::write(path, "00GN00GN00GN00").expect("write genome");
    }

    #[test]
    fn show_reports_tick_and_neuron_count() {
        let dir = tempfile::tempdir().expect("tempdir");
        let genome_path = dir.path().join("genome.hgl");
        write_nop_genome(&genome_path);
        let genome_text = std::fs::read_to_string(&genome_path).unwrap();

        let world = HidraWorld::new(HidraConfig::default(), genome_text.clone(), "snapshot-test").expect("build");
        world.add_neuron([0.0, 0.0, 0.0], Brain::PassThrough);
        world.step();
        let snapshot_path = dir.path().join("snap.json");
        std::fs::write(&snapshot_path, world.to_snapshot_json().unwrap()).unwrap();

        let cmd = ShowCommand { snapshot: snapshot_path, genome: genome_path, json: true };
        cmd.execute().expect("show");
    }

    #[test]
    fn step_advances_and_persists() {
        let dir = tempfile::tempdir().expect("tempdir");
        let genome_path = dir.path().join("genome.hgl");
        write_nop_genome(&genome_path);
        let genome_text = std::fs::read_to_string(&genome_path).unwrap();

        let world = HidraWorld::new(HidraConfig::default(), genome_text, "snapshot-test").expect("build");
        let snapshot_path = dir.path().join("snap.json");
        std::fs::write(&snapshot_path, world.to_snapshot_json().unwrap()).unwrap();

        let out_path = dir.path().join("snap2.json");
        let cmd = StepCommand {
            snapshot: snapshot_path,
            genome: genome_path.clone(),
            ticks: 3,
            out: Some(out_path.clone()),
        };
        cmd.execute().expect("step");

        let genome_text = std::fs::read_to_string(&genome_path).unwrap();
        let restored_text = std::fs::read_to_string(&out_path).unwrap();
        let restored = HidraWorld::from_snapshot_json(&restored_text, genome_text).expect("restore");
        assert_eq!(restored.current_tick(), 3);
    }
}

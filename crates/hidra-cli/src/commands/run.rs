//! Step a world for a fixed tick count or until a predicate is satisfied.
//!
//! No `Activity` task adapter lives in this crate (CartPole/XOR/TicTacToe/
//! DMTS-style feeders are out of scope, per `spec.md` §1); `hidra run` drives
//! [`hidra_engine::activity::run_until`] with a no-op activity so the
//! predicate/tick-ceiling machinery still gets real exercise end to end.

use std::collections::HashMap;
use std::path::PathBuf;

use clap::Args;
use hidra_engine::{
    activity::{run_until, Activity, ActivityConfig, Predicate, TerminationReason},
    HidraWorld,
};
use hidra_storage::NodeId;
use log::info;

use crate::error::{CliError, CliResult};
use crate::workspace::Workspace;

/// Step a world, optionally staging inputs first and snapshotting at the end.
#[derive(Args, Debug)]
pub struct RunCommand {
    /// Genome file to load, relative to the workspace's `genomes/` directory
    /// unless an absolute path is given. Defaults to the workspace manifest's
    /// `run.genome`.
    #[arg(long)]
    pub genome: Option<PathBuf>,

    /// Resume from a snapshot file instead of building a fresh world.
    #[arg(long)]
    pub resume: Option<PathBuf>,

    /// Tick ceiling for this run. Defaults to the workspace manifest's `run.max_ticks`.
    #[arg(long)]
    pub ticks: Option<u64>,

    /// Stop once this predicate is satisfied. Syntax: `tick>=N`,
    /// `output_eq:<node_id>=<value>`, `output_ge:<node_id>=<value>`,
    /// `output_le:<node_id>=<value>`, `stable_for_n:<node_id>:<ticks>`.
    #[arg(long)]
    pub predicate: Option<String>,

    /// Stage an input node value before the first tick: `<node_id>=<value>`. Repeatable.
    #[arg(long = "input", value_parser = parse_input_assignment)]
    pub inputs: Vec<(NodeId, f32)>,

    /// Write the resulting world state to this snapshot file when the run ends.
    #[arg(long)]
    pub snapshot_out: Option<PathBuf>,
}

impl RunCommand {
    /// Resolve the workspace, build or restore the world, run it, and report the outcome.
    pub fn execute(self, workspace_dir: PathBuf) -> CliResult<()> {
        let mut workspace = Workspace::new(workspace_dir);
        workspace.load_config()?;
        let manifest = workspace.config.clone().expect("load_config populates config");

        let genome_path = self
            .genome
            .unwrap_or_else(|| workspace.genomes_dir().join(&manifest.run.genome));
        let genome_text = std::fs::read_to_string(&genome_path)
            .map_err(|err| CliError::workspace(format!("cannot read genome {}: {err}", genome_path.display())))?;

        let world = match &self.resume {
            Some(snapshot_path) => {
                let snapshot_text = std::fs::read_to_string(snapshot_path).map_err(|err| {
                    CliError::workspace(format!("cannot read snapshot {}: {err}", snapshot_path.display()))
                })?;
                HidraWorld::from_snapshot_json(&snapshot_text, genome_text)?
            }
            None => HidraWorld::new(manifest.engine.clone(), genome_text, &manifest.run.reseed_key)?,
        };

        for (id, value) in &self.inputs {
            world.stage_input(*id, *value)?;
        }

        let max_ticks = self.ticks.or(Some(manifest.run.max_ticks));
        let mut predicate = match &self.predicate {
            Some(text) => parse_predicate(text)?,
            None => Predicate::TickAtLeast(max_ticks.unwrap_or(0)),
        };

        let mut activity = NoopActivity;
        activity.initialize(&world, &ActivityConfig::default())?;
        let outcome = run_until(&world, &mut activity, &mut predicate, max_ticks)?;

        info!(
            "ran {} ticks, stopped because {:?}",
            outcome.ticks_run, outcome.reason
        );
        println!("ticks_run: {}", outcome.ticks_run);
        println!("stop_reason: {}", describe_reason(outcome.reason));
        println!("neuron_count: {}", world.neuron_count());

        if let Some(out_path) = &self.snapshot_out {
            let text = world.to_snapshot_json()?;
            std::fs::write(out_path, text)?;
            info!("wrote snapshot to {}", out_path.display());
        }

        Ok(())
    }
}

fn describe_reason(reason: TerminationReason) -> &'static str {
    match reason {
        TerminationReason::ActivityDone => "activity_done",
        TerminationReason::PredicateSatisfied => "predicate_satisfied",
        TerminationReason::MaxTicksReached => "max_ticks_reached",
    }
}

/// An `Activity` that reads and writes nothing, so `--predicate`/`--ticks`
/// remain the only stopping conditions for a bare `hidra run` invocation.
struct NoopActivity;

impl Activity for NoopActivity {
    fn initialize(&mut self, _world: &HidraWorld, _config: &ActivityConfig) -> hidra_engine::Result<()> {
        Ok(())
    }

    fn step(&mut self, _world: &HidraWorld) -> hidra_engine::Result<bool> {
        Ok(false)
    }

    fn fitness_score(&self) -> f32 {
        0.0
    }

    fn run_metadata(&self) -> HashMap<String, String> {
        HashMap::new()
    }
}

fn parse_input_assignment(raw: &str) -> Result<(NodeId, f32), String> {
    let (id_part, value_part) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected <node_id>=<value>, got {raw:?}"))?;
    let id: u64 = id_part.parse().map_err(|_| format!("invalid node id {id_part:?}"))?;
    let value: f32 = value_part.parse().map_err(|_| format!("invalid value {value_part:?}"))?;
    Ok((NodeId::new(id), value))
}

/// Parse a `--predicate` string into a [`Predicate`]. Syntax mirrors
/// `spec.md` §6's predicate vocabulary (`tick>=N`, `output_eq`, `output_ge`,
/// `output_le`, `stable_for_n`), extended only with the `:`/`=` separators a
/// CLI flag needs to carry the node ID and comparison value.
fn parse_predicate(text: &str) -> CliResult<Predicate> {
    if let Some(n) = text.strip_prefix("tick>=") {
        let n: u64 = n.parse().map_err(|_| CliError::invalid_args(format!("bad tick count in {text:?}")))?;
        return Ok(Predicate::TickAtLeast(n));
    }
    if let Some(rest) = text.strip_prefix("stable_for_n:") {
        let (id_part, ticks_part) = rest
            .split_once(':')
            .ok_or_else(|| CliError::invalid_args(format!("expected stable_for_n:<id>:<ticks>, got {text:?}")))?;
        let id = parse_node_id(id_part)?;
        let ticks: u64 = ticks_part.parse().map_err(|_| CliError::invalid_args(format!("bad tick count in {text:?}")))?;
        return Ok(Predicate::stable_for_n(id, ticks));
    }
    let comparisons: [(&str, fn(NodeId, f32) -> Predicate); 3] = [
        ("output_eq:", |o, v| Predicate::OutputEq { output: o, value: v }),
        ("output_ge:", |o, v| Predicate::OutputGe { output: o, value: v }),
        ("output_le:", |o, v| Predicate::OutputLe { output: o, value: v }),
    ];
    for (prefix, build) in comparisons {
        if let Some(rest) = text.strip_prefix(prefix) {
            let (id_part, value_part) = rest
                .split_once('=')
                .ok_or_else(|| CliError::invalid_args(format!("expected {prefix}<id>=<value>, got {text:?}")))?;
            let id = parse_node_id(id_part)?;
            let value: f32 = value_part.parse().map_err(|_| CliError::invalid_args(format!("bad value in {text:?}")))?;
            return Ok(build(id, value));
        }
    }
    Err(CliError::invalid_args(format!("unrecognized predicate {text:?}")))
}

fn parse_node_id(raw: &str) -> CliResult<NodeId> {
    raw.parse::<u64>().map(NodeId::new).map_err(|_| CliError::invalid_args(format!("invalid node id {raw:?}")))
}

//! CLI command implementations for `hidra`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::error::CliResult;

pub mod init;
pub mod inspect;
pub mod run;
pub mod snapshot;

/// Hidra — deterministic tick-driven organism simulation engine.
#[derive(Parser, Debug)]
#[command(
    name = "hidra",
    version,
    about = "CLI for the Hidra deterministic organism simulation engine",
    long_about = "Hidra drives worlds of evolvable artificial organisms: neuron graphs wired \
                  by weighted synapses and mutated at runtime by genetic bytecode (HGL). This \
                  CLI scaffolds workspaces, steps a world for a fixed tick count or until a \
                  predicate is satisfied, and inspects snapshot/workspace state. It does not \
                  implement the HTTP controller layer, the evolution driver, or any Activity \
                  task adapter — those are callers' concern."
)]
pub struct HidraCli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Workspace directory (defaults to the current directory).
    #[arg(short, long, global = true)]
    pub workspace: Option<PathBuf>,

    /// Global CLI configuration file path (distinct from the workspace's `hidra.toml`).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Which subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available `hidra` subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scaffold a new Hidra workspace.
    #[command(alias = "new")]
    Init(init::InitCommand),

    /// Step a world for a fixed tick count or until a predicate is satisfied.
    Run(run::RunCommand),

    /// Inspect or step a persisted snapshot.
    Snapshot(snapshot::SnapshotCommand),

    /// Inspect workspace layout and configuration.
    Inspect(inspect::InspectCommand),
}

impl HidraCli {
    /// Execute the parsed command.
    pub fn execute(self) -> CliResult<()> {
        let workspace = self
            .workspace
            .unwrap_or_else(|| std::env::current_dir().expect("current directory must be readable"));
        match self.command {
            Commands::Init(cmd) => cmd.execute(workspace),
            Commands::Run(cmd) => cmd.execute(workspace),
            Commands::Snapshot(cmd) => cmd.execute(),
            Commands::Inspect(cmd) => cmd.execute(workspace),
        }
    }
}

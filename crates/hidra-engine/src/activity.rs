//! The Activity interface (component K): the task adapter a caller feeds
//! each tick, and the synchronous driver loop that runs a world against one
//! until a [`Predicate`] is satisfied.
//!
//! Grounded in the teacher's `SimulationEngine::run` main loop
//! (`shnn-runtime::simulation`), generalized from a fixed step count to a
//! predicate and from an internal network to an externally owned
//! [`HidraWorld`] handle.

use std::collections::HashMap;

use hidra_storage::NodeId;
use serde_json::Value;

use crate::error::Result;
use crate::world::HidraWorld;

/// What an [`Activity`] is handed at the start of a run: which world nodes
/// feed it input and which it reads for output, plus opaque task-specific
/// parameters.
#[derive(Debug, Clone, Default)]
pub struct ActivityConfig {
    /// Named input nodes the activity writes to each tick.
    pub input_mapping: HashMap<String, NodeId>,
    /// Named output nodes the activity reads from each tick.
    pub output_mapping: HashMap<String, NodeId>,
    /// Task-specific parameters, opaque to the engine.
    pub parameters: Value,
}

impl ActivityConfig {
    /// The input node mapped to `name`, if any.
    pub fn input(&self, name: &str) -> Option<NodeId> {
        self.input_mapping.get(name).copied()
    }

    /// The output node mapped to `name`, if any.
    pub fn output(&self, name: &str) -> Option<NodeId> {
        self.output_mapping.get(name).copied()
    }
}

/// An external task adapter: feeds a running world's input nodes, reads its
/// output nodes, and scores the outcome. No implementation lives in this
/// crate; CartPole/XOR/TicTacToe/DMTS-style adapters are callers' concern.
pub trait Activity {
    /// Called once before the first tick.
    fn initialize(&mut self, world: &HidraWorld, config: &ActivityConfig) -> Result<()>;

    /// Called once per engine tick, before the tick itself is stepped. May
    /// read output-node values via [`HidraWorld::output_values`] and write
    /// input-node values via [`HidraWorld::set_input_values`]. Returns
    /// whether the activity itself considers the run complete.
    fn step(&mut self, world: &HidraWorld) -> Result<bool>;

    /// The activity's scalar fitness score, valid once the run has ended.
    fn fitness_score(&self) -> f32;

    /// Free-form metadata describing the run (task-specific diagnostics).
    fn run_metadata(&self) -> HashMap<String, String>;
}

/// A termination condition evaluated at tick boundaries. Variants that track
/// running state (`StableForN`) carry it inline and are mutated in place by
/// [`Predicate::is_satisfied`].
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Satisfied once `world.current_tick() >= n`.
    TickAtLeast(u64),
    /// Satisfied once the named output exactly equals `value`.
    OutputEq { output: NodeId, value: f32 },
    /// Satisfied once the named output is `>= value`.
    OutputGe { output: NodeId, value: f32 },
    /// Satisfied once the named output is `<= value`.
    OutputLe { output: NodeId, value: f32 },
    /// Satisfied once the named output has held the same value for `ticks`
    /// consecutive evaluations. `last`/`run` are internal bookkeeping.
    StableForN { output: NodeId, ticks: u64, last: Option<f32>, run: u64 },
}

impl Predicate {
    /// A `stable_for_n` predicate with fresh bookkeeping state.
    pub fn stable_for_n(output: NodeId, ticks: u64) -> Self {
        Predicate::StableForN { output, ticks, last: None, run: 0 }
    }

    /// Evaluate against the world's current state, mutating any internal
    /// run-length bookkeeping (`StableForN`) in the process.
    pub fn is_satisfied(&mut self, world: &HidraWorld) -> Result<bool> {
        Ok(match self {
            Predicate::TickAtLeast(n) => world.current_tick() >= *n,
            Predicate::OutputEq { output, value } => world.read_output(*output)? == *value,
            Predicate::OutputGe { output, value } => world.read_output(*output)? >= *value,
            Predicate::OutputLe { output, value } => world.read_output(*output)? <= *value,
            Predicate::StableForN { output, ticks, last, run } => {
                let current = world.read_output(*output)?;
                if *last == Some(current) {
                    *run += 1;
                } else {
                    *last = Some(current);
                    *run = 1;
                }
                *run >= *ticks
            }
        })
    }
}

/// How a [`run_until`] call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// The activity itself reported `done`.
    ActivityDone,
    /// The predicate was satisfied.
    PredicateSatisfied,
    /// The configured tick ceiling was reached first.
    MaxTicksReached,
}

/// The outcome of a [`run_until`] call.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// The world's tick counter when the run ended.
    pub ticks_run: u64,
    /// Why the driver loop stopped.
    pub reason: TerminationReason,
    /// `activity.fitness_score()` at the end of the run.
    pub fitness: f32,
    /// `activity.run_metadata()` at the end of the run.
    pub metadata: HashMap<String, String>,
}

/// Drive `world` against `activity` one tick at a time until `activity.step`
/// reports done, `predicate` is satisfied, or `max_ticks` (if given) is
/// reached — whichever comes first. Synchronous, matching `spec.md`'s
/// "coroutine-like tick steps... expose `step()` and `run_until(predicate)`
/// as synchronous" design note; no async runtime is involved.
pub fn run_until(
    world: &HidraWorld,
    activity: &mut dyn Activity,
    predicate: &mut Predicate,
    max_ticks: Option<u64>,
) -> Result<RunOutcome> {
    let reason = loop {
        if activity.step(world)? {
            break TerminationReason::ActivityDone;
        }
        world.step();
        if predicate.is_satisfied(world)? {
            break TerminationReason::PredicateSatisfied;
        }
        if let Some(max) = max_ticks {
            if world.current_tick() >= max {
                break TerminationReason::MaxTicksReached;
            }
        }
    };
    Ok(RunOutcome {
        ticks_run: world.current_tick(),
        reason,
        fitness: activity.fitness_score(),
        metadata: activity.run_metadata(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HidraConfig;

    struct FixedTickActivity {
        writes: u32,
    }

    impl Activity for FixedTickActivity {
        fn initialize(&mut self, _world: &HidraWorld, _config: &ActivityConfig) -> Result<()> {
            Ok(())
        }

        fn step(&mut self, _world: &HidraWorld) -> Result<bool> {
            self.writes += 1;
            Ok(false)
        }

        fn fitness_score(&self) -> f32 {
            self.writes as f32
        }

        fn run_metadata(&self) -> HashMap<String, String> {
            let mut map = HashMap::new();
            map.insert("writes".to_string(), self.writes.to_string());
            map
        }
    }

    #[test]
    fn run_until_tick_at_least_stops_on_schedule() {
        let world = HidraWorld::new(HidraConfig::default(), "00".to_string(), "activity-test").expect("build world");
        let mut activity = FixedTickActivity { writes: 0 };
        let mut predicate = Predicate::TickAtLeast(5);
        let outcome = run_until(&world, &mut activity, &mut predicate, None).expect("run");
        assert_eq!(outcome.ticks_run, 5);
        assert_eq!(outcome.reason, TerminationReason::PredicateSatisfied);
        assert_eq!(outcome.fitness, 5.0);
    }

    #[test]
    fn run_until_respects_max_ticks_ceiling() {
        let world = HidraWorld::new(HidraConfig::default(), "00".to_string(), "activity-test").expect("build world");
        let mut activity = FixedTickActivity { writes: 0 };
        let mut predicate = Predicate::TickAtLeast(1_000);
        let outcome = run_until(&world, &mut activity, &mut predicate, Some(3)).expect("run");
        assert_eq!(outcome.ticks_run, 3);
        assert_eq!(outcome.reason, TerminationReason::MaxTicksReached);
    }

    #[test]
    fn stable_for_n_requires_consecutive_equal_reads() {
        let world = HidraWorld::new(HidraConfig::default(), "00".to_string(), "activity-test").expect("build world");
        let output = world.add_output_node();
        let mut predicate = Predicate::stable_for_n(output, 3);
        assert!(!predicate.is_satisfied(&world).unwrap());
        assert!(!predicate.is_satisfied(&world).unwrap());
        assert!(predicate.is_satisfied(&world).unwrap());
    }

    #[test]
    fn output_ge_is_satisfied_once_threshold_crossed() {
        let world = HidraWorld::new(HidraConfig::default(), "00".to_string(), "activity-test").expect("build world");
        let input = world.add_input_node();
        let output = world.add_output_node();
        world
            .add_synapse(input, output, crate::graph::SignalType::Immediate, 1.0, 0.0)
            .expect("wire");
        let mut predicate = Predicate::OutputGe { output, value: 0.5 };
        assert!(!predicate.is_satisfied(&world).unwrap());
        world.stage_input(input, 1.0).unwrap();
        world.step();
        assert!(predicate.is_satisfied(&world).unwrap());
    }
}

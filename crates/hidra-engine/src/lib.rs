//! Deterministic tick-driven simulation engine for evolvable artificial
//! organisms.
//!
//! Owns the neuron/synapse/hormone graph (component E), the nine-stage tick
//! pipeline and external mutation API (components H/I, [`world`]), the brain
//! evaluator (component G, [`brain`]), the event queue (component F,
//! [`events`]), the dual-stream deterministic RNG ([`rng`]), the spatial hash
//! used for competition queries ([`spatial`]), the Kahan-compensated
//! accumulator bank ([`kahan`]), metrics sampling ([`metrics`]), and the
//! [`Activity`] interface plus synchronous driver loop (component K,
//! [`activity`]).
//!
//! Layout mirrors the teacher's `shnn-runtime`: a `network`-equivalent
//! module (here split across `graph`/`world`) owns state, `simulation` plays
//! the role of [`activity`], and a thin `error` module sits at the boundary.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod activity;
pub mod brain;
pub mod config;
pub mod error;
pub mod events;
pub mod graph;
pub mod kahan;
pub mod metrics;
pub mod rng;
pub mod spatial;
pub mod world;

pub use activity::{Activity, ActivityConfig, Predicate, RunOutcome, TerminationReason};
pub use brain::{Brain, BrainOutput, Gate};
pub use config::HidraConfig;
pub use error::{EngineError, Result};
pub use graph::{
    lvar, CmpOp, Condition, ConditionContext, Fatigue, GlobalHormones, InputNode, LVAR_COUNT,
    Neuron, Operand, OutputNode, SignalType, Synapse,
};
pub use metrics::{MetricsLog, MetricsSample, NeuronSample};
pub use world::{HidraWorld, GENE_APOPTOSIS, GENE_GENESIS, GENE_GESTATION, GENE_MITOSIS};

/// Engine crate version for compatibility checking, independent of the
/// snapshot format version embedded in [`hidra_storage::SNAPSHOT_FORMAT_VERSION`].
pub const ENGINE_VERSION: u32 = 1;

//! The brain evaluator (component G): the pure function that turns a
//! neuron's assembled inputs into soma/LVar writes at fire time.
//!
//! Modeled on the teacher's plastic-connectivity enum dispatch
//! (`shnn-core::connectivity::plastic_enum::PlasticConn`), which picks a
//! concrete update rule by matching on an enum rather than boxing a trait
//! object — cheap to clone (mitosis copies a brain by value) and exhaustive
//! to match, so adding a new brain kind is a compiler-enforced checklist
//! rather than a silent miss.

use serde::{Deserialize, Serialize};

/// What a brain's evaluation produces.
#[derive(Debug, Clone, PartialEq)]
pub struct BrainOutput {
    /// The soma potential to write after firing. `None` means the pipeline's
    /// default reset (zero) applies.
    pub soma_override: Option<f32>,
    /// Additional `(index, value)` LVar writes the brain wants applied.
    pub lvar_writes: Vec<(u8, f32)>,
}

impl BrainOutput {
    /// The default: reset soma to zero, no extra LVar writes.
    pub fn reset() -> Self {
        Self {
            soma_override: None,
            lvar_writes: Vec::new(),
        }
    }
}

/// A boolean gate kind for [`Brain::LogicGate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gate {
    /// True iff every input is non-zero.
    And,
    /// True iff any input is non-zero.
    Or,
    /// True iff an odd number of inputs are non-zero.
    Xor,
    /// Negated [`Gate::And`].
    Nand,
    /// Negated [`Gate::Or`].
    Nor,
    /// Negated [`Gate::Xor`].
    Xnor,
}

impl Gate {
    fn apply(self, inputs: &[f32]) -> bool {
        let bits: Vec<bool> = inputs.iter().map(|&v| v != 0.0).collect();
        match self {
            Gate::And => bits.iter().all(|&b| b) && !bits.is_empty(),
            Gate::Or => bits.iter().any(|&b| b),
            Gate::Xor => bits.iter().filter(|&&b| b).count() % 2 == 1,
            Gate::Nand => !(bits.iter().all(|&b| b) && !bits.is_empty()),
            Gate::Nor => !bits.iter().any(|&b| b),
            Gate::Xnor => bits.iter().filter(|&&b| b).count() % 2 == 0,
        }
    }
}

/// One layer of a [`Brain::FeedForward`] network: one weight row per output unit.
pub type Layer = Vec<Vec<f32>>;

/// A neuron's fixed-function evaluator. No learning rule is mandated; every
/// variant here is a pure, weights-fixed-at-construction function. Mitosis
/// copies a brain by value (`#[derive(Clone)]`), never by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Brain {
    /// A small multi-layer perceptron with `tanh` activations between
    /// layers; the final layer's single output becomes the soma override.
    FeedForward {
        /// `layers[l][o][i]` is the weight from input `i` to output unit `o` in layer `l`.
        layers: Vec<Layer>,
    },
    /// A combinational boolean gate over the per-source input vector.
    LogicGate {
        /// Which gate to apply.
        gate: Gate,
    },
    /// A set-reset latch: `inputs[0]` sets, `inputs[1]` resets (reset takes priority).
    FlipFlop {
        /// Current latched state.
        state: bool,
    },
    /// The target's soma is driven directly by the sum of its inputs.
    PassThrough,
}

impl Brain {
    /// Evaluate this brain against the tick's dendritic potential (the Kahan
    /// sum of every immediate/continuous contribution) and the ordered list
    /// of individual per-source contributions assembled during the synapse
    /// pass, which discrete-logic brains (gates, latches) need as separate
    /// signals rather than one pre-summed total.
    pub fn evaluate(&mut self, dendritic_potential: f32, per_source: &[f32]) -> BrainOutput {
        match self {
            Brain::FeedForward { layers } => {
                let mut activations = if per_source.is_empty() {
                    vec![dendritic_potential]
                } else {
                    per_source.to_vec()
                };
                for layer in layers.iter() {
                    let mut next = Vec::with_capacity(layer.len());
                    for weights in layer {
                        let mut total = 0.0f32;
                        for (w, a) in weights.iter().zip(activations.iter()) {
                            total += w * a;
                        }
                        next.push(total.tanh());
                    }
                    activations = next;
                }
                let output = activations.first().copied().unwrap_or(dendritic_potential);
                BrainOutput {
                    soma_override: Some(output),
                    lvar_writes: Vec::new(),
                }
            }
            Brain::LogicGate { gate } => {
                let inputs: &[f32] = if per_source.is_empty() {
                    std::slice::from_ref(&dendritic_potential)
                } else {
                    per_source
                };
                let result = gate.apply(inputs);
                BrainOutput {
                    soma_override: Some(if result { 1.0 } else { 0.0 }),
                    lvar_writes: Vec::new(),
                }
            }
            Brain::FlipFlop { state } => {
                let set = per_source.first().copied().unwrap_or(dendritic_potential) != 0.0;
                let reset = per_source.get(1).copied().unwrap_or(0.0) != 0.0;
                if reset {
                    *state = false;
                } else if set {
                    *state = true;
                }
                BrainOutput {
                    soma_override: Some(if *state { 1.0 } else { 0.0 }),
                    lvar_writes: Vec::new(),
                }
            }
            Brain::PassThrough => BrainOutput {
                soma_override: Some(dendritic_potential),
                lvar_writes: Vec::new(),
            },
        }
    }
}

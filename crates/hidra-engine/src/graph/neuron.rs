//! The neuron entity (component E).

use hidra_storage::NodeId;
use serde::{Deserialize, Serialize};

use crate::brain::Brain;

/// Number of local variable slots every neuron carries.
pub const LVAR_COUNT: usize = 256;

/// Reserved LVar indices with fixed engine-level meaning. Indices `5..238`
/// are free for gene-authored use.
pub mod lvar {
    /// The soma potential threshold that triggers firing.
    pub const FIRING_THRESHOLD: u8 = 0;
    /// Per-tick exponential decay applied to the soma potential.
    pub const DECAY_RATE: u8 = 1;
    /// Ticks a neuron spends refractory after firing.
    pub const REFRACTORY_PERIOD: u8 = 2;
    /// How much firing adapts (raises) the effective threshold.
    pub const THRESHOLD_ADAPTATION_FACTOR: u8 = 3;
    /// Per-tick recovery rate pulling the adaptive threshold back down.
    pub const THRESHOLD_RECOVERY_RATE: u8 = 4;
    /// Remaining refractory ticks.
    pub const REFRACTORY_TIME_LEFT: u8 = 239;
    /// Exponential moving estimate of recent firing frequency.
    pub const FIRING_RATE: u8 = 240;
    /// This tick's accumulated dendritic input (reset every tick).
    pub const DENDRITIC_POTENTIAL: u8 = 241;
    /// The integrating soma potential.
    pub const SOMA_POTENTIAL: u8 = 242;
    /// Health; apoptosis triggers once this reaches zero or below.
    pub const HEALTH: u8 = 243;
    /// Age in ticks since creation.
    pub const AGE: u8 = 244;
    /// The threshold after adaptation is applied; what firing actually compares against.
    pub const ADAPTIVE_THRESHOLD: u8 = 245;
}

/// A single neuron: a 256-slot local-variable array, a position, and a brain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neuron {
    /// Stable identity.
    pub id: NodeId,
    /// World-space position, used by the spatial hash and mitosis offsets.
    pub position: [f32; 3],
    /// The 256 local variables; see [`lvar`] for reserved slots.
    pub lvars: [f32; LVAR_COUNT],
    /// The evaluator that turns this tick's dendritic input into soma/LVar writes.
    pub brain: Brain,
    /// Whether this neuron currently participates in the tick pipeline.
    pub is_active: bool,
    /// Whether this neuron fired on the *previous* tick. Consumed by the
    /// synapse pass (a source's "fired last tick" signal) and overwritten at
    /// the end of this tick's neuron integration step.
    pub fired_prev_tick: bool,
}

impl Neuron {
    /// Construct a neuron at `position` with engine defaults seeded from configuration.
    pub fn new(
        id: NodeId,
        position: [f32; 3],
        brain: Brain,
        default_firing_threshold: f32,
        default_decay_rate: f32,
        default_refractory_period: f32,
    ) -> Self {
        let mut lvars = [0.0f32; LVAR_COUNT];
        lvars[lvar::FIRING_THRESHOLD as usize] = default_firing_threshold;
        lvars[lvar::DECAY_RATE as usize] = default_decay_rate;
        lvars[lvar::REFRACTORY_PERIOD as usize] = default_refractory_period;
        lvars[lvar::HEALTH as usize] = 1.0;
        Self {
            id,
            position,
            lvars,
            brain,
            is_active: true,
            fired_prev_tick: false,
        }
    }

    /// Read an LVar slot.
    pub fn lvar(&self, index: u8) -> f32 {
        self.lvars[index as usize]
    }

    /// Write an LVar slot.
    pub fn set_lvar(&mut self, index: u8, value: f32) {
        self.lvars[index as usize] = value;
    }

    /// The effective threshold firing compares against: the base threshold
    /// plus any firing-induced adaptation accumulated so far.
    pub fn effective_threshold(&self) -> f32 {
        self.lvar(lvar::FIRING_THRESHOLD) + self.lvar(lvar::ADAPTIVE_THRESHOLD)
    }

    /// Whether this neuron is currently refractory (cannot fire).
    pub fn is_refractory(&self) -> bool {
        self.lvar(lvar::REFRACTORY_TIME_LEFT) > 0.0
    }

    /// Blend a `Continuous`-signal contribution into the soma potential via
    /// exponential moving average. `parameter` is the synapse's smoothing
    /// factor, fixed at:
    ///
    /// ```text
    /// new_soma = old_soma * (1 - parameter) + source * parameter
    /// ```
    pub fn apply_continuous_signal(&mut self, source: f32, parameter: f32) {
        let old_soma = self.lvar(lvar::SOMA_POTENTIAL);
        let new_soma = old_soma * (1.0 - parameter) + source * parameter;
        self.set_lvar(lvar::SOMA_POTENTIAL, new_soma);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::Brain;

    #[test]
    fn new_neuron_seeds_defaults_and_full_health() {
        let n = Neuron::new(NodeId::new(1), [0.0, 0.0, 0.0], Brain::PassThrough, 1.0, 0.05, 3.0);
        assert_eq!(n.lvar(lvar::FIRING_THRESHOLD), 1.0);
        assert_eq!(n.lvar(lvar::DECAY_RATE), 0.05);
        assert_eq!(n.lvar(lvar::REFRACTORY_PERIOD), 3.0);
        assert_eq!(n.lvar(lvar::HEALTH), 1.0);
        assert!(n.is_active);
        assert!(!n.is_refractory());
    }

    #[test]
    fn continuous_signal_follows_the_fixed_ema() {
        let mut n = Neuron::new(NodeId::new(1), [0.0, 0.0, 0.0], Brain::PassThrough, 1.0, 0.05, 3.0);
        n.set_lvar(lvar::SOMA_POTENTIAL, 10.0);
        n.apply_continuous_signal(0.0, 0.25);
        assert_eq!(n.lvar(lvar::SOMA_POTENTIAL), 7.5);
    }

    #[test]
    fn effective_threshold_includes_adaptation() {
        let mut n = Neuron::new(NodeId::new(1), [0.0, 0.0, 0.0], Brain::PassThrough, 1.0, 0.05, 3.0);
        n.set_lvar(lvar::ADAPTIVE_THRESHOLD, 0.5);
        assert_eq!(n.effective_threshold(), 1.5);
    }
}

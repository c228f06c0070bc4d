//! World configuration (component H/I surface): every knob the tick
//! pipeline and external mutation API read at runtime.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Recognized configuration for a running world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HidraConfig {
    /// Seeded into a new neuron's `FiringThreshold` LVar.
    pub default_firing_threshold: f32,
    /// Seeded into a new neuron's `DecayRate` LVar.
    pub default_decay_rate: f32,
    /// Seeded into a new neuron's `RefractoryPeriod` LVar.
    pub default_refractory_period: f32,
    /// Health deducted from every active neuron every tick.
    pub metabolic_tax_per_tick: f32,
    /// Radius used both for spatial queries and the spatial hash's cell sizing.
    pub competition_radius: f32,
    /// First RNG seed word.
    pub seed0: u64,
    /// Second RNG seed word.
    pub seed1: u64,
    /// Whether to XOR a run-identity hash into the seed words at startup.
    pub auto_reseed_per_run: bool,
    /// Number of genes reserved for system use (Genesis, Gestation, Mitosis, Apoptosis, ...).
    pub system_gene_count: usize,
    /// Whether to sample metrics at all.
    pub metrics_enabled: bool,
    /// Maximum number of metrics samples retained (oldest dropped first).
    pub metrics_ring_capacity: usize,
    /// Fraction of neurons sampled per metrics tick, drawn from the metrics RNG stream.
    pub metrics_neuron_sample_rate: f32,
    /// Which LVar indices are recorded per sampled neuron.
    pub metrics_lvar_indices: Vec<u8>,
    /// Whether synapse-level metrics are recorded.
    pub metrics_include_synapses: bool,
    /// Whether I/O node metrics are recorded.
    pub metrics_include_io: bool,
}

impl Default for HidraConfig {
    fn default() -> Self {
        Self {
            default_firing_threshold: 1.0,
            default_decay_rate: 0.05,
            default_refractory_period: 3.0,
            metabolic_tax_per_tick: 0.0,
            competition_radius: 5.0,
            seed0: 0x1234_5678_9ABC_DEF0,
            seed1: 0x0FED_CBA9_8765_4321,
            auto_reseed_per_run: false,
            system_gene_count: 4,
            metrics_enabled: true,
            metrics_ring_capacity: 1024,
            metrics_neuron_sample_rate: 1.0,
            metrics_lvar_indices: Vec::new(),
            metrics_include_synapses: false,
            metrics_include_io: false,
        }
    }
}

impl HidraConfig {
    /// Validate internal consistency, returning the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        if self.competition_radius <= 0.0 {
            return Err(EngineError::ConfigurationError(
                "competition_radius must be positive".into(),
            ));
        }
        if self.system_gene_count == 0 {
            return Err(EngineError::ConfigurationError(
                "system_gene_count must include at least the Genesis gene".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.metrics_neuron_sample_rate) {
            return Err(EngineError::ConfigurationError(
                "metrics_neuron_sample_rate must be within [0, 1]".into(),
            ));
        }
        if self.seed0 == 0 && self.seed1 == 0 {
            return Err(EngineError::ConfigurationError(
                "seed0 and seed1 must not both be zero".into(),
            ));
        }
        Ok(())
    }

    /// Cell side used by the spatial hash, derived from `competition_radius`.
    pub fn spatial_cell_side(&self) -> f32 {
        2.0 * self.competition_radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate_clean() {
        assert!(HidraConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_nonpositive_competition_radius() {
        let cfg = HidraConfig {
            competition_radius: 0.0,
            ..HidraConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_sample_rate() {
        let cfg = HidraConfig {
            metrics_neuron_sample_rate: 1.5,
            ..HidraConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_all_zero_seed() {
        let cfg = HidraConfig {
            seed0: 0,
            seed1: 0,
            ..HidraConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}

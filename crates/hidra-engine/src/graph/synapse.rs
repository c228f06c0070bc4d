//! The synapse entity (component E).

use hidra_storage::{NodeId, SynapseId};
use serde::{Deserialize, Serialize};

use super::condition::Condition;

/// How a synapse's effective value is delivered to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalType {
    /// Folded into the target's Kahan accumulator this tick.
    Immediate,
    /// Enqueued as a `DelayedSignal` event, materializing on a future tick.
    Delayed,
    /// Blended into the target's soma potential via exponential moving average.
    Continuous,
}

/// Fatigue dynamics: effective weight degrades with use and recovers over time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fatigue {
    /// Current fatigue level in `[0, 1]`; 0 is fully rested.
    pub level: f32,
    /// How much `level` rises each time the synapse dispatches.
    pub rate: f32,
    /// How much `level` falls back toward zero every tick it does not dispatch.
    pub recovery_rate: f32,
}

impl Default for Fatigue {
    fn default() -> Self {
        Self {
            level: 0.0,
            rate: 0.0,
            recovery_rate: 0.0,
        }
    }
}

impl Fatigue {
    /// Record a dispatch: raise fatigue, clamped to `[0, 1]`.
    pub fn record_dispatch(&mut self) {
        self.level = (self.level + self.rate).min(1.0);
    }

    /// Recover one tick's worth, clamped to `[0, 1]`.
    pub fn recover(&mut self) {
        self.level = (self.level - self.recovery_rate).max(0.0);
    }
}

/// A directed connection between two nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Synapse {
    /// Stable identity.
    pub id: SynapseId,
    /// The node whose value feeds this synapse.
    pub source: NodeId,
    /// The node this synapse delivers its effective value to.
    pub target: NodeId,
    /// How the value is delivered.
    pub signal_type: SignalType,
    /// Base weight; multiplied by `(1 - fatigue.level)` for the effective weight.
    pub weight: f32,
    /// A signal-kind-specific parameter: delay in ticks for `Delayed`, the
    /// EMA smoothing factor for `Continuous`, unused for `Immediate`.
    pub parameter: f32,
    /// Optional gating expression; `None` behaves as `Condition::Always`.
    pub condition: Option<Condition>,
    /// Use-dependent weight degradation.
    pub fatigue: Fatigue,
    /// Whether this synapse currently participates in the synapse pass.
    pub is_active: bool,
}

impl Synapse {
    /// Construct a synapse with no gating condition and no fatigue dynamics.
    pub fn new(
        id: SynapseId,
        source: NodeId,
        target: NodeId,
        signal_type: SignalType,
        weight: f32,
        parameter: f32,
    ) -> Self {
        Self {
            id,
            source,
            target,
            signal_type,
            weight,
            parameter,
            condition: None,
            fatigue: Fatigue::default(),
            is_active: true,
        }
    }

    /// The weight actually applied this dispatch, after fatigue discount.
    pub fn effective_weight(&self) -> f32 {
        self.weight * (1.0 - self.fatigue.level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_weight_discounts_by_fatigue() {
        let mut s = Synapse::new(SynapseId::new(1), NodeId::new(1), NodeId::new(2), SignalType::Immediate, 2.0, 0.0);
        s.fatigue.level = 0.5;
        assert_eq!(s.effective_weight(), 1.0);
    }

    #[test]
    fn fatigue_rises_and_recovers() {
        let mut f = Fatigue {
            level: 0.0,
            rate: 0.3,
            recovery_rate: 0.1,
        };
        f.record_dispatch();
        f.record_dispatch();
        assert!((f.level - 0.6).abs() < 1e-6);
        f.recover();
        assert!((f.level - 0.5).abs() < 1e-6);
    }

    #[test]
    fn fatigue_clamps_to_unit_interval() {
        let mut f = Fatigue {
            level: 0.9,
            rate: 0.5,
            recovery_rate: 0.1,
        };
        f.record_dispatch();
        assert_eq!(f.level, 1.0);
        for _ in 0..20 {
            f.recover();
        }
        assert_eq!(f.level, 0.0);
    }
}

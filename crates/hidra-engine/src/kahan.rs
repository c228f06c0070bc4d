//! Compensated summation (component B).
//!
//! Signal contributions into a neuron's dendritic accumulator arrive across
//! a synapse pass whose iteration order is fixed (ascending synapse ID) but
//! whose magnitudes can span many orders of size. Plain float summation
//! would make the final accumulated value sensitive to the order terms
//! happen to be added in whenever floating-point rounding bites; Kahan
//! summation keeps a running compensation term so the result only depends on
//! the multiset of addends, not their order.

use std::collections::HashMap;

use hidra_storage::NodeId;

/// A single compensated running sum.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KahanAccumulator {
    sum: f32,
    compensation: f32,
}

impl KahanAccumulator {
    /// A fresh accumulator at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one more addend into the running sum.
    pub fn add(&mut self, value: f32) {
        let y = value - self.compensation;
        let t = self.sum + y;
        self.compensation = (t - self.sum) - y;
        self.sum = t;
    }

    /// The current compensated total.
    pub fn value(&self) -> f32 {
        self.sum
    }

    /// Reset to zero, dropping any accumulated compensation.
    pub fn reset(&mut self) {
        self.sum = 0.0;
        self.compensation = 0.0;
    }
}

/// Per-neuron bank of accumulators, rebuilt fresh at the start of every tick.
#[derive(Debug, Clone, Default)]
pub struct AccumulatorBank {
    accumulators: HashMap<NodeId, KahanAccumulator>,
}

impl AccumulatorBank {
    /// An empty bank.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear every accumulator, ready for the next tick's synapse pass.
    pub fn clear(&mut self) {
        self.accumulators.clear();
    }

    /// Fold a contribution into `target`'s accumulator, creating it on first use.
    pub fn add(&mut self, target: NodeId, value: f32) {
        self.accumulators.entry(target).or_default().add(value);
    }

    /// Read `target`'s accumulated total (0.0 if nothing has been added this tick).
    pub fn total(&self, target: NodeId) -> f32 {
        self.accumulators.get(&target).map(KahanAccumulator::value).unwrap_or(0.0)
    }
}

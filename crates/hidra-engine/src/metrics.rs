//! Metrics sampling, driven off the dedicated metrics RNG stream so turning
//! it on or off can never perturb a simulated tick.

use std::collections::VecDeque;

use hidra_storage::NodeId;
use serde::{Deserialize, Serialize};

/// One sampled neuron's recorded LVar slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuronSample {
    /// Which neuron this is.
    pub id: NodeId,
    /// `(index, value)` pairs for the configured `metrics_lvar_indices`.
    pub lvars: Vec<(u8, f32)>,
}

/// Everything sampled on one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSample {
    /// The tick this sample was taken on.
    pub tick: u64,
    /// Total active neuron count (always recorded, independent of sampling rate).
    pub active_neuron_count: usize,
    /// Total active synapse count.
    pub active_synapse_count: usize,
    /// Per-neuron LVar samples, filtered by `metrics_neuron_sample_rate`.
    pub neuron_samples: Vec<NeuronSample>,
}

/// A bounded ring of recent [`MetricsSample`]s; oldest entries are evicted
/// once `capacity` is exceeded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsLog {
    capacity: usize,
    samples: VecDeque<MetricsSample>,
}

impl MetricsLog {
    /// An empty log bounded to `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            samples: VecDeque::new(),
        }
    }

    /// Record a sample, evicting the oldest entry if over capacity.
    pub fn push(&mut self, sample: MetricsSample) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity.max(1) {
            self.samples.pop_front();
        }
    }

    /// The most recently recorded sample, if any.
    pub fn latest(&self) -> Option<&MetricsSample> {
        self.samples.back()
    }

    /// Every retained sample, oldest first.
    pub fn samples(&self) -> impl Iterator<Item = &MetricsSample> {
        self.samples.iter()
    }

    /// Number of retained samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(tick: u64) -> MetricsSample {
        MetricsSample {
            tick,
            active_neuron_count: 0,
            active_synapse_count: 0,
            neuron_samples: Vec::new(),
        }
    }

    #[test]
    fn evicts_oldest_past_capacity() {
        let mut log = MetricsLog::new(2);
        log.push(sample(1));
        log.push(sample(2));
        log.push(sample(3));
        let ticks: Vec<u64> = log.samples().map(|s| s.tick).collect();
        assert_eq!(ticks, vec![2, 3]);
    }

    #[test]
    fn latest_returns_most_recent() {
        let mut log = MetricsLog::new(10);
        log.push(sample(1));
        log.push(sample(2));
        assert_eq!(log.latest().unwrap().tick, 2);
    }
}

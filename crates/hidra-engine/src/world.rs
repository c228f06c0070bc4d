//! The world: graph storage, the tick pipeline (component H), and the
//! external mutation API (component I).
//!
//! Grounded on the teacher's `shnn-runtime::simulation::SimulationEngine`,
//! which owns a network plus a `step()`/`run()` driver; here the network is
//! replaced by Hidra's neuron/synapse/hormone graph and `step()` implements
//! the nine-stage tick pipeline instead of a spike-propagation pass.

use std::collections::BTreeMap;
use std::sync::Arc;

use hidra_hgl::{CompiledGenome, HglContext, SignalKind as HglSignalKind};
use hidra_storage::{IdCounter, NodeId, SnapshotEnvelope, SynapseId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::brain::Brain;
use crate::config::HidraConfig;
use crate::error::{EngineError, Result};
use crate::events::{Event, EventPayload, EventQueue, EventType};
use crate::graph::{neuron::lvar, Condition, ConditionContext, GlobalHormones, InputNode, Neuron, OutputNode, SignalType, Synapse};
use crate::kahan::AccumulatorBank;
use crate::metrics::{MetricsLog, MetricsSample, NeuronSample};
use crate::rng::DeterministicRng;
use crate::spatial::SpatialHash;

/// Positional index of the mandatory Genesis gene.
pub const GENE_GENESIS: usize = 0;
/// Positional index of the gene run against every newly mitosed neuron.
pub const GENE_GESTATION: usize = 1;
/// Positional index of the gene run when a neuron undergoes mitosis (unused directly by the
/// pipeline today, reserved so genomes can address it uniformly with the other system slots).
pub const GENE_MITOSIS: usize = 2;
/// Positional index of the gene run when a neuron undergoes apoptosis (same status as above).
pub const GENE_APOPTOSIS: usize = 3;

/// Smoothing factor for the `FiringRate` LVar's exponential moving average.
/// Fixed by the engine, not configurable: a per-neuron smoothing knob would
/// need its own reserved LVar slot and none is allotted.
const FIRING_RATE_SMOOTHING: f32 = 0.1;

/// Everything persisted across a snapshot/restore cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    current_tick: u64,
    config: HidraConfig,
    hormones: GlobalHormones,
    neurons: BTreeMap<NodeId, Neuron>,
    synapses: BTreeMap<SynapseId, Synapse>,
    inputs: BTreeMap<NodeId, InputNode>,
    outputs: BTreeMap<NodeId, OutputNode>,
    event_queue: EventQueue,
    node_id_counter: u64,
    synapse_id_counter: u64,
    event_id_counter: u64,
    rng_sim_state: [u64; 2],
    rng_metrics_state: [u64; 2],
    metrics: MetricsLog,
}

/// The mutable state a running world carries, guarded by a single mutex in
/// [`HidraWorld`]. The event queue lives here rather than behind a second
/// lock, so acquiring the world lock is sufficient to touch the queue too.
pub struct WorldState {
    current_tick: u64,
    config: HidraConfig,
    hormones: GlobalHormones,
    neurons: BTreeMap<NodeId, Neuron>,
    synapses: BTreeMap<SynapseId, Synapse>,
    inputs: BTreeMap<NodeId, InputNode>,
    outputs: BTreeMap<NodeId, OutputNode>,
    event_queue: EventQueue,
    spatial: SpatialHash,
    node_ids: IdCounter<NodeId>,
    synapse_ids: IdCounter<SynapseId>,
    event_ids: IdCounter<hidra_storage::EventId>,
    rng: DeterministicRng,
    genome_text: String,
    genome: CompiledGenome,
    accumulators: AccumulatorBank,
    per_source: std::collections::HashMap<NodeId, Vec<f32>>,
    metrics: MetricsLog,
}

impl WorldState {
    fn new(config: HidraConfig, genome_text: String, reseed_key: &str) -> Result<Self> {
        config.validate()?;
        let parsed = hidra_hgl::parse_genome_text(&genome_text)?;
        let genome = hidra_hgl::compile_genome(&parsed)?;
        let rng = DeterministicRng::new(config.seed0, config.seed1, config.auto_reseed_per_run, reseed_key);
        let spatial = SpatialHash::new(config.spatial_cell_side());
        let metrics = MetricsLog::new(config.metrics_ring_capacity);
        let mut world = Self {
            current_tick: 0,
            config,
            hormones: GlobalHormones::new(),
            neurons: BTreeMap::new(),
            synapses: BTreeMap::new(),
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
            event_queue: EventQueue::new(),
            spatial,
            node_ids: IdCounter::starting_at(1),
            synapse_ids: IdCounter::starting_at(1),
            event_ids: IdCounter::starting_at(1),
            rng,
            genome_text,
            genome,
            accumulators: AccumulatorBank::new(),
            per_source: std::collections::HashMap::new(),
            metrics,
        };
        world.run_genesis()?;
        Ok(world)
    }

    fn run_genesis(&mut self) -> Result<()> {
        let root = self
            .genome
            .gene(GENE_GENESIS)
            .cloned()
            .ok_or(hidra_hgl::HglError::MissingGenesis)?;
        let mut ctx = GeneExecCtx {
            world: self,
            invoking: None,
        };
        hidra_hgl::execute_gene(GENE_GENESIS, &root, &mut ctx)?;
        Ok(())
    }

    // ---- graph mutation primitives, shared by the gene context and the external API ----

    fn create_neuron(&mut self, position: [f32; 3], brain: Brain) -> NodeId {
        let id = self.node_ids.fetch_add();
        let neuron = Neuron::new(
            id,
            position,
            brain,
            self.config.default_firing_threshold,
            self.config.default_decay_rate,
            self.config.default_refractory_period,
        );
        self.spatial.insert(id, position);
        self.neurons.insert(id, neuron);
        id
    }

    fn create_synapse(
        &mut self,
        source: NodeId,
        target: NodeId,
        signal_type: SignalType,
        weight: f32,
        parameter: f32,
    ) -> Option<SynapseId> {
        if !self.node_exists(source) || !self.node_exists(target) {
            log::warn!("refusing to wire synapse between unknown nodes {source} -> {target}");
            return None;
        }
        let id = self.synapse_ids.fetch_add();
        let synapse = Synapse::new(id, source, target, signal_type, weight, parameter);
        self.synapses.insert(id, synapse);
        Some(id)
    }

    fn node_exists(&self, id: NodeId) -> bool {
        self.neurons.get(&id).map(|n| n.is_active).unwrap_or(false)
            || self.inputs.contains_key(&id)
            || self.outputs.contains_key(&id)
    }

    fn deactivate_neuron(&mut self, id: NodeId) {
        if let Some(neuron) = self.neurons.get_mut(&id) {
            if neuron.is_active {
                neuron.is_active = false;
                self.spatial.remove(id);
            }
        }
        for synapse in self.synapses.values_mut() {
            if synapse.source == id || synapse.target == id {
                synapse.is_active = false;
            }
        }
    }

    // ---- the tick pipeline ----

    /// Advance the world by exactly one tick.
    pub fn step(&mut self) {
        self.current_tick += 1; // 1. advance clock

        self.accumulators.clear(); // 2. prepare accumulators
        self.per_source.clear();
        for neuron in self.neurons.values_mut().filter(|n| n.is_active) {
            neuron.set_lvar(lvar::DENDRITIC_POTENTIAL, 0.0);
        }

        self.synapse_pass(); // 3.

        let due = self.event_queue.drain_due(self.current_tick);
        let mut structural = Vec::new();
        for event in due {
            // 4. deliver DelayedSignal events due now; everything else
            // (ExecuteGene/Mitosis/Apoptosis/Fire) waits for the structural
            // drain below, after neuron integration has run.
            if matches!(event.event_type, EventType::DelayedSignal) {
                self.deliver_delayed_signal(&event);
            } else {
                structural.push(event);
            }
        }

        self.neuron_integration(); // 5.

        // Fold the apoptosis events neuron integration just scheduled for
        // this same tick in with whatever structural work was carried over
        // from the delayed-signal drain above, so everything due at
        // `current_tick` lands in a single ordered batch.
        structural.extend(self.event_queue.drain_due(self.current_tick));
        structural.sort_by_key(|e| (e.execution_tick, e.id));
        self.structural_drain(structural); // 6.

        self.refresh_outputs(); // 7.
        self.sample_metrics(); // 8.
        // 9. RNG state lives in `self.rng` by value; nothing further to persist
        // mid-tick. Snapshotting (component J) captures it as part of `WorldSnapshot`.
    }

    fn synapse_pass(&mut self) {
        let ids: Vec<SynapseId> = self.synapses.keys().copied().collect();
        for id in ids {
            self.dispatch_synapse(id);
        }
    }

    fn dispatch_synapse(&mut self, id: SynapseId) {
        let Some(synapse) = self.synapses.get(&id).cloned() else {
            return;
        };
        if !synapse.is_active {
            return;
        }

        let source_value = self.resolve_source_value(synapse.source);
        let dispatched = match &synapse.condition {
            Some(condition) => {
                let ctx = SynapseConditionCtx {
                    world: &*self,
                    source: synapse.source,
                    target: synapse.target,
                };
                condition.evaluate(&ctx)
            }
            None => true,
        };

        let effective = source_value * synapse.effective_weight();
        let signal_nonzero = dispatched && effective != 0.0;

        if dispatched {
            match synapse.signal_type {
                SignalType::Immediate => self.deposit(synapse.target, effective, id),
                SignalType::Continuous => self.apply_continuous(synapse.target, effective, synapse.parameter),
                SignalType::Delayed => {
                    if synapse.parameter.round() <= 0.0 {
                        self.deposit(synapse.target, effective, id);
                    } else {
                        let delay = synapse.parameter.round() as u64;
                        let event_id = self.event_ids.fetch_add();
                        self.event_queue.push(Event::new(
                            event_id,
                            EventType::DelayedSignal,
                            synapse.target,
                            self.current_tick + delay,
                            EventPayload::Signal {
                                value: effective,
                                source_synapse: id,
                            },
                        ));
                    }
                }
            }
        }

        if let Some(synapse) = self.synapses.get_mut(&id) {
            if signal_nonzero {
                synapse.fatigue.record_dispatch();
            } else {
                synapse.fatigue.recover();
            }
        }
    }

    fn resolve_source_value(&self, source: NodeId) -> f32 {
        if let Some(input) = self.inputs.get(&source) {
            input.value
        } else if let Some(neuron) = self.neurons.get(&source).filter(|n| n.is_active) {
            if neuron.fired_prev_tick {
                1.0
            } else {
                0.0
            }
        } else {
            0.0
        }
    }

    fn deposit(&mut self, target: NodeId, value: f32, source_synapse: SynapseId) {
        let _ = source_synapse;
        if self.neurons.get(&target).map(|n| n.is_active).unwrap_or(false) {
            self.accumulators.add(target, value);
            self.per_source.entry(target).or_default().push(value);
        } else if let Some(output) = self.outputs.get_mut(&target) {
            output.value = value;
        }
    }

    fn apply_continuous(&mut self, target: NodeId, value: f32, parameter: f32) {
        if let Some(neuron) = self.neurons.get_mut(&target).filter(|n| n.is_active) {
            neuron.apply_continuous_signal(value, parameter);
        } else if let Some(output) = self.outputs.get_mut(&target) {
            output.value = output.value * (1.0 - parameter) + value * parameter;
        }
    }

    fn deliver_delayed_signal(&mut self, event: &Event) {
        if let EventPayload::Signal { value, source_synapse } = event.payload {
            self.deposit(event.target, value, source_synapse);
        }
    }

    fn neuron_integration(&mut self) {
        let ids: Vec<NodeId> = self.neurons.iter().filter(|(_, n)| n.is_active).map(|(id, _)| *id).collect();
        for id in ids {
            self.integrate_neuron(id);
        }
    }

    fn integrate_neuron(&mut self, id: NodeId) {
        let dendritic = self.accumulators.total(id);
        let per_source = self.per_source.get(&id).cloned().unwrap_or_default();

        let Some(neuron) = self.neurons.get_mut(&id).filter(|n| n.is_active) else {
            return;
        };
        neuron.set_lvar(lvar::DENDRITIC_POTENTIAL, dendritic);

        let decay_rate = neuron.lvar(lvar::DECAY_RATE);
        let soma = neuron.lvar(lvar::SOMA_POTENTIAL) * decay_rate + dendritic;
        neuron.set_lvar(lvar::SOMA_POTENTIAL, soma);

        let health = neuron.lvar(lvar::HEALTH) - self.config.metabolic_tax_per_tick;
        neuron.set_lvar(lvar::HEALTH, health);
        neuron.set_lvar(lvar::AGE, neuron.lvar(lvar::AGE) + 1.0);

        let recovery = neuron.lvar(lvar::THRESHOLD_RECOVERY_RATE);
        let adaptive = (neuron.lvar(lvar::ADAPTIVE_THRESHOLD) - recovery).max(0.0);
        neuron.set_lvar(lvar::ADAPTIVE_THRESHOLD, adaptive);

        let refractory_left = neuron.lvar(lvar::REFRACTORY_TIME_LEFT);
        if refractory_left > 0.0 {
            neuron.set_lvar(lvar::REFRACTORY_TIME_LEFT, refractory_left - 1.0);
        }

        if health <= 0.0 {
            neuron.fired_prev_tick = false;
            let event_id = self.event_ids.fetch_add();
            self.event_queue.push(Event::new(
                event_id,
                EventType::Apoptosis,
                id,
                self.current_tick,
                EventPayload::None,
            ));
            return;
        }

        let effective_threshold = neuron.effective_threshold();
        let soma = neuron.lvar(lvar::SOMA_POTENTIAL);
        let will_fire = refractory_left <= 0.0 && soma > effective_threshold;

        if will_fire {
            let mut brain = neuron.brain.clone();
            let output = brain.evaluate(dendritic, &per_source);
            let neuron = self.neurons.get_mut(&id).expect("neuron present");
            neuron.brain = brain;
            neuron.set_lvar(lvar::SOMA_POTENTIAL, output.soma_override.unwrap_or(0.0));
            for (index, value) in output.lvar_writes {
                neuron.set_lvar(index, value);
            }
            neuron.set_lvar(lvar::REFRACTORY_TIME_LEFT, neuron.lvar(lvar::REFRACTORY_PERIOD));
            let adaptation = neuron.lvar(lvar::THRESHOLD_ADAPTATION_FACTOR);
            neuron.set_lvar(lvar::ADAPTIVE_THRESHOLD, neuron.lvar(lvar::ADAPTIVE_THRESHOLD) + adaptation);
            let rate = neuron.lvar(lvar::FIRING_RATE);
            neuron.set_lvar(lvar::FIRING_RATE, rate * (1.0 - FIRING_RATE_SMOOTHING) + FIRING_RATE_SMOOTHING);
            neuron.fired_prev_tick = true;

            let event_id = self.event_ids.fetch_add();
            self.event_queue.push(Event::new(
                event_id,
                EventType::Fire,
                id,
                self.current_tick,
                EventPayload::None,
            ));
        } else {
            let neuron = self.neurons.get_mut(&id).expect("neuron present");
            let rate = neuron.lvar(lvar::FIRING_RATE);
            neuron.set_lvar(lvar::FIRING_RATE, rate * (1.0 - FIRING_RATE_SMOOTHING));
            neuron.fired_prev_tick = false;
        }
    }

    fn structural_drain(&mut self, due: Vec<Event>) {
        const MAX_STRUCTURAL_EVENTS: usize = 10_000;
        if due.len() > MAX_STRUCTURAL_EVENTS {
            log::error!(
                "structural mutation cycle suspected at tick {}: {} events due, aborting remainder",
                self.current_tick,
                due.len()
            );
            return;
        }
        for event in due {
            match event.event_type {
                EventType::ExecuteGene => {
                    if let EventPayload::Gene { gene_id } = event.payload {
                        self.run_gene(gene_id, Some(event.target).filter(|t| *t != NodeId::WORLD));
                    }
                }
                EventType::Mitosis => self.perform_mitosis(event),
                EventType::Apoptosis => self.deactivate_neuron(event.target),
                EventType::DelayedSignal | EventType::Fire => {}
            }
        }
    }

    fn run_gene(&mut self, gene_id: usize, invoking: Option<NodeId>) {
        let Some(root) = self.genome.gene(gene_id).cloned() else {
            log::error!("gene {gene_id} does not exist in the compiled genome");
            return;
        };
        let mut ctx = GeneExecCtx {
            world: self,
            invoking,
        };
        if let Err(err) = hidra_hgl::execute_gene(gene_id, &root, &mut ctx) {
            log::error!("gene {gene_id} execution failed: {err}");
        }
    }

    fn perform_mitosis(&mut self, event: Event) {
        let EventPayload::MitosisOffset { dx, dy, dz } = event.payload else {
            return;
        };
        let Some(parent) = self.neurons.get(&event.target).filter(|n| n.is_active) else {
            log::debug!("mitosis target {} no longer exists", event.target);
            return;
        };
        let position = [parent.position[0] + dx, parent.position[1] + dy, parent.position[2] + dz];
        let brain = parent.brain.clone();
        let child_id = self.create_neuron(position, brain);
        self.run_gene(GENE_GESTATION, Some(child_id));
    }

    fn refresh_outputs(&mut self) {
        // Output values are written synchronously as synapses dispatch (step 3)
        // and as delayed signals land (step 4); nothing further changes them
        // by the time structural mutation has finished, so this is a no-op
        // placeholder kept for parity with the documented pipeline stage.
    }

    fn sample_metrics(&mut self) {
        if !self.config.metrics_enabled {
            return;
        }
        let ids: Vec<NodeId> = self.neurons.iter().filter(|(_, n)| n.is_active).map(|(id, _)| *id).collect();
        let mut neuron_samples = Vec::new();
        let active_neuron_count = ids.len();
        for id in ids {
            let draw = self.rng_metrics_sample();
            if draw <= self.config.metrics_neuron_sample_rate {
                let neuron = &self.neurons[&id];
                let lvars = self
                    .config
                    .metrics_lvar_indices
                    .iter()
                    .map(|&idx| (idx, neuron.lvar(idx)))
                    .collect();
                neuron_samples.push(NeuronSample { id: neuron.id, lvars });
            }
        }
        let sample = MetricsSample {
            tick: self.current_tick,
            active_neuron_count,
            active_synapse_count: self.synapses.values().filter(|s| s.is_active).count(),
            neuron_samples,
        };
        self.metrics.push(sample);
    }

    fn rng_metrics_sample(&mut self) -> f32 {
        self.rng.metrics().next_f32()
    }

    // ---- snapshot codec (component J) ----

    fn to_snapshot(&self) -> WorldSnapshot {
        let (sim_state, metrics_state) = self.rng.state();
        WorldSnapshot {
            current_tick: self.current_tick,
            config: self.config.clone(),
            hormones: self.hormones,
            neurons: self.neurons.clone(),
            synapses: self.synapses.clone(),
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
            event_queue: self.event_queue.clone(),
            node_id_counter: self.node_ids.peek(),
            synapse_id_counter: self.synapse_ids.peek(),
            event_id_counter: self.event_ids.peek(),
            rng_sim_state: sim_state,
            rng_metrics_state: metrics_state,
            metrics: self.metrics.clone(),
        }
    }

    /// Restore from a snapshot plus the genome text the caller stored alongside it.
    /// The genome is never embedded in the snapshot document itself (spec'd
    /// explicitly so genome and world-state evolution can be diffed/versioned
    /// independently).
    fn from_snapshot(snapshot: WorldSnapshot, genome_text: impl Into<String>) -> Result<Self> {
        snapshot.config.validate()?;
        let genome_text = genome_text.into();
        let parsed = hidra_hgl::parse_genome_text(&genome_text)?;
        let genome = hidra_hgl::compile_genome(&parsed)?;
        let mut rng = DeterministicRng::new(0, 0, false, "");
        rng.set_state(snapshot.rng_sim_state, snapshot.rng_metrics_state);
        let mut spatial = SpatialHash::new(snapshot.config.spatial_cell_side());
        spatial.rebuild(snapshot.neurons.values().filter(|n| n.is_active).map(|n| (n.id, n.position)));
        Ok(Self {
            current_tick: snapshot.current_tick,
            config: snapshot.config,
            hormones: snapshot.hormones,
            neurons: snapshot.neurons,
            synapses: snapshot.synapses,
            inputs: snapshot.inputs,
            outputs: snapshot.outputs,
            event_queue: snapshot.event_queue,
            spatial,
            node_ids: IdCounter::starting_at(snapshot.node_id_counter),
            synapse_ids: IdCounter::starting_at(snapshot.synapse_id_counter),
            event_ids: IdCounter::starting_at(snapshot.event_id_counter),
            rng,
            genome_text,
            genome,
            accumulators: AccumulatorBank::new(),
            per_source: std::collections::HashMap::new(),
            metrics: snapshot.metrics,
        })
    }
}

/// A synapse condition's read-only view into source/target LVars and hormones.
struct SynapseConditionCtx<'w> {
    world: &'w WorldState,
    source: NodeId,
    target: NodeId,
}

impl ConditionContext for SynapseConditionCtx<'_> {
    fn source_lvar(&self, index: u8) -> f32 {
        self.world.neurons.get(&self.source).map(|n| n.lvar(index)).unwrap_or(0.0)
    }
    fn target_lvar(&self, index: u8) -> f32 {
        self.world.neurons.get(&self.target).map(|n| n.lvar(index)).unwrap_or(0.0)
    }
    fn hormone(&self, index: u8) -> f32 {
        self.world.hormones.get(index)
    }
    fn current_tick(&self) -> u64 {
        self.world.current_tick
    }
}

/// The world-mutation surface a running gene executes against.
///
/// `add_neuron`/`add_synapse`/`remove_synapse`/`set_self_lvar`/`set_hormone`
/// apply immediately: gene execution only ever happens during the
/// structural event drain (stage 6), after every per-tick iteration over
/// neurons and synapses has already completed, so an immediate insert or
/// removal cannot invalidate an in-flight iterator. Mitosis and apoptosis
/// requests are deliberately deferred to `current_tick + 1` instead: both
/// would otherwise need to re-enter the very drain that is invoking the
/// gene, which is exactly the structural-mutation cycle the pipeline's
/// failure semantics call out as rejected.
struct GeneExecCtx<'w> {
    world: &'w mut WorldState,
    invoking: Option<NodeId>,
}

impl HglContext for GeneExecCtx<'_> {
    fn self_lvar(&self, index: u8) -> f32 {
        self.invoking.and_then(|id| self.world.neurons.get(&id)).map(|n| n.lvar(index)).unwrap_or(0.0)
    }

    fn set_self_lvar(&mut self, index: u8, value: f32) {
        if let Some(id) = self.invoking {
            if let Some(neuron) = self.world.neurons.get_mut(&id) {
                neuron.set_lvar(index, value);
            }
        }
    }

    fn hormone(&self, index: u8) -> f32 {
        self.world.hormones.get(index)
    }

    fn set_hormone(&mut self, index: u8, value: f32) {
        self.world.hormones.set(index, value);
    }

    fn rng_uniform01(&mut self) -> f32 {
        self.world.rng.sim().next_f32()
    }

    fn add_neuron(&mut self, dx: f32, dy: f32, dz: f32) {
        let base = self
            .invoking
            .and_then(|id| self.world.neurons.get(&id))
            .map(|n| n.position)
            .unwrap_or([0.0, 0.0, 0.0]);
        let brain = self
            .invoking
            .and_then(|id| self.world.neurons.get(&id))
            .map(|n| n.brain.clone())
            .unwrap_or(Brain::PassThrough);
        let position = [base[0] + dx, base[1] + dy, base[2] + dz];
        self.world.create_neuron(position, brain);
    }

    fn add_synapse(&mut self, source: u64, target: u64, signal: HglSignalKind, weight: f32, parameter: f32) {
        let signal_type = match signal {
            HglSignalKind::Immediate => SignalType::Immediate,
            HglSignalKind::Delayed => SignalType::Delayed,
            HglSignalKind::Continuous => SignalType::Continuous,
        };
        self.world.create_synapse(NodeId::new(source), NodeId::new(target), signal_type, weight, parameter);
    }

    fn remove_synapse(&mut self, synapse_id: u64) {
        if let Some(synapse) = self.world.synapses.get_mut(&SynapseId::new(synapse_id)) {
            synapse.is_active = false;
        }
    }

    fn enqueue_mitosis(&mut self, dx: f32, dy: f32, dz: f32) {
        let Some(id) = self.invoking else {
            log::warn!("EnqueueMitosis called outside of a neuron-scoped gene; ignored");
            return;
        };
        let event_id = self.world.event_ids.fetch_add();
        self.world.event_queue.push(Event::new(
            event_id,
            EventType::Mitosis,
            id,
            self.world.current_tick + 1,
            EventPayload::MitosisOffset { dx, dy, dz },
        ));
    }

    fn enqueue_apoptosis(&mut self) {
        let Some(id) = self.invoking else {
            log::warn!("EnqueueApoptosis called outside of a neuron-scoped gene; ignored");
            return;
        };
        let event_id = self.world.event_ids.fetch_add();
        self.world.event_queue.push(Event::new(
            event_id,
            EventType::Apoptosis,
            id,
            self.world.current_tick + 1,
            EventPayload::None,
        ));
    }
}

/// A cheaply clone-able handle to a running world. Every method takes the
/// single world-level lock for the duration of the call; there is no
/// separate queue lock to reason about since the queue lives inside
/// [`WorldState`] itself.
#[derive(Clone)]
pub struct HidraWorld(Arc<Mutex<WorldState>>);

impl HidraWorld {
    /// Build a new world from configuration and genome text, running Genesis once.
    pub fn new(config: HidraConfig, genome_text: impl Into<String>, reseed_key: &str) -> Result<Self> {
        let state = WorldState::new(config, genome_text.into(), reseed_key)?;
        Ok(Self(Arc::new(Mutex::new(state))))
    }

    /// Restore a world from a snapshot envelope's JSON text, paired with the
    /// genome text the caller stored alongside it (the snapshot itself never
    /// embeds the genome).
    pub fn from_snapshot_json(text: &str, genome_text: impl Into<String>) -> Result<Self> {
        let envelope: SnapshotEnvelope<WorldSnapshot> = SnapshotEnvelope::from_json(text)?;
        let state = WorldState::from_snapshot(envelope.payload, genome_text)?;
        Ok(Self(Arc::new(Mutex::new(state))))
    }

    /// Serialize this world's current state to a snapshot envelope's JSON text.
    pub fn to_snapshot_json(&self) -> Result<String> {
        let world = self.0.lock();
        let envelope = SnapshotEnvelope::new(world.to_snapshot());
        Ok(envelope.to_json()?)
    }

    /// Advance the simulation by one tick.
    pub fn step(&self) {
        self.0.lock().step();
    }

    /// The current tick counter.
    pub fn current_tick(&self) -> u64 {
        self.0.lock().current_tick
    }

    /// Add a neuron at `position` with a given brain. Safe to call from many
    /// threads concurrently: each call takes the world lock for its duration.
    pub fn add_neuron(&self, position: [f32; 3], brain: Brain) -> NodeId {
        self.0.lock().create_neuron(position, brain)
    }

    /// Wire a synapse between two existing nodes.
    pub fn add_synapse(
        &self,
        source: NodeId,
        target: NodeId,
        signal_type: SignalType,
        weight: f32,
        parameter: f32,
    ) -> Result<SynapseId> {
        let mut world = self.0.lock();
        world
            .create_synapse(source, target, signal_type, weight, parameter)
            .ok_or_else(|| EngineError::ArgumentError("source or target node does not exist".into()))
    }

    /// Attach a gating condition to an existing synapse.
    pub fn set_synapse_condition(&self, id: SynapseId, condition: Option<Condition>) -> Result<()> {
        let mut world = self.0.lock();
        let synapse = world.synapses.get_mut(&id).ok_or_else(|| EngineError::synapse_not_found(id))?;
        synapse.condition = condition;
        Ok(())
    }

    /// Deactivate and remove a synapse.
    pub fn remove_synapse(&self, id: SynapseId) -> Result<()> {
        let mut world = self.0.lock();
        world.synapses.remove(&id).ok_or_else(|| EngineError::synapse_not_found(id))?;
        Ok(())
    }

    /// Immediately apoptose a neuron (outside the tick pipeline, e.g. from tooling).
    pub fn remove_neuron(&self, id: NodeId) -> Result<()> {
        let mut world = self.0.lock();
        if !world.neurons.get(&id).map(|n| n.is_active).unwrap_or(false) {
            return Err(EngineError::node_not_found(id));
        }
        world.deactivate_neuron(id);
        Ok(())
    }

    /// Create a new input node.
    pub fn add_input_node(&self) -> NodeId {
        let mut world = self.0.lock();
        let id = world.node_ids.fetch_add();
        world.inputs.insert(id, InputNode::new(id));
        id
    }

    /// Create a new output node.
    pub fn add_output_node(&self) -> NodeId {
        let mut world = self.0.lock();
        let id = world.node_ids.fetch_add();
        world.outputs.insert(id, OutputNode::new(id));
        id
    }

    /// Stage a value on an input node, to be read by synapses on the next step.
    pub fn stage_input(&self, id: NodeId, value: f32) -> Result<()> {
        let mut world = self.0.lock();
        let input = world.inputs.get_mut(&id).ok_or_else(|| EngineError::node_not_found(id))?;
        input.value = value;
        Ok(())
    }

    /// Read an output node's current value.
    pub fn read_output(&self, id: NodeId) -> Result<f32> {
        let world = self.0.lock();
        world.outputs.get(&id).map(|o| o.value).ok_or_else(|| EngineError::node_not_found(id))
    }

    /// Write a batch of input-node values (`Activity::step`'s `SetInputValues`).
    pub fn set_input_values(&self, values: &std::collections::HashMap<NodeId, f32>) -> Result<()> {
        let mut world = self.0.lock();
        for (id, value) in values {
            let input = world.inputs.get_mut(id).ok_or_else(|| EngineError::node_not_found(*id))?;
            input.value = *value;
        }
        Ok(())
    }

    /// Read a batch of output-node values (`Activity::step`'s `GetOutputValues`).
    pub fn output_values(&self, ids: &[NodeId]) -> Result<std::collections::HashMap<NodeId, f32>> {
        let world = self.0.lock();
        ids.iter()
            .map(|id| world.outputs.get(id).map(|o| (*id, o.value)).ok_or_else(|| EngineError::node_not_found(*id)))
            .collect()
    }

    /// Stage a batch of inputs and advance one tick atomically under a single lock acquisition.
    pub fn stage_inputs_and_step(&self, values: &[(NodeId, f32)]) -> Result<()> {
        let mut world = self.0.lock();
        for (id, value) in values {
            let input = world.inputs.get_mut(id).ok_or_else(|| EngineError::node_not_found(*id))?;
            input.value = *value;
        }
        world.step();
        Ok(())
    }

    /// Directly set a neuron's LVar (tooling/inspection use; genes use the same
    /// primitive internally through [`HglContext`]).
    pub fn set_neuron_lvar(&self, id: NodeId, index: u8, value: f32) -> Result<()> {
        let mut world = self.0.lock();
        let neuron = world.neurons.get_mut(&id).filter(|n| n.is_active).ok_or_else(|| EngineError::node_not_found(id))?;
        neuron.set_lvar(index, value);
        Ok(())
    }

    /// Read a neuron's LVar.
    pub fn neuron_lvar(&self, id: NodeId, index: u8) -> Result<f32> {
        let world = self.0.lock();
        world
            .neurons
            .get(&id)
            .filter(|n| n.is_active)
            .map(|n| n.lvar(index))
            .ok_or_else(|| EngineError::node_not_found(id))
    }

    /// Directly set a global hormone level.
    pub fn set_hormone(&self, index: u8, value: f32) {
        self.0.lock().hormones.set(index, value);
    }

    /// Read a global hormone level.
    pub fn hormone(&self, index: u8) -> f32 {
        self.0.lock().hormones.get(index)
    }

    /// Number of currently active neurons.
    pub fn neuron_count(&self) -> usize {
        self.0.lock().neurons.values().filter(|n| n.is_active).count()
    }

    /// Every node ID currently within `radius` of `position`.
    pub fn query_nearby(&self, position: [f32; 3], radius: f32) -> Vec<NodeId> {
        let state = self.0.lock();
        let radius_sq = radius * radius;
        state
            .spatial
            .candidates(position, radius)
            .into_iter()
            .filter(|id| {
                state.spatial.position_of(*id).map_or(false, |p| {
                    let d2 = (p[0] - position[0]).powi(2)
                        + (p[1] - position[1]).powi(2)
                        + (p[2] - position[2]).powi(2);
                    d2 <= radius_sq
                })
            })
            .collect()
    }

    /// The most recent metrics sample, if metrics are enabled and at least one tick has run.
    pub fn latest_metrics(&self) -> Option<MetricsSample> {
        self.0.lock().metrics.latest().cloned()
    }

    /// Schedule a gene to run against `target` (or the world itself, via
    /// [`NodeId::WORLD`]) after `delay_ticks` (minimum 1 tick out).
    pub fn schedule_gene(&self, gene_id: usize, target: NodeId, delay_ticks: u64) {
        let mut world = self.0.lock();
        let event_id = world.event_ids.fetch_add();
        let tick = world.current_tick + delay_ticks.max(1);
        world.event_queue.push(Event::new(event_id, EventType::ExecuteGene, target, tick, EventPayload::Gene { gene_id }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nop_genome() -> String {
        "00".to_string()
    }

    #[test]
    fn genesis_must_be_present() {
        let config = HidraConfig::default();
        let result = WorldState::new(config, String::new(), "test");
        assert!(result.is_err());
    }

    #[test]
    fn empty_genesis_world_has_no_neurons() {
        let config = HidraConfig::default();
        let world = HidraWorld::new(config, nop_genome(), "test").expect("build world");
        assert_eq!(world.neuron_count(), 0);
    }

    #[test]
    fn add_neuron_then_step_does_not_panic() {
        let config = HidraConfig::default();
        let world = HidraWorld::new(config, nop_genome(), "test").expect("build world");
        world.add_neuron([0.0, 0.0, 0.0], Brain::PassThrough);
        world.step();
        assert_eq!(world.current_tick(), 1);
    }

    #[test]
    fn immediate_signal_raises_soma_and_fires() {
        let config = HidraConfig {
            default_firing_threshold: 0.5,
            default_decay_rate: 0.0,
            ..HidraConfig::default()
        };
        let world = HidraWorld::new(config, nop_genome(), "test").expect("build world");
        let input = world.add_input_node();
        let target = world.add_neuron([0.0, 0.0, 0.0], Brain::PassThrough);
        world.add_synapse(input, target, SignalType::Immediate, 1.0, 0.0).expect("wire");
        world.stage_input(input, 1.0).expect("stage");
        world.step();
        assert_eq!(world.neuron_lvar(target, lvar::REFRACTORY_TIME_LEFT).unwrap(), world.neuron_lvar(target, lvar::REFRACTORY_PERIOD).unwrap());
    }

    #[test]
    fn delayed_signal_materializes_on_the_exact_tick() {
        let config = HidraConfig {
            default_firing_threshold: 100.0,
            ..HidraConfig::default()
        };
        let world = HidraWorld::new(config, nop_genome(), "test").expect("build world");
        let input = world.add_input_node();
        let target = world.add_neuron([0.0, 0.0, 0.0], Brain::PassThrough);
        world.add_synapse(input, target, SignalType::Delayed, 1.0, 3.0).expect("wire");
        world.stage_input(input, 1.0).expect("stage");
        world.step(); // tick 1: schedules delivery for tick 4
        world.stage_input(input, 0.0).expect("stage");
        world.step(); // tick 2
        assert_eq!(world.neuron_lvar(target, lvar::DENDRITIC_POTENTIAL).unwrap(), 0.0);
        world.step(); // tick 3
        assert_eq!(world.neuron_lvar(target, lvar::DENDRITIC_POTENTIAL).unwrap(), 0.0);
        world.step(); // tick 4: delivered
        assert_eq!(world.neuron_lvar(target, lvar::DENDRITIC_POTENTIAL).unwrap(), 1.0);
    }

    #[test]
    fn apoptosis_reclaims_from_the_spatial_hash_in_one_step() {
        let config = HidraConfig {
            metabolic_tax_per_tick: 2.0,
            ..HidraConfig::default()
        };
        let world = HidraWorld::new(config, nop_genome(), "test").expect("build world");
        let id = world.add_neuron([1.0, 1.0, 1.0], Brain::PassThrough);
        assert_eq!(world.query_nearby([1.0, 1.0, 1.0], 0.1), vec![id]);
        world.step();
        assert!(world.query_nearby([1.0, 1.0, 1.0], 0.1).is_empty());
        assert_eq!(world.neuron_count(), 0);
    }

    #[test]
    fn snapshot_round_trips_tick_and_graph() {
        let config = HidraConfig::default();
        let world = HidraWorld::new(config, nop_genome(), "test").expect("build world");
        world.add_neuron([2.0, 0.0, 0.0], Brain::PassThrough);
        world.step();
        world.step();
        let bytes = world.to_snapshot_json().expect("snapshot");
        let restored = HidraWorld::from_snapshot_json(&bytes, nop_genome()).expect("restore");
        assert_eq!(restored.current_tick(), world.current_tick());
        assert_eq!(restored.neuron_count(), world.neuron_count());
    }

    #[test]
    fn determinism_under_identical_seeds() {
        let config = HidraConfig::default();
        let a = HidraWorld::new(config.clone(), nop_genome(), "same-key").expect("build");
        let b = HidraWorld::new(config, nop_genome(), "same-key").expect("build");
        let an = a.add_neuron([0.0, 0.0, 0.0], Brain::PassThrough);
        let bn = b.add_neuron([0.0, 0.0, 0.0], Brain::PassThrough);
        for _ in 0..50 {
            a.step();
            b.step();
        }
        assert_eq!(a.neuron_lvar(an, lvar::SOMA_POTENTIAL).unwrap(), b.neuron_lvar(bn, lvar::SOMA_POTENTIAL).unwrap());
    }

    #[test]
    fn scheduled_gene_runs_on_the_requested_tick() {
        // Gene 1: SetHormone(7, Const(3.0))
        let genome = "00GN31070100004040".to_string();
        let config = HidraConfig::default();
        let world = HidraWorld::new(config, genome, "test").expect("build world");
        world.schedule_gene(1, NodeId::WORLD, 2);
        world.step();
        assert_eq!(world.hormone(7), 0.0);
        world.step();
        assert_eq!(world.hormone(7), 3.0);
    }

    #[test]
    fn concurrent_add_neuron_is_safe() {
        use std::thread;
        let config = HidraConfig::default();
        let world = HidraWorld::new(config, nop_genome(), "test").expect("build world");
        let handles: Vec<_> = (0..100)
            .map(|i| {
                let world = world.clone();
                thread::spawn(move || {
                    world.add_neuron([i as f32, 0.0, 0.0], Brain::PassThrough);
                })
            })
            .collect();
        for h in handles {
            h.join().expect("thread panicked");
        }
        assert_eq!(world.neuron_count(), 100);
    }
}

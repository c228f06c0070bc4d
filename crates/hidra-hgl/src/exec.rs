//! Gene execution: evaluates a compiled [`GeneNode`] tree against a world.
//!
//! The interpreter is deliberately tree-walking rather than a flat VM,
//! mirroring the teacher's `compile_module`/lowering pass that walks a NIR
//! `Module`'s operations and dispatches on `(dialect, name, version)`
//! (`shnn-compiler/src/lib.rs`). Here the dispatch key is simply `GeneOp`.

use crate::ast::{GeneNode, GeneOp, GeneOperand, SignalKind};
use crate::error::{HglError, Result};

/// The world-mutation and read surface a gene executes against.
///
/// Implemented by `hidra-engine`'s world state. Mutation requests that
/// would violate in-tick invariants (Mitosis, Apoptosis) are queued by the
/// implementation for next-tick materialization rather than applied
/// synchronously, per the tick pipeline's event-drain contract.
pub trait HglContext {
    /// Read the invoking neuron's LVar at `index`. Returns 0.0 if there is no invoking neuron.
    fn self_lvar(&self, index: u8) -> f32;

    /// Write the invoking neuron's LVar at `index`. No-op if there is no invoking neuron.
    fn set_self_lvar(&mut self, index: u8, value: f32);

    /// Read a global hormone slot.
    fn hormone(&self, index: u8) -> f32;

    /// Write a global hormone slot.
    fn set_hormone(&mut self, index: u8, value: f32);

    /// Draw a uniform `[0, 1)` sample from the simulation RNG stream.
    fn rng_uniform01(&mut self) -> f32;

    /// Request a new neuron at an offset from the invoking neuron's position.
    fn add_neuron(&mut self, dx: f32, dy: f32, dz: f32);

    /// Request a new synapse between two node IDs (truncated to `u64` from the gene's f32 operands).
    fn add_synapse(&mut self, source: u64, target: u64, signal: SignalKind, weight: f32, parameter: f32);

    /// Request removal of a synapse by ID.
    fn remove_synapse(&mut self, synapse_id: u64);

    /// Queue mitosis of the invoking neuron at an offset from its position.
    fn enqueue_mitosis(&mut self, dx: f32, dy: f32, dz: f32);

    /// Queue apoptosis of the invoking neuron.
    fn enqueue_apoptosis(&mut self);
}

/// Bound on total node visits per gene execution, guarding against pathological
/// (but not infinite, since `Loop` always carries a finite cap) gene trees.
const MAX_NODE_VISITS: u64 = 1_000_000;

enum Flow {
    Normal(f32),
    Break,
}

struct Executor<'a, C: HglContext> {
    ctx: &'a mut C,
    gene_id: usize,
    visits: u64,
}

impl<'a, C: HglContext> Executor<'a, C> {
    fn bump(&mut self) -> Result<()> {
        self.visits += 1;
        if self.visits > MAX_NODE_VISITS {
            return Err(HglError::ExecutionBoundExceeded {
                gene_id: self.gene_id,
                reason: format!("exceeded {} node visits", MAX_NODE_VISITS),
            });
        }
        Ok(())
    }

    fn eval(&mut self, node: &GeneNode) -> Result<Flow> {
        self.bump()?;
        match node.op {
            GeneOp::Nop => Ok(Flow::Normal(0.0)),
            GeneOp::Const => match node.operand {
                GeneOperand::Const(v) => Ok(Flow::Normal(v)),
                _ => Ok(Flow::Normal(0.0)),
            },
            GeneOp::SelfLVar => match node.operand {
                GeneOperand::Index(idx) => Ok(Flow::Normal(self.ctx.self_lvar(idx))),
                _ => Ok(Flow::Normal(0.0)),
            },
            GeneOp::Hormone => match node.operand {
                GeneOperand::Index(idx) => Ok(Flow::Normal(self.ctx.hormone(idx))),
                _ => Ok(Flow::Normal(0.0)),
            },
            GeneOp::Random => Ok(Flow::Normal(self.ctx.rng_uniform01())),
            GeneOp::Add | GeneOp::Sub | GeneOp::Mul | GeneOp::Div | GeneOp::Gt | GeneOp::Lt
            | GeneOp::Eq | GeneOp::And | GeneOp::Or => {
                let lhs = self.eval_value(&node.children[0])?;
                let rhs = self.eval_value(&node.children[1])?;
                let result = match node.op {
                    GeneOp::Add => lhs + rhs,
                    GeneOp::Sub => lhs - rhs,
                    GeneOp::Mul => lhs * rhs,
                    GeneOp::Div => {
                        if rhs == 0.0 {
                            0.0
                        } else {
                            lhs / rhs
                        }
                    }
                    GeneOp::Gt => bool_f32(lhs > rhs),
                    GeneOp::Lt => bool_f32(lhs < rhs),
                    GeneOp::Eq => bool_f32((lhs - rhs).abs() < f32::EPSILON),
                    GeneOp::And => bool_f32(lhs != 0.0 && rhs != 0.0),
                    GeneOp::Or => bool_f32(lhs != 0.0 || rhs != 0.0),
                    _ => unreachable!(),
                };
                Ok(Flow::Normal(result))
            }
            GeneOp::Not => {
                let v = self.eval_value(&node.children[0])?;
                Ok(Flow::Normal(bool_f32(v == 0.0)))
            }
            GeneOp::Seq => {
                let mut last = 0.0;
                for stmt in &node.children {
                    match self.eval(stmt)? {
                        Flow::Normal(v) => last = v,
                        Flow::Break => return Ok(Flow::Break),
                    }
                }
                Ok(Flow::Normal(last))
            }
            GeneOp::If => {
                let cond = self.eval_value(&node.children[0])?;
                if cond != 0.0 {
                    self.eval(&node.children[1])
                } else {
                    Ok(Flow::Normal(0.0))
                }
            }
            GeneOp::Loop => {
                let body = &node.children[0];
                for _ in 0..node.loop_bound {
                    match self.eval(body)? {
                        Flow::Normal(_) => {}
                        Flow::Break => break,
                    }
                }
                Ok(Flow::Normal(0.0))
            }
            GeneOp::Break => Ok(Flow::Break),
            GeneOp::SetLVar => {
                let idx = index_operand(node)?;
                let v = self.eval_value(&node.children[0])?;
                self.ctx.set_self_lvar(idx, v);
                Ok(Flow::Normal(v))
            }
            GeneOp::SetHormone => {
                let idx = index_operand(node)?;
                let v = self.eval_value(&node.children[0])?;
                self.ctx.set_hormone(idx, v);
                Ok(Flow::Normal(v))
            }
            GeneOp::AddNeuron => {
                let dx = self.eval_value(&node.children[0])?;
                let dy = self.eval_value(&node.children[1])?;
                let dz = self.eval_value(&node.children[2])?;
                self.ctx.add_neuron(dx, dy, dz);
                Ok(Flow::Normal(0.0))
            }
            GeneOp::AddSynapse => {
                let signal = match node.operand {
                    GeneOperand::Signal(s) => s,
                    _ => SignalKind::Immediate,
                };
                let source = self.eval_value(&node.children[0])?;
                let target = self.eval_value(&node.children[1])?;
                let weight = self.eval_value(&node.children[2])?;
                let parameter = self.eval_value(&node.children[3])?;
                self.ctx.add_synapse(source as u64, target as u64, signal, weight, parameter);
                Ok(Flow::Normal(0.0))
            }
            GeneOp::RemoveSynapse => {
                let id = self.eval_value(&node.children[0])?;
                self.ctx.remove_synapse(id as u64);
                Ok(Flow::Normal(0.0))
            }
            GeneOp::EnqueueMitosis => {
                let dx = self.eval_value(&node.children[0])?;
                let dy = self.eval_value(&node.children[1])?;
                let dz = self.eval_value(&node.children[2])?;
                self.ctx.enqueue_mitosis(dx, dy, dz);
                Ok(Flow::Normal(0.0))
            }
            GeneOp::EnqueueApoptosis => {
                self.ctx.enqueue_apoptosis();
                Ok(Flow::Normal(0.0))
            }
        }
    }

    fn eval_value(&mut self, node: &GeneNode) -> Result<f32> {
        match self.eval(node)? {
            Flow::Normal(v) => Ok(v),
            Flow::Break => Ok(0.0),
        }
    }
}

fn bool_f32(b: bool) -> f32 {
    if b {
        1.0
    } else {
        0.0
    }
}

fn index_operand(node: &GeneNode) -> Result<u8> {
    match node.operand {
        GeneOperand::Index(idx) => Ok(idx),
        _ => Ok(0),
    }
}

/// Execute `gene_id`'s compiled tree against `ctx`.
///
/// Returns the root node's evaluated value (statements evaluate to their
/// last expression, matching [`GeneOp::Seq`]'s semantics); callers that only
/// care about side effects can discard it.
pub fn execute_gene<C: HglContext>(gene_id: usize, root: &GeneNode, ctx: &mut C) -> Result<f32> {
    let mut executor = Executor {
        ctx,
        gene_id,
        visits: 0,
    };
    match executor.eval(root)? {
        Flow::Normal(v) => Ok(v),
        Flow::Break => Ok(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::GeneNode;

    #[derive(Default)]
    struct FakeWorld {
        lvars: [f32; 256],
        hormones: [f32; 256],
        neurons_added: Vec<(f32, f32, f32)>,
        synapses_added: Vec<(u64, u64, SignalKind, f32, f32)>,
        removed_synapses: Vec<u64>,
        mitosis_requests: Vec<(f32, f32, f32)>,
        apoptosis_requested: bool,
        rng_value: f32,
    }

    impl HglContext for FakeWorld {
        fn self_lvar(&self, index: u8) -> f32 {
            self.lvars[index as usize]
        }
        fn set_self_lvar(&mut self, index: u8, value: f32) {
            self.lvars[index as usize] = value;
        }
        fn hormone(&self, index: u8) -> f32 {
            self.hormones[index as usize]
        }
        fn set_hormone(&mut self, index: u8, value: f32) {
            self.hormones[index as usize] = value;
        }
        fn rng_uniform01(&mut self) -> f32 {
            self.rng_value
        }
        fn add_neuron(&mut self, dx: f32, dy: f32, dz: f32) {
            self.neurons_added.push((dx, dy, dz));
        }
        fn add_synapse(&mut self, source: u64, target: u64, signal: SignalKind, weight: f32, parameter: f32) {
            self.synapses_added.push((source, target, signal, weight, parameter));
        }
        fn remove_synapse(&mut self, synapse_id: u64) {
            self.removed_synapses.push(synapse_id);
        }
        fn enqueue_mitosis(&mut self, dx: f32, dy: f32, dz: f32) {
            self.mitosis_requests.push((dx, dy, dz));
        }
        fn enqueue_apoptosis(&mut self) {
            self.apoptosis_requested = true;
        }
    }

    fn konst(v: f32) -> GeneNode {
        GeneNode::new(GeneOp::Const, GeneOperand::Const(v), vec![])
    }

    #[test]
    fn arithmetic_evaluates() {
        let tree = GeneNode::new(GeneOp::Add, GeneOperand::None, vec![konst(2.0), konst(3.0)]);
        let mut world = FakeWorld::default();
        let result = execute_gene(0, &tree, &mut world).expect("exec");
        assert_eq!(result, 5.0);
    }

    #[test]
    fn set_lvar_writes_through() {
        let tree = GeneNode::new(GeneOp::SetLVar, GeneOperand::Index(10), vec![konst(4.5)]);
        let mut world = FakeWorld::default();
        execute_gene(0, &tree, &mut world).expect("exec");
        assert_eq!(world.lvars[10], 4.5);
    }

    #[test]
    fn if_only_runs_then_branch_when_true() {
        let then_branch = GeneNode::new(
            GeneOp::SetHormone,
            GeneOperand::Index(1),
            vec![konst(9.0)],
        );
        let tree = GeneNode::new(GeneOp::If, GeneOperand::None, vec![konst(0.0), then_branch]);
        let mut world = FakeWorld::default();
        execute_gene(0, &tree, &mut world).expect("exec");
        assert_eq!(world.hormones[1], 0.0);
    }

    #[test]
    fn loop_respects_bound_and_break() {
        let body = GeneNode::new(
            GeneOp::Seq,
            GeneOperand::None,
            vec![
                GeneNode::new(
                    GeneOp::SetLVar,
                    GeneOperand::Index(5),
                    vec![GeneNode::new(
                        GeneOp::Add,
                        GeneOperand::None,
                        vec![
                            GeneNode::new(GeneOp::SelfLVar, GeneOperand::Index(5), vec![]),
                            konst(1.0),
                        ],
                    )],
                ),
                GeneNode::new(GeneOp::Break, GeneOperand::None, vec![]),
            ],
        );
        let tree = GeneNode::new_loop(100, body);
        let mut world = FakeWorld::default();
        execute_gene(0, &tree, &mut world).expect("exec");
        assert_eq!(world.lvars[5], 1.0);
    }

    #[test]
    fn mitosis_and_apoptosis_are_requested_not_applied() {
        let tree = GeneNode::new(
            GeneOp::Seq,
            GeneOperand::None,
            vec![
                GeneNode::new(
                    GeneOp::EnqueueMitosis,
                    GeneOperand::None,
                    vec![konst(1.0), konst(0.0), konst(0.0)],
                ),
                GeneNode::new(GeneOp::EnqueueApoptosis, GeneOperand::None, vec![]),
            ],
        );
        let mut world = FakeWorld::default();
        execute_gene(0, &tree, &mut world).expect("exec");
        assert_eq!(world.mitosis_requests.len(), 1);
        assert!(world.apoptosis_requested);
    }
}

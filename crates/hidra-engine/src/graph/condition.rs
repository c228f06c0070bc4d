//! Synapse gating expressions.
//!
//! A small expression tree evaluated once per synapse per tick, ahead of
//! dispatch. Kept deliberately separate from HGL's gene trees: conditions
//! only ever *read* world state (LVars, hormones, the current tick), they
//! never mutate it, so they need no execution-bound guard or context trait.

use serde::{Deserialize, Serialize};

/// A single operand a condition can compare.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    /// An LVar on the synapse's source neuron.
    SourceLVar(u8),
    /// An LVar on the synapse's target neuron.
    TargetLVar(u8),
    /// A global hormone slot.
    Hormone(u8),
    /// A literal constant.
    Const(f32),
    /// The current simulation tick, as a float.
    CurrentTick,
    /// `1.0` while the current tick is within `[start, end]` inclusive, `0.0`
    /// otherwise. A single-operand alternative to composing two `CurrentTick`
    /// comparisons with `And`.
    TickWindow {
        /// First tick the window is open on, inclusive.
        start: u64,
        /// Last tick the window is open on, inclusive.
        end: u64,
    },
}

/// A comparison operator between two operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    /// Greater than.
    Gt,
    /// Less than.
    Lt,
    /// Approximately equal.
    Eq,
    /// Greater than or equal.
    Ge,
    /// Less than or equal.
    Le,
}

/// The context a [`Condition`] reads from. Implemented by the world for the
/// specific source/target pair being evaluated.
pub trait ConditionContext {
    /// Read the source neuron's LVar.
    fn source_lvar(&self, index: u8) -> f32;
    /// Read the target neuron's LVar.
    fn target_lvar(&self, index: u8) -> f32;
    /// Read a global hormone.
    fn hormone(&self, index: u8) -> f32;
    /// The current simulation tick.
    fn current_tick(&self) -> u64;
}

impl Operand {
    fn resolve<C: ConditionContext>(&self, ctx: &C) -> f32 {
        match *self {
            Operand::SourceLVar(i) => ctx.source_lvar(i),
            Operand::TargetLVar(i) => ctx.target_lvar(i),
            Operand::Hormone(i) => ctx.hormone(i),
            Operand::Const(v) => v,
            Operand::CurrentTick => ctx.current_tick() as f32,
            Operand::TickWindow { start, end } => {
                let tick = ctx.current_tick();
                if tick >= start && tick <= end {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

/// A synapse gating expression: comparisons combined with boolean connectives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// `lhs <op> rhs`.
    Compare(Operand, CmpOp, Operand),
    /// Both must hold.
    And(Box<Condition>, Box<Condition>),
    /// Either must hold.
    Or(Box<Condition>, Box<Condition>),
    /// Negation.
    Not(Box<Condition>),
    /// Always true; the default for a gateless synapse.
    Always,
}

impl Condition {
    /// Evaluate this condition against `ctx`.
    pub fn evaluate<C: ConditionContext>(&self, ctx: &C) -> bool {
        match self {
            Condition::Compare(lhs, op, rhs) => {
                let l = lhs.resolve(ctx);
                let r = rhs.resolve(ctx);
                match op {
                    CmpOp::Gt => l > r,
                    CmpOp::Lt => l < r,
                    CmpOp::Eq => (l - r).abs() < f32::EPSILON,
                    CmpOp::Ge => l >= r,
                    CmpOp::Le => l <= r,
                }
            }
            Condition::And(a, b) => a.evaluate(ctx) && b.evaluate(ctx),
            Condition::Or(a, b) => a.evaluate(ctx) || b.evaluate(ctx),
            Condition::Not(inner) => !inner.evaluate(ctx),
            Condition::Always => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        source: f32,
        target: f32,
        hormone: f32,
        tick: u64,
    }

    impl ConditionContext for Fixture {
        fn source_lvar(&self, _index: u8) -> f32 {
            self.source
        }
        fn target_lvar(&self, _index: u8) -> f32 {
            self.target
        }
        fn hormone(&self, _index: u8) -> f32 {
            self.hormone
        }
        fn current_tick(&self) -> u64 {
            self.tick
        }
    }

    #[test]
    fn always_is_always_true() {
        let ctx = Fixture { source: 0.0, target: 0.0, hormone: 0.0, tick: 0 };
        assert!(Condition::Always.evaluate(&ctx));
    }

    #[test]
    fn compare_reads_the_right_operands() {
        let ctx = Fixture { source: 5.0, target: 2.0, hormone: 0.0, tick: 0 };
        let cond = Condition::Compare(Operand::SourceLVar(0), CmpOp::Gt, Operand::TargetLVar(0));
        assert!(cond.evaluate(&ctx));
    }

    #[test]
    fn boolean_connectives_compose() {
        let ctx = Fixture { source: 5.0, target: 5.0, hormone: 1.0, tick: 10 };
        let cond = Condition::And(
            Box::new(Condition::Compare(Operand::SourceLVar(0), CmpOp::Eq, Operand::TargetLVar(0))),
            Box::new(Condition::Not(Box::new(Condition::Compare(
                Operand::Hormone(0),
                CmpOp::Lt,
                Operand::Const(1.0),
            )))),
        );
        assert!(cond.evaluate(&ctx));
    }

    #[test]
    fn current_tick_window_gating() {
        let ctx = Fixture { source: 0.0, target: 0.0, hormone: 0.0, tick: 50 };
        let window = Condition::And(
            Box::new(Condition::Compare(Operand::CurrentTick, CmpOp::Ge, Operand::Const(10.0))),
            Box::new(Condition::Compare(Operand::CurrentTick, CmpOp::Le, Operand::Const(100.0))),
        );
        assert!(window.evaluate(&ctx));
    }

    #[test]
    fn tick_window_operand_gates_directly() {
        let inside = Fixture { source: 0.0, target: 0.0, hormone: 0.0, tick: 50 };
        let before = Fixture { source: 0.0, target: 0.0, hormone: 0.0, tick: 5 };
        let after = Fixture { source: 0.0, target: 0.0, hormone: 0.0, tick: 200 };
        let cond = Condition::Compare(Operand::TickWindow { start: 10, end: 100 }, CmpOp::Eq, Operand::Const(1.0));
        assert!(cond.evaluate(&inside));
        assert!(!cond.evaluate(&before));
        assert!(!cond.evaluate(&after));
    }
}

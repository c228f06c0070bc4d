//! The graph data model (component E): neurons, synapses, I/O nodes, and
//! global hormones.

pub mod condition;
pub mod hormones;
pub mod io_node;
pub mod neuron;
pub mod synapse;

pub use condition::{CmpOp, Condition, ConditionContext, Operand};
pub use hormones::GlobalHormones;
pub use io_node::{InputNode, OutputNode};
pub use neuron::{lvar, Neuron, LVAR_COUNT};
pub use synapse::{Fatigue, SignalType, Synapse};

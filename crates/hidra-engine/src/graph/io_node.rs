//! Input and output nodes (component E): the organism's sensory and motor surface.

use hidra_storage::NodeId;
use serde::{Deserialize, Serialize};

/// A node whose value is driven externally (staged by the caller, read by synapses as a source).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InputNode {
    /// Stable identity.
    pub id: NodeId,
    /// The value synapses sourcing from this node will read this tick.
    pub value: f32,
}

impl InputNode {
    /// A fresh input node at zero.
    pub fn new(id: NodeId) -> Self {
        Self { id, value: 0.0 }
    }
}

/// A node whose value synapses write into; read back by the caller after a tick.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OutputNode {
    /// Stable identity.
    pub id: NodeId,
    /// The last value written by a synapse targeting this node.
    pub value: f32,
}

impl OutputNode {
    /// A fresh output node at zero.
    pub fn new(id: NodeId) -> Self {
        Self { id, value: 0.0 }
    }
}

//! Engine-level error type.
//!
//! The tick pipeline itself never raises: a failing gene execution or a
//! queue anomaly is logged and the offending event is dropped. `EngineError`
//! is reserved for the external mutation API boundary (component I), mirroring
//! how the teacher keeps its runtime's internal step loop infallible and
//! pushes fallibility to the edges (`shnn-runtime/src/error.rs`).

use thiserror::Error;

/// Errors returned by the world's external mutation and query surface.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A supplied configuration value is out of range or internally inconsistent.
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    /// A referenced node, synapse, or gene does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The requested mutation conflicts with existing state (e.g. duplicate ID).
    #[error("conflict: {0}")]
    Conflict(String),

    /// An argument violates a precondition independent of current world state.
    #[error("invalid argument: {0}")]
    ArgumentError(String),

    /// Propagated from the genome bytecode layer.
    #[error("gene error: {0}")]
    Gene(#[from] hidra_hgl::HglError),

    /// Propagated from the snapshot codec.
    #[error("storage error: {0}")]
    Storage(#[from] hidra_storage::StorageError),
}

impl EngineError {
    /// Build a [`EngineError::NotFound`] for a node lookup miss.
    pub fn node_not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("node {id} does not exist"))
    }

    /// Build a [`EngineError::NotFound`] for a synapse lookup miss.
    pub fn synapse_not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("synapse {id} does not exist"))
    }

    /// Build a [`EngineError::Conflict`] for a duplicate-ID insert attempt.
    pub fn duplicate(kind: &str, id: impl std::fmt::Display) -> Self {
        Self::Conflict(format!("{kind} {id} already exists"))
    }
}

/// Convenience alias for engine results.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_are_informative() {
        let err = EngineError::node_not_found(42u64);
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn duplicate_mentions_kind_and_id() {
        let err = EngineError::duplicate("synapse", 7u64);
        assert!(err.to_string().contains("synapse"));
        assert!(err.to_string().contains('7'));
    }
}

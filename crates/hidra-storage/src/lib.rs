//! Storage layer for the Hidra simulation engine
//!
//! Owns the ID newtypes shared across the graph, the event queue, and the
//! HGL runtime, plus the versioned JSON snapshot envelope used to persist
//! and restore world state.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod ids;
pub mod snapshot;

pub use error::{Result, StorageError};
pub use ids::{EventId, IdCounter, NodeId, SynapseId};
pub use snapshot::{SnapshotEnvelope, SNAPSHOT_FORMAT_VERSION};

/// Storage crate version for compatibility checking.
pub const STORAGE_VERSION: u32 = 1;

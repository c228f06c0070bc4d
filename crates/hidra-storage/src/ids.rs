//! ID newtypes shared by the graph, the event queue, and the snapshot codec.

use core::fmt;
use serde::{Deserialize, Serialize};

/// Unique identifier for a neuron or I/O node (shared ID space, partitioned by registration).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Create a new node ID
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub const fn raw(&self) -> u64 {
        self.0
    }

    /// The reserved ID meaning "the world itself" (used as an event target).
    pub const WORLD: Self = Self(0);

    /// Next ID after this one
    pub const fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N{}", self.0)
    }
}

/// Unique identifier for a synapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SynapseId(pub u64);

impl SynapseId {
    /// Create a new synapse ID
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub const fn raw(&self) -> u64 {
        self.0
    }

    /// Next ID after this one
    pub const fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for SynapseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

/// Unique identifier for a queued event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(pub u64);

impl EventId {
    /// Create a new event ID
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub const fn raw(&self) -> u64 {
        self.0
    }

    /// Next ID after this one
    pub const fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// A monotonic counter that hands out strictly increasing IDs of type `T`.
///
/// Never reuses a value, even across apoptosis/removal, matching the
/// "IDs are strictly monotonic" invariant on neurons, synapses, and events.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IdCounter<T> {
    next: u64,
    #[serde(skip)]
    _marker: std::marker::PhantomData<T>,
}

impl<T> Default for IdCounter<T> {
    fn default() -> Self {
        Self {
            next: 0,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T> IdCounter<T> {
    /// Create a counter that will hand out `start` next.
    pub const fn starting_at(start: u64) -> Self {
        Self {
            next: start,
            _marker: std::marker::PhantomData,
        }
    }

    /// Peek at the value that will be handed out next, without consuming it.
    pub const fn peek(&self) -> u64 {
        self.next
    }
}

impl IdCounter<NodeId> {
    /// Fetch-and-increment, returning a fresh [`NodeId`].
    pub fn fetch_add(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }
}

impl IdCounter<SynapseId> {
    /// Fetch-and-increment, returning a fresh [`SynapseId`].
    pub fn fetch_add(&mut self) -> SynapseId {
        let id = SynapseId(self.next);
        self.next += 1;
        id
    }
}

impl IdCounter<EventId> {
    /// Fetch-and-increment, returning a fresh [`EventId`].
    pub fn fetch_add(&mut self) -> EventId {
        let id = EventId(self.next);
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_ordering() {
        assert!(NodeId::new(1) < NodeId::new(2));
        assert_eq!(format!("{}", NodeId::new(7)), "N7");
    }

    #[test]
    fn test_counter_monotonic() {
        let mut counter: IdCounter<NodeId> = IdCounter::default();
        let a = counter.fetch_add();
        let b = counter.fetch_add();
        let c = counter.fetch_add();
        assert_eq!(a, NodeId::new(0));
        assert_eq!(b, NodeId::new(1));
        assert_eq!(c, NodeId::new(2));
        assert_eq!(counter.peek(), 3);
    }

    #[test]
    fn test_counter_starting_at() {
        let mut counter: IdCounter<SynapseId> = IdCounter::starting_at(42);
        assert_eq!(counter.fetch_add(), SynapseId::new(42));
    }
}

//! The deterministic event queue (component D).
//!
//! Ordered by `(execution_tick, event_id)` so events scheduled for the same
//! tick drain in the order they were created, independent of `HashMap`
//! iteration or thread scheduling. Backed by a `BinaryHeap`, which is a
//! max-heap in `std`; entries are wrapped so that popping yields the
//! smallest key first.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use hidra_storage::{EventId, NodeId, SynapseId};
use serde::{Deserialize, Serialize};

/// What kind of work an event represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    /// Run a compiled gene against the target neuron (or the world, if `target` is `NodeId::WORLD`).
    ExecuteGene,
    /// Deliver a `Delayed`-signal synapse's effect.
    DelayedSignal,
    /// Split `target` into a new neuron.
    Mitosis,
    /// Deactivate `target` and reclaim it from the spatial index.
    Apoptosis,
    /// Observable marker that `target` fired this tick (consumed by metrics, not re-dispatched).
    Fire,
}

/// Event-specific data beyond `(type, target, tick)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EventPayload {
    /// No extra data.
    None,
    /// `ExecuteGene` target gene ID.
    Gene { gene_id: usize },
    /// `DelayedSignal` carried value and the synapse that produced it.
    Signal { value: f32, source_synapse: SynapseId },
    /// `Mitosis` positional offset from the parent.
    MitosisOffset { dx: f32, dy: f32, dz: f32 },
}

/// One scheduled unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique, monotonically assigned event ID; the queue's tie-break key.
    pub id: EventId,
    /// What this event does.
    pub event_type: EventType,
    /// The node this event acts on (`NodeId::WORLD` for world-scoped gene calls).
    pub target: NodeId,
    /// The tick on which this event becomes due.
    pub execution_tick: u64,
    /// Event-specific data.
    pub payload: EventPayload,
}

impl Event {
    /// Construct an event.
    pub fn new(
        id: EventId,
        event_type: EventType,
        target: NodeId,
        execution_tick: u64,
        payload: EventPayload,
    ) -> Self {
        Self {
            id,
            event_type,
            target,
            execution_tick,
            payload,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct HeapEntry(Event);

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so a max-heap (`BinaryHeap`'s only mode) pops the
        // smallest `(execution_tick, id)` key first.
        (other.0.execution_tick, other.0.id).cmp(&(self.0.execution_tick, self.0.id))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The engine's min-heap event queue, ordered by `(execution_tick, id)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventQueue {
    heap: BinaryHeap<HeapEntry>,
}

impl EventQueue {
    /// An empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule an event.
    pub fn push(&mut self, event: Event) {
        self.heap.push(HeapEntry(event));
    }

    /// Remove and return every event due at exactly `current_tick`, in
    /// ascending-ID order.
    ///
    /// Any popped entry whose `execution_tick` is strictly less than
    /// `current_tick` indicates a scheduling bug (an event that should have
    /// been drained on an earlier tick); it is logged and dropped rather than
    /// delivered out of order. In debug builds this additionally asserts.
    pub fn drain_due(&mut self, current_tick: u64) -> Vec<Event> {
        let mut due = Vec::new();
        while let Some(top) = self.heap.peek() {
            if top.0.execution_tick > current_tick {
                break;
            }
            let HeapEntry(event) = self.heap.pop().expect("peeked entry must be present");
            if event.execution_tick < current_tick {
                debug_assert!(
                    false,
                    "event {:?} scheduled for tick {} surfaced after tick {}",
                    event.id, event.execution_tick, current_tick
                );
                log::error!(
                    "dropping stale event {:?} (scheduled tick {}, observed at tick {})",
                    event.id,
                    event.execution_tick,
                    current_tick
                );
                continue;
            }
            due.push(event);
        }
        due
    }

    /// Whether any event is currently scheduled.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Number of events currently scheduled.
    pub fn len(&self) -> usize {
        self.heap.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(id: u64, tick: u64) -> Event {
        Event::new(EventId::new(id), EventType::Fire, NodeId::new(1), tick, EventPayload::None)
    }

    #[test]
    fn drains_only_events_due_now() {
        let mut queue = EventQueue::new();
        queue.push(ev(1, 5));
        queue.push(ev(2, 3));
        queue.push(ev(3, 3));
        let due = queue.drain_due(3);
        assert_eq!(due.iter().map(|e| e.id.raw()).collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn ties_break_on_ascending_id() {
        let mut queue = EventQueue::new();
        queue.push(ev(9, 1));
        queue.push(ev(4, 1));
        queue.push(ev(7, 1));
        let due = queue.drain_due(1);
        assert_eq!(due.iter().map(|e| e.id.raw()).collect::<Vec<_>>(), vec![4, 7, 9]);
    }

    #[test]
    fn future_events_are_left_untouched() {
        let mut queue = EventQueue::new();
        queue.push(ev(1, 10));
        let due = queue.drain_due(1);
        assert!(due.is_empty());
        assert_eq!(queue.len(), 1);
    }
}

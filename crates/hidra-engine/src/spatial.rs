//! Spatial indexing (component C).
//!
//! A uniform grid keyed by integer cell coordinates. Cell side is twice the
//! configured competition radius so that any two neurons within that radius
//! of each other are guaranteed to land in the same cell or a face-adjacent
//! one, keeping a radius query to the 27-cell neighborhood around the query
//! point.

use std::collections::HashMap;

use hidra_storage::NodeId;

type CellKey = (i64, i64, i64);

/// A uniform-grid spatial hash over node positions.
#[derive(Debug, Clone)]
pub struct SpatialHash {
    cell_side: f32,
    cells: HashMap<CellKey, Vec<NodeId>>,
    positions: HashMap<NodeId, [f32; 3]>,
}

impl SpatialHash {
    /// Build an empty hash with the given cell side length.
    ///
    /// `cell_side` must be positive; callers derive it as
    /// `2.0 * competition_radius` from the active configuration.
    pub fn new(cell_side: f32) -> Self {
        let cell_side = if cell_side > 0.0 { cell_side } else { 1.0 };
        Self {
            cell_side,
            cells: HashMap::new(),
            positions: HashMap::new(),
        }
    }

    fn cell_of(&self, position: [f32; 3]) -> CellKey {
        (
            (position[0] / self.cell_side).floor() as i64,
            (position[1] / self.cell_side).floor() as i64,
            (position[2] / self.cell_side).floor() as i64,
        )
    }

    /// Insert or move a node to `position`.
    pub fn insert(&mut self, id: NodeId, position: [f32; 3]) {
        self.remove(id);
        let key = self.cell_of(position);
        self.cells.entry(key).or_default().push(id);
        self.positions.insert(id, position);
    }

    /// Remove a node from the index. No-op if it was not present.
    pub fn remove(&mut self, id: NodeId) {
        if let Some(position) = self.positions.remove(&id) {
            let key = self.cell_of(position);
            if let Some(bucket) = self.cells.get_mut(&key) {
                bucket.retain(|&n| n != id);
                if bucket.is_empty() {
                    self.cells.remove(&key);
                }
            }
        }
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.positions.clear();
    }

    /// Every node in the bounding box of `radius` around `position`. Callers
    /// do their own exact-distance filtering over the returned candidates.
    ///
    /// Scans the 3x3x3 neighborhood of cells around `position` (guaranteed to
    /// contain every node within `radius` when `radius <= cell_side / 2`,
    /// which holds for the engine's own competition-radius usage since
    /// `cell_side == 2 * competition_radius`).
    pub fn candidates(&self, position: [f32; 3], radius: f32) -> Vec<NodeId> {
        let _ = radius;
        let center = self.cell_of(position);
        let mut found = Vec::new();
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let key = (center.0 + dx, center.1 + dy, center.2 + dz);
                    if let Some(bucket) = self.cells.get(&key) {
                        found.extend_from_slice(bucket);
                    }
                }
            }
        }
        found
    }

    /// Position of a currently indexed node, if present.
    pub fn position_of(&self, id: NodeId) -> Option<[f32; 3]> {
        self.positions.get(&id).copied()
    }

    /// Rebuild the index from scratch given an authoritative position list.
    /// Used after a snapshot restore, where positions are known but the
    /// index itself is not persisted.
    pub fn rebuild<I: IntoIterator<Item = (NodeId, [f32; 3])>>(&mut self, entries: I) {
        self.clear();
        for (id, position) in entries {
            self.insert(id, position);
        }
    }

    /// Number of nodes currently indexed.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_finds_nearby_and_excludes_far_cells() {
        let mut hash = SpatialHash::new(10.0);
        let near = NodeId::new(1);
        let far = NodeId::new(2);
        hash.insert(near, [0.0, 0.0, 0.0]);
        hash.insert(far, [100.0, 0.0, 0.0]);
        let found = hash.candidates([0.0, 0.0, 0.0], 5.0);
        assert_eq!(found, vec![near]);
    }

    #[test]
    fn candidates_does_not_filter_by_exact_distance() {
        let mut hash = SpatialHash::new(10.0);
        let corner = NodeId::new(1);
        hash.insert(corner, [9.0, 9.0, 9.0]);
        // Same cell as the query point but outside the requested radius —
        // candidates() hands back the whole cell for the caller to filter.
        let found = hash.candidates([0.0, 0.0, 0.0], 1.0);
        assert_eq!(found, vec![corner]);
    }

    #[test]
    fn remove_reclaims_the_slot() {
        let mut hash = SpatialHash::new(10.0);
        let id = NodeId::new(1);
        hash.insert(id, [0.0, 0.0, 0.0]);
        hash.remove(id);
        assert!(hash.candidates([0.0, 0.0, 0.0], 5.0).is_empty());
        assert!(hash.is_empty());
    }

    #[test]
    fn reinsert_moves_between_cells() {
        let mut hash = SpatialHash::new(10.0);
        let id = NodeId::new(1);
        hash.insert(id, [0.0, 0.0, 0.0]);
        hash.insert(id, [500.0, 500.0, 500.0]);
        assert_eq!(hash.len(), 1);
        assert!(hash.candidates([0.0, 0.0, 0.0], 5.0).is_empty());
        assert_eq!(hash.candidates([500.0, 500.0, 500.0], 5.0), vec![id]);
    }
}

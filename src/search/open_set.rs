use super::{Cost, NodeArena, NodeId};
use crate::geometry::{manhattan_distance, LayerId, Point3};
use hashbrown::HashMap;
use std::cmp::Ordering;

/// Entry of the open set's heap. Lowest `f` first, ties go to the entry pushed first.
#[derive(Clone, Copy, Debug)]
pub(crate) struct OpenEntry {
    pub f: Cost,
    pub counter: u64,
    pub id: NodeId,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, rhs: &Self) -> Option<Ordering> {
        Some(self.cmp(rhs))
    }
}
impl Ord for OpenEntry {
    fn cmp(&self, rhs: &Self) -> Ordering {
        // reversed for a min-heap
        rhs.f
            .total_cmp(&self.f)
            .then_with(|| rhs.counter.cmp(&self.counter))
    }
}

type Bucket = (i64, i64, LayerId);

/// Finds nodes within a tolerance of a position.
///
/// Nodes are bucketed by cells as large as the tolerance, so a lookup only checks the 3x3 cells
/// around the position.
#[derive(Clone, Debug)]
pub(crate) struct NodeLookup {
    cell: f64,
    buckets: HashMap<Bucket, Vec<NodeId>>,
}

impl NodeLookup {
    pub fn new(cell: f64) -> NodeLookup {
        NodeLookup {
            cell: if cell > 0.0 { cell } else { 1.0 },
            buckets: HashMap::new(),
        }
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }

    fn bucket(&self, pos: Point3) -> Bucket {
        (
            (pos.x / self.cell).floor() as i64,
            (pos.y / self.cell).floor() as i64,
            pos.layer,
        )
    }

    pub fn insert(&mut self, pos: Point3, id: NodeId) {
        let bucket = self.bucket(pos);
        self.buckets.entry(bucket).or_default().push(id);
    }

    pub fn remove(&mut self, pos: Point3, id: NodeId) {
        let bucket = self.bucket(pos);
        if let Some(ids) = self.buckets.get_mut(&bucket) {
            ids.retain(|&other| other != id);
        }
    }

    /// A node on the same layer closer than the tolerance (Manhattan Metric) to `pos`
    pub fn find_near(&self, nodes: &NodeArena, pos: Point3) -> Option<NodeId> {
        let (bx, by, layer) = self.bucket(pos);
        let mut best: Option<(NodeId, f64)> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                let ids = match self.buckets.get(&(bx + dx, by + dy, layer)) {
                    Some(ids) => ids,
                    None => continue,
                };
                for &id in ids {
                    let d = manhattan_distance(nodes[id].pos, pos);
                    if d < self.cell && best.map_or(true, |(_, b)| d < b) {
                        best = Some((id, d));
                    }
                }
            }
        }
        best.map(|(id, _)| id)
    }
}

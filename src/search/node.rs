use super::Cost;
use crate::geometry::Point3;
use crate::neighbors::MarginTier;
use crate::obstacle::ObstacleId;

/// The Type used to reference a [`SearchNode`] in a [`NodeArena`]
pub type NodeId = usize;

/// Where a node currently is in the search
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeStatus {
    /// waiting in the open set
    Open,
    /// expanded
    Closed,
    /// superseded by a cheaper node at the same position
    Replaced,
}

/// A vertex of the search tree.
///
/// Nodes only know their parent, so all nodes of one search form a tree rooted at the start. The
/// tree lives in a [`NodeArena`] and is dropped as a whole once the search is over.
#[derive(Clone, Debug)]
pub struct SearchNode {
    /// position
    pub pos: Point3,
    /// cost of the cheapest known way from the start
    pub g: Cost,
    /// estimated cost to the goal
    pub h: Cost,
    /// `g + h * greedy_multiplier`
    pub f: Cost,
    /// the node this one was reached from
    pub parent: Option<NodeId>,
    /// the obstacle that ended the jump that produced this node
    pub obstacle_hit: Option<ObstacleId>,
    /// multiplies the distance travelled when leaving this node
    pub travel_margin_cost_factor: Option<f64>,
    /// cost paid for entering this node
    pub enter_margin_cost: Option<f64>,
    /// open, closed or replaced
    pub status: NodeStatus,
}

/// A candidate node produced by a [`NeighborStrategy`](crate::neighbors::NeighborStrategy).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    /// position
    pub pos: Point3,
    /// the obstacle at the stopping point, if the jump ended at a wall
    pub obstacle_hit: Option<ObstacleId>,
    /// see [`SearchNode::travel_margin_cost_factor`]
    pub travel_margin_cost_factor: Option<f64>,
    /// see [`SearchNode::enter_margin_cost`]
    pub enter_margin_cost: Option<f64>,
}

impl Neighbor {
    /// A plain candidate without any annotations
    pub fn at(pos: Point3) -> Neighbor {
        Neighbor {
            pos,
            obstacle_hit: None,
            travel_margin_cost_factor: None,
            enter_margin_cost: None,
        }
    }

    /// Records the obstacle this candidate stopped in front of
    pub fn hitting(mut self, obstacle: Option<ObstacleId>) -> Neighbor {
        self.obstacle_hit = obstacle;
        self
    }

    /// Annotates the candidate with the costs of a margin tier
    pub fn with_tier(mut self, tier: &MarginTier) -> Neighbor {
        self.travel_margin_cost_factor = Some(tier.travel_cost_factor);
        self.enter_margin_cost = Some(tier.enter_cost);
        self
    }
}

/// Storage for the nodes of one search.
#[derive(Clone, Debug, Default)]
pub struct NodeArena {
    nodes: slab::Slab<SearchNode>,
}

impl NodeArena {
    /// Creates an empty arena
    pub fn new() -> Self {
        Self {
            nodes: slab::Slab::new(),
        }
    }

    /// Number of nodes created so far
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// `true` if no node was created yet
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drops every node
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Stores a new node and returns its id
    pub fn insert(&mut self, node: SearchNode) -> NodeId {
        self.nodes.insert(node)
    }

    /// Positions from the root of the tree down to `id`
    #[track_caller]
    pub fn path_to(&self, id: NodeId) -> Vec<Point3> {
        let mut steps = vec![];
        let mut current = Some(id);
        while let Some(id) = current {
            let node = &self[id];
            steps.push(node.pos);
            current = node.parent;
        }
        steps.reverse();
        steps
    }

    /// Iterates over all nodes
    pub fn iter(&self) -> slab::Iter<SearchNode> {
        self.nodes.iter()
    }
}

use std::ops::{Index, IndexMut};
impl Index<NodeId> for NodeArena {
    type Output = SearchNode;
    #[track_caller]
    fn index(&self, index: NodeId) -> &SearchNode {
        &self.nodes[index]
    }
}
impl IndexMut<NodeId> for NodeArena {
    #[track_caller]
    fn index_mut(&mut self, index: NodeId) -> &mut SearchNode {
        &mut self.nodes[index]
    }
}

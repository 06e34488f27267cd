//! A generalized, incremental A* search over continuous coordinates.
//!
//! The [`SearchEngine`] owns the open and closed sets and the tree of [`SearchNode`]s. Everything
//! that depends on the board (which points can be reached from a node, what a move costs and how
//! far away the goal is) is delegated to a [`NeighborStrategy`](crate::neighbors::NeighborStrategy).
//!
//! Positions are continuous, so two nodes are treated as the same node when they lie on the same
//! layer and less than one `grid_step` apart (Manhattan Metric).

mod engine;
pub use self::engine::{ExhaustReason, SearchEngine, SearchOutcome, SearchState};

mod node;
pub use self::node::{Neighbor, NodeArena, NodeId, NodeStatus, SearchNode};

mod open_set;
pub(crate) use self::open_set::{NodeLookup, OpenEntry};

mod path;
pub use self::path::Path;

use std::time::Duration;

/// The Type used for all Costs
pub type Cost = f64;

/// Options for a single [`SearchEngine`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchConfig {
    /// Size of the equivalence cell: nodes closer than this are the same node. A node closer than
    /// `2 * grid_step` to the goal counts as having reached it.
    ///
    /// Default: `0.1`
    pub grid_step: f64,
    /// Weight of the heuristic in `f = g + h * greedy_multiplier`.
    ///
    /// `1.0` gives the optimal Path, larger values explore fewer nodes at the price of longer Paths.
    ///
    /// Default: `1.1`
    pub greedy_multiplier: f64,
    /// The search gives up after expanding this many nodes.
    ///
    /// Default: `10_000`
    pub max_iterations: usize,
    /// The search gives up once this much time has passed since [`SearchEngine::begin`].
    ///
    /// Default: `None`
    pub time_limit: Option<Duration>,
}

impl Default for SearchConfig {
    fn default() -> SearchConfig {
        SearchConfig {
            grid_step: 0.1,
            greedy_multiplier: 1.1,
            max_iterations: 10_000,
            time_limit: None,
        }
    }
}

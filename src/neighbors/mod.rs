//! The strategies that decide where a search can go from a node.
//!
//! A [`NeighborStrategy`] plays the role a Neighborhood plays for a grid search: given a node it
//! lists the points reachable in one step, and it knows how much a step costs and how far the goal
//! is. Three strategies are provided:
//! - [`GridNeighbors`] moves one `grid_step` at a time in the four cardinal directions.
//! - [`JumpNeighbors`] travels as far as it can in each direction and stops in front of walls,
//!   once per [`MarginTier`].
//! - [`LayeredJumpNeighbors`] adds layer changes (vias) to the jumps.

use crate::geometry::{manhattan_distance, Point3};
use crate::obstacle_index::ObstacleIndex;
use crate::search::{Cost, Neighbor, SearchNode};
use std::cell::Cell;
use std::fmt::Debug;

mod grid;
pub use self::grid::GridNeighbors;

mod jump;
pub use self::jump::{JumpConfig, JumpNeighbors};

mod layered;
pub use self::layered::{LayerConfig, LayeredJumpNeighbors};

/// Everything a strategy may look at while expanding a node.
///
/// A new context is created for every expansion. The counters are read back by the
/// [`SearchEngine`](crate::search::SearchEngine) afterwards.
#[derive(Debug)]
pub struct SearchContext<'a> {
    /// the obstacles of the current connection
    pub index: &'a dyn ObstacleIndex,
    /// where the search started
    pub start: Point3,
    /// where the search is going
    pub goal: Point3,
    /// see [`SearchConfig::grid_step`](crate::search::SearchConfig::grid_step)
    pub grid_step: f64,
    rejected: Cell<usize>,
    vias_considered: Cell<usize>,
}

impl<'a> SearchContext<'a> {
    /// Creates a new SearchContext
    pub fn new(index: &'a dyn ObstacleIndex, start: Point3, goal: Point3, grid_step: f64) -> Self {
        SearchContext {
            index,
            start,
            goal,
            grid_step,
            rejected: Cell::new(0),
            vias_considered: Cell::new(0),
        }
    }

    /// Records a candidate that was thrown away because it landed inside an obstacle
    pub fn reject(&self) {
        self.rejected.set(self.rejected.get() + 1);
    }

    /// Number of calls to [`reject`](SearchContext::reject)
    pub fn rejected(&self) -> usize {
        self.rejected.get()
    }

    /// Records a layer change that was checked for via clearance
    pub fn consider_via(&self) {
        self.vias_considered.set(self.vias_considered.get() + 1);
    }

    /// Number of calls to [`consider_via`](SearchContext::consider_via)
    pub fn vias_considered(&self) -> usize {
        self.vias_considered.get()
    }
}

/// One way of keeping distance to obstacles.
///
/// A jump that ends at a wall stops `margin` short of it. Wide margins are safe and cheap, narrow
/// margins hug the obstacle and cost extra, both when the node is entered (`enter_cost`) and for
/// every unit travelled away from it (`travel_cost_factor`).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarginTier {
    /// distance kept from the wall
    pub margin: f64,
    /// flat cost added when a node produced with this tier is entered
    pub enter_cost: Cost,
    /// multiplies the distance travelled when leaving a node produced with this tier
    pub travel_cost_factor: f64,
}

impl MarginTier {
    /// Creates a new MarginTier
    pub const fn new(margin: f64, enter_cost: Cost, travel_cost_factor: f64) -> MarginTier {
        MarginTier {
            margin,
            enter_cost,
            travel_cost_factor,
        }
    }
}

/// Defines where a search can go from a node and what it costs.
///
/// Implementations must not emit candidates that lie inside an obstacle. Candidates that are
/// equivalent to an already expanded node are filtered by the engine, so a strategy does not
/// have to remember where it has been.
pub trait NeighborStrategy: Debug + Send + Sync {
    /// Pushes every point reachable from `node` in one step onto `out`.
    ///
    /// ## Arguments
    /// - `ctx` - the obstacles, start and goal of the current search
    /// - `node` - the node being expanded
    /// - `parent` - the node `node` was reached from, `None` for the start
    /// - `out` - receives the candidates. It is empty when this is called.
    fn neighbors(
        &self,
        ctx: &SearchContext,
        node: &SearchNode,
        parent: Option<&SearchNode>,
        out: &mut Vec<Neighbor>,
    );

    /// The Cost of reaching `neighbor` through `current`.
    ///
    /// The default is the Manhattan distance, scaled by the travel factor of `current` and
    /// increased by the enter cost of `neighbor`.
    fn compute_g(&self, current: &SearchNode, neighbor: &Neighbor) -> Cost {
        current.g
            + manhattan_distance(current.pos, neighbor.pos) * current.travel_margin_cost_factor.unwrap_or(1.0)
            + neighbor.enter_margin_cost.unwrap_or(0.0)
    }

    /// Estimated Cost from `point` to the goal. The default is the Manhattan distance.
    fn heuristic(&self, ctx: &SearchContext, point: Point3) -> Cost {
        manhattan_distance(point, ctx.goal)
    }
}

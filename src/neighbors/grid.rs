use super::{NeighborStrategy, SearchContext};
use crate::geometry::{manhattan_distance, Dir};
use crate::search::{Neighbor, SearchNode};

/// A [`NeighborStrategy`] that moves one `grid_step` at a time in the 4 cardinal directions.
///
/// Also known as the Manhattan Neighborhood. It finds the same routes as the jump strategies on
/// boards aligned to the grid, but expands far more nodes. A step is only taken if it keeps
/// `clearance` to every obstacle.
///
/// ```no_code
/// A: current node, o: reachable in one step
///   o
///   |
/// o-A-o
///   |
///   o
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridNeighbors {
    clearance: f64,
}

impl GridNeighbors {
    /// Creates a new GridNeighbors that only needs to stay out of obstacles.
    pub fn new() -> GridNeighbors {
        GridNeighbors { clearance: 0.0 }
    }

    /// Creates a new GridNeighbors that keeps `clearance` to every obstacle.
    pub fn with_clearance(clearance: f64) -> GridNeighbors {
        GridNeighbors { clearance }
    }
}

impl Default for GridNeighbors {
    fn default() -> GridNeighbors {
        GridNeighbors::new()
    }
}

impl NeighborStrategy for GridNeighbors {
    fn neighbors(
        &self,
        ctx: &SearchContext,
        node: &SearchNode,
        _parent: Option<&SearchNode>,
        out: &mut Vec<Neighbor>,
    ) {
        let step = ctx.grid_step;
        let pos = node.pos;
        if pos.layer == ctx.goal.layer && manhattan_distance(pos, ctx.goal) <= step {
            out.push(Neighbor::at(ctx.goal));
            return;
        }
        for dir in Dir::all() {
            let wall = ctx.index.directional_collision(pos, dir, self.clearance).wall_distance;
            if wall < step + self.clearance {
                continue;
            }
            let next = pos.moved(dir, step);
            if let Some(bounds) = ctx.index.config().bounds {
                if !bounds.contains(next.planar()) {
                    continue;
                }
            }
            if ctx.index.is_occupied(next.planar(), next.layer, self.clearance) {
                ctx.reject();
                continue;
            }
            out.push(Neighbor::at(next));
        }
    }
}

use super::{JumpConfig, JumpNeighbors, NeighborStrategy, SearchContext};
use crate::error::RouteError;
use crate::geometry::{euclidean_distance, manhattan_distance, Bounds, Dir, LayerId, Point, Point3, EPSILON};
use crate::search::{Cost, Neighbor, SearchNode};

/// Options for the layer changes of [`LayeredJumpNeighbors`].
///
/// Default options:
/// ```
/// # use trace_autorouter::neighbors::LayerConfig;
/// assert_eq!(
///     LayerConfig {
///         via_diameter: 0.6,
///         via_cost: 5.0,
///         goal_via_margin: 0.5,
///         heuristic_exponent: 1.0,
///     },
///     Default::default()
/// );
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayerConfig {
    /// Outer diameter of a via
    pub via_diameter: f64,
    /// Cost of a single layer change
    pub via_cost: Cost,
    /// Extra distance kept between the goal and a via placed next to it
    pub goal_via_margin: f64,
    /// The heuristic is raised to this power. Values above `1.0` rush towards the goal.
    pub heuristic_exponent: f64,
}

impl Default for LayerConfig {
    fn default() -> LayerConfig {
        LayerConfig {
            via_diameter: 0.6,
            via_cost: 5.0,
            goal_via_margin: 0.5,
            heuristic_exponent: 1.0,
        }
    }
}

impl LayerConfig {
    /// Checks that every value is in range
    pub fn validate(&self) -> Result<(), RouteError> {
        if !(self.via_diameter > 0.0) {
            return Err(RouteError::InvalidConfig(format!(
                "via_diameter must be positive, got {}",
                self.via_diameter
            )));
        }
        if self.via_cost < 0.0 || self.goal_via_margin < 0.0 {
            return Err(RouteError::InvalidConfig(
                "via_cost and goal_via_margin must not be negative".into(),
            ));
        }
        if !(self.heuristic_exponent >= 1.0) {
            return Err(RouteError::InvalidConfig(format!(
                "heuristic_exponent must be at least 1, got {}",
                self.heuristic_exponent
            )));
        }
        Ok(())
    }
}

/// [`JumpNeighbors`] on several layers.
///
/// Besides the planar jumps every node may change to the layer above or below, placing a via.
/// A via is only offered if
/// - the node is more than `via_diameter + obstacle_margin` away from both start and goal
/// - a square of side `via_diameter + 2 * obstacle_margin` around it is free on both layers
///
/// A node that reached the goal's position on the wrong layer cannot place a via there. Instead
/// it is offered the four points `via_diameter + obstacle_margin + goal_via_margin` away from the
/// goal, so the layer change happens next to it.
#[derive(Clone, Debug, Default)]
pub struct LayeredJumpNeighbors {
    jump: JumpNeighbors,
    layers: LayerConfig,
}

impl LayeredJumpNeighbors {
    /// Creates a new LayeredJumpNeighbors
    pub fn new(jump: JumpConfig, layers: LayerConfig) -> LayeredJumpNeighbors {
        LayeredJumpNeighbors {
            jump: JumpNeighbors::new(jump),
            layers,
        }
    }

    /// The options for the planar jumps
    pub fn jump_config(&self) -> &JumpConfig {
        self.jump.config()
    }

    /// The options for layer changes
    pub fn layer_config(&self) -> &LayerConfig {
        &self.layers
    }

    fn margin(&self) -> f64 {
        self.jump.config().obstacle_margin
    }

    /// Distance from the goal at which vias next to it are placed
    fn goal_via_distance(&self) -> f64 {
        self.layers.via_diameter + self.margin() + self.layers.goal_via_margin
    }

    /// `true` if a via at `point` joining `from` and `to` keeps clear of every obstacle.
    pub fn via_fits(&self, ctx: &SearchContext, point: Point, from: LayerId, to: LayerId) -> bool {
        ctx.consider_via();
        let region = Bounds::square(point, self.layers.via_diameter + 2.0 * self.margin());
        [from, to]
            .iter()
            .all(|&layer| ctx.index.obstacles_overlapping_region(&region, layer).is_empty())
    }

    /// The layer one step from `layer` towards `goal`
    fn towards(layer: LayerId, goal: LayerId) -> LayerId {
        if goal > layer {
            layer + 1
        } else {
            layer - 1
        }
    }

    fn surround_goal(&self, ctx: &SearchContext, node: &SearchNode, out: &mut Vec<Neighbor>) {
        let margin = self.margin();
        let distance = self.goal_via_distance();
        let layer = node.pos.layer;
        let next_layer = Self::towards(layer, ctx.goal.layer);

        for dir in Dir::all() {
            // stay on the axis of the node, it may be up to `margin` off the goal
            let travel = dir.distance_along(node.pos, ctx.goal) + distance;
            let wall = ctx.index.directional_collision(node.pos, dir, margin).wall_distance;
            if wall - margin < travel {
                continue;
            }
            let target = node.pos.planar().moved(dir, travel);
            if ctx.index.is_occupied(target, layer, margin) || !self.via_fits(ctx, target, layer, next_layer) {
                continue;
            }
            out.push(Neighbor::at(target.on_layer(layer)));
        }
    }

    /// For a jump that ends on the goal's position but on the wrong layer, the point on the same
    /// line where a via next to the goal could be placed.
    fn via_approach(&self, ctx: &SearchContext, node: &SearchNode, landing: Point3) -> Option<Neighbor> {
        let dir = Dir::between(node.pos, landing)?;
        let target = landing.moved(dir.opposite(), self.goal_via_distance());
        if dir.distance_along(node.pos, target) <= EPSILON {
            return None;
        }
        if ctx.index.is_occupied(target.planar(), target.layer, self.margin()) {
            return None;
        }
        Some(Neighbor::at(target))
    }
}

impl NeighborStrategy for LayeredJumpNeighbors {
    fn neighbors(
        &self,
        ctx: &SearchContext,
        node: &SearchNode,
        parent: Option<&SearchNode>,
        out: &mut Vec<Neighbor>,
    ) {
        let margin = self.margin();
        let pos = node.pos;
        let wrong_layer = pos.layer != ctx.goal.layer;

        if wrong_layer && manhattan_distance(pos, ctx.goal) <= margin {
            self.surround_goal(ctx, node, out);
            return;
        }

        let first = out.len();
        self.jump.planar_jumps(ctx, node, parent, out);

        if wrong_layer {
            let approaches: Vec<Neighbor> = out[first..]
                .iter()
                .filter(|n| manhattan_distance(n.pos, ctx.goal) <= margin)
                .filter_map(|n| self.via_approach(ctx, node, n.pos))
                .collect();
            out.extend(approaches);
        }

        let clearance = self.layers.via_diameter + margin;
        if euclidean_distance(pos, ctx.start) <= clearance || euclidean_distance(pos, ctx.goal) <= clearance {
            return;
        }
        for dir in Dir::layers() {
            let target = pos.layer as isize + dir.dl();
            if target < 0 || target as usize >= ctx.index.layer_count() {
                continue;
            }
            let target = target as LayerId;
            if self.via_fits(ctx, pos.planar(), pos.layer, target) {
                out.push(Neighbor::at(pos.moved(dir, 0.0)));
            }
        }
    }

    fn compute_g(&self, current: &SearchNode, neighbor: &Neighbor) -> Cost {
        let via = if current.pos.layer != neighbor.pos.layer {
            self.layers.via_cost
        } else {
            0.0
        };
        current.g
            + manhattan_distance(current.pos, neighbor.pos) * current.travel_margin_cost_factor.unwrap_or(1.0)
            + neighbor.enter_margin_cost.unwrap_or(0.0)
            + via
    }

    fn heuristic(&self, ctx: &SearchContext, point: Point3) -> Cost {
        let layers = (point.layer as f64 - ctx.goal.layer as f64).abs();
        (manhattan_distance(point, ctx.goal) + self.layers.via_cost * layers).powf(self.layers.heuristic_exponent)
    }
}

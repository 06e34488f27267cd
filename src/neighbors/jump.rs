use super::{MarginTier, NeighborStrategy, SearchContext};
use crate::error::RouteError;
use crate::geometry::{Dir, LayerId, Point, EPSILON};
use crate::obstacle::{ObstacleId, ObstacleWithEdges};
use crate::obstacle_index::ObstacleIndex;
use crate::search::{Neighbor, SearchNode};

/// Options for [`JumpNeighbors`].
///
/// Default options:
/// ```
/// # use trace_autorouter::neighbors::{JumpConfig, MarginTier};
/// assert_eq!(
///     JumpConfig {
///         obstacle_margin: 0.15,
///         margin_tiers: vec![
///             MarginTier::new(1.0, 0.0, 1.0),
///             MarginTier::new(0.3, 0.1, 1.05),
///             MarginTier::new(0.15, 0.2, 1.1),
///         ],
///         max_conjoined_obstacles: 20,
///         align_with_goal: true,
///     },
///     Default::default()
/// );
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JumpConfig {
    /// The clearance every route keeps from every obstacle.
    pub obstacle_margin: f64,
    /// The distances a jump may stop in front of a wall, widest first. No tier may be narrower
    /// than `obstacle_margin`.
    pub margin_tiers: Vec<MarginTier>,
    /// How many obstacles that touch each other may be cleared in a single jump.
    pub max_conjoined_obstacles: usize,
    /// `true` (default): a jump towards a wall also stops where it crosses the goal's x or y
    /// coordinate.
    ///
    /// `false`: only walls and the goal itself stop a jump.
    pub align_with_goal: bool,
}

impl Default for JumpConfig {
    fn default() -> JumpConfig {
        JumpConfig {
            obstacle_margin: 0.15,
            margin_tiers: vec![
                MarginTier::new(1.0, 0.0, 1.0),
                MarginTier::new(0.3, 0.1, 1.05),
                MarginTier::new(0.15, 0.2, 1.1),
            ],
            max_conjoined_obstacles: 20,
            align_with_goal: true,
        }
    }
}

impl JumpConfig {
    /// Checks that the margins are positive and that no tier is narrower than the margin.
    pub fn validate(&self) -> Result<(), RouteError> {
        if !(self.obstacle_margin > 0.0) {
            return Err(RouteError::InvalidConfig(format!(
                "obstacle_margin must be positive, got {}",
                self.obstacle_margin
            )));
        }
        if self.margin_tiers.is_empty() {
            return Err(RouteError::InvalidConfig("at least one margin tier is required".into()));
        }
        for tier in self.margin_tiers.iter() {
            if tier.margin < self.obstacle_margin - EPSILON {
                return Err(RouteError::InvalidConfig(format!(
                    "margin tier {} is narrower than obstacle_margin {}",
                    tier.margin, self.obstacle_margin
                )));
            }
            if tier.travel_cost_factor < 1.0 || tier.enter_cost < 0.0 {
                return Err(RouteError::InvalidConfig(format!(
                    "margin tier {} must not make routes cheaper",
                    tier.margin
                )));
            }
        }
        Ok(())
    }
}

/// A [`NeighborStrategy`] that jumps as far as possible instead of stepping cell by cell.
///
/// From every node, each cardinal direction (except going back) produces candidates where
/// something interesting happens:
/// - the goal, if it lies exactly ahead and in front of any wall
/// - the point where the obstacle the node stopped at is fully cleared
/// - one stop in front of the next wall per [`MarginTier`]
/// - the point where the goal's x or y coordinate is crossed
///
/// ```no_code
///            goal
///             ^
///             |
///   start ----+--> |#####|
///                 ^^^
///             one stop per tier
/// ```
#[derive(Clone, Debug, Default)]
pub struct JumpNeighbors {
    config: JumpConfig,
}

impl JumpNeighbors {
    /// Creates a new JumpNeighbors
    pub fn new(config: JumpConfig) -> JumpNeighbors {
        JumpNeighbors { config }
    }

    /// The options this strategy was created with
    pub fn config(&self) -> &JumpConfig {
        &self.config
    }

    /// The direction a node is moving in: away from its parent, or towards the goal for the start
    /// and for nodes right after a layer change.
    pub(crate) fn forward_direction(ctx: &SearchContext, node: &SearchNode, parent: Option<&SearchNode>) -> Option<Dir> {
        parent
            .and_then(|parent| Dir::between(parent.pos, node.pos))
            .or_else(|| Dir::between(node.pos, ctx.goal))
    }

    /// Pushes the planar jumps from `node` onto `out`, without any layer changes.
    pub(crate) fn planar_jumps(
        &self,
        ctx: &SearchContext,
        node: &SearchNode,
        parent: Option<&SearchNode>,
        out: &mut Vec<Neighbor>,
    ) {
        let margin = self.config.obstacle_margin;
        let pos = node.pos;
        let forward = Self::forward_direction(ctx, node, parent);
        let first = out.len();

        for dir in Dir::all() {
            if let Some(forward) = forward {
                if dir == forward.opposite() || (dir == forward && node.obstacle_hit.is_some()) {
                    continue;
                }
            }
            let collision = ctx.index.directional_collision(pos, dir, margin);
            let wall = collision.wall_distance;
            if wall < margin {
                continue;
            }

            let goal_ahead = dir.distance_along(pos, ctx.goal);
            let on_goal_axis = dir.offset_across(pos, ctx.goal).abs() <= EPSILON;

            if on_goal_axis && ctx.goal.layer == pos.layer && goal_ahead > EPSILON && goal_ahead < wall {
                out.push(Neighbor::at(ctx.goal));
                continue;
            }

            if let Some(hit) = node.obstacle_hit {
                let overcome = self.distance_to_overcome(ctx.index, pos.planar(), pos.layer, dir, hit);
                if let Some(distance) = overcome.filter(|&d| d <= wall - margin) {
                    // clear of every obstacle not yet passed, so nothing is hit at the end
                    out.push(Neighbor::at(pos.moved(dir, distance)).hitting(None));
                    continue;
                }
            }

            if wall.is_infinite() {
                if goal_ahead > EPSILON {
                    out.push(Neighbor::at(pos.moved(dir, goal_ahead)));
                } else if let Some(bounds) = ctx.index.config().bounds {
                    let distance = bounds.distance_to_edge(pos.planar(), dir) - margin;
                    if distance > EPSILON {
                        out.push(Neighbor::at(pos.moved(dir, distance)));
                    }
                }
                continue;
            }

            for tier in self.config.margin_tiers.iter() {
                let distance = wall - tier.margin;
                if distance > EPSILON {
                    out.push(
                        Neighbor::at(pos.moved(dir, distance))
                            .hitting(collision.obstacle)
                            .with_tier(tier),
                    );
                }
            }
            if self.config.align_with_goal && goal_ahead > EPSILON && goal_ahead <= wall - margin {
                out.push(Neighbor::at(pos.moved(dir, goal_ahead)));
            }
        }

        let bounds = ctx.index.config().bounds;
        let mut i = first;
        while i < out.len() {
            let candidate = out[i].pos;
            if ctx.index.is_occupied(candidate.planar(), candidate.layer, 0.0) {
                log_trace!("dropping {}: inside an obstacle", candidate);
                ctx.reject();
                out.swap_remove(i);
            } else if bounds.map_or(false, |b| !b.contains(candidate.planar())) {
                log_trace!("dropping {}: outside of the board", candidate);
                ctx.reject();
                out.swap_remove(i);
            } else {
                i += 1;
            }
        }
    }

    /// How far `point` has to travel along `dir` to be `obstacle_margin` past the far edge of
    /// `obstacle`.
    ///
    /// If that point is within the margin of another obstacle, that obstacle has to be cleared as
    /// well, up to `max_conjoined_obstacles` times. Returns `None` if that limit is exceeded or if
    /// `point` is already past the obstacle.
    pub(crate) fn distance_to_overcome(
        &self,
        index: &dyn ObstacleIndex,
        point: Point,
        layer: LayerId,
        dir: Dir,
        obstacle: ObstacleId,
    ) -> Option<f64> {
        let margin = self.config.obstacle_margin;
        let mut cleared = vec![obstacle];
        let mut current = index.get(obstacle)?;
        let mut distance = f64::NEG_INFINITY;

        for _ in 0..=self.config.max_conjoined_obstacles {
            distance = distance.max(far_edge_distance(current, point, dir) + margin);
            if distance <= EPSILON {
                return None;
            }
            let end = point.moved(dir, distance);
            // `end` is exactly on the margin of the obstacles cleared so far, which counts as
            // touching them. Only other obstacles block it.
            let next = index
                .obstacles_at(end, layer, margin)
                .into_iter()
                .find(|o| !cleared.contains(&o.id));
            match next {
                Some(o) => {
                    cleared.push(o.id);
                    current = o;
                }
                None => return Some(distance),
            }
        }
        None
    }
}

/// Distance along `dir` from `point` to the edge of `o` that is crossed last
fn far_edge_distance(o: &ObstacleWithEdges, point: Point, dir: Dir) -> f64 {
    match dir {
        Dir::Up => o.top - point.y,
        Dir::Right => o.right - point.x,
        Dir::Down => point.y - o.bottom,
        Dir::Left => point.x - o.left,
        Dir::NextLayer | Dir::PrevLayer => 0.0,
    }
}

impl NeighborStrategy for JumpNeighbors {
    fn neighbors(
        &self,
        ctx: &SearchContext,
        node: &SearchNode,
        parent: Option<&SearchNode>,
        out: &mut Vec<Neighbor>,
    ) {
        self.planar_jumps(ctx, node, parent, out);
    }
}

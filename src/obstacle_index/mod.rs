//! Spatial queries over a fixed set of obstacles.
//!
//! Every index answers the same four questions about the obstacles it was built from:
//! - is a point occupied (within some margin of an obstacle)?
//! - how far are the nearest obstacle edges in the four cardinal directions?
//! - how far can a route travel in a direction before it runs into an obstacle?
//! - which obstacles overlap a region?
//!
//! Two implementations are provided and can be chosen with [`IndexKind`]:
//! - [`LinearScan`] checks every obstacle on every query. It is the reference the other index
//!   is tested against.
//! - [`GridCells`] buckets obstacles into square cells and only visits the cells a query touches.
//!
//! Indices are immutable once built. Routing a connection with a different set of obstacles
//! means building a new index.

use crate::geometry::{Bounds, Dir, LayerId, Point, Point3};
use crate::obstacle::{Obstacle, ObstacleId, ObstacleWithEdges};
use std::fmt::Debug;

mod grid_cells;
pub use self::grid_cells::GridCells;

mod linear_scan;
pub use self::linear_scan::LinearScan;

/// Result of a [`ObstacleIndex::directional_collision`] query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Collision {
    /// distance to the first obstacle edge, `f64::INFINITY` if nothing is in the way
    pub wall_distance: f64,
    /// the obstacle that was hit
    pub obstacle: Option<ObstacleId>,
}

impl Collision {
    /// A Collision for an unobstructed direction
    pub const NONE: Collision = Collision {
        wall_distance: f64::INFINITY,
        obstacle: None,
    };

    /// `true` if nothing is in the way
    pub fn is_free(&self) -> bool {
        self.obstacle.is_none() && self.wall_distance.is_infinite()
    }
}

/// Signed distances to the nearest obstacle edge in each cardinal direction.
///
/// See [`ObstacleIndex::nearest_obstacle_distances`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeDistances {
    /// towards decreasing x
    pub left: f64,
    /// towards increasing y
    pub top: f64,
    /// towards increasing x
    pub right: f64,
    /// towards decreasing y
    pub bottom: f64,
}

impl EdgeDistances {
    /// All four distances infinite
    pub const UNBOUNDED: EdgeDistances = EdgeDistances {
        left: f64::INFINITY,
        top: f64::INFINITY,
        right: f64::INFINITY,
        bottom: f64::INFINITY,
    };

    /// The distance for a planar direction
    pub fn get(&self, dir: Dir) -> f64 {
        match dir {
            Dir::Up => self.top,
            Dir::Right => self.right,
            Dir::Down => self.bottom,
            Dir::Left => self.left,
            Dir::NextLayer | Dir::PrevLayer => f64::INFINITY,
        }
    }

    fn get_mut(&mut self, dir: Dir) -> Option<&mut f64> {
        match dir {
            Dir::Up => Some(&mut self.top),
            Dir::Right => Some(&mut self.right),
            Dir::Down => Some(&mut self.bottom),
            Dir::Left => Some(&mut self.left),
            Dir::NextLayer | Dir::PrevLayer => None,
        }
    }
}

/// Options shared by every index implementation.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndexConfig {
    /// number of layers on the board. Obstacles on layers beyond this are ignored.
    pub layer_count: usize,
    /// the margin used by callers that do not have a better one
    pub grid_step: f64,
    /// the routable area, if known
    pub bounds: Option<Bounds>,
}

impl Default for IndexConfig {
    fn default() -> IndexConfig {
        IndexConfig {
            layer_count: 1,
            grid_step: 0.1,
            bounds: None,
        }
    }
}

/// Which [`ObstacleIndex`] implementation to build.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IndexKind {
    /// [`LinearScan`]
    LinearScan,
    /// [`GridCells`] with square cells of side `cell_size`
    GridCells {
        /// side length of a cell
        cell_size: f64,
        /// the largest margin queries will use. Larger margins still work but fall back to a scan.
        max_margin: f64,
    },
}

impl Default for IndexKind {
    fn default() -> IndexKind {
        IndexKind::GridCells {
            cell_size: 2.0,
            max_margin: 1.0,
        }
    }
}

impl IndexKind {
    /// Builds an index of this kind over `obstacles`.
    ///
    /// The [`ObstacleId`] of each obstacle is its position in `obstacles`.
    pub fn build(self, obstacles: Vec<Obstacle>, config: IndexConfig) -> Box<dyn ObstacleIndex> {
        match self {
            IndexKind::LinearScan => Box::new(LinearScan::new(obstacles, config)),
            IndexKind::GridCells {
                cell_size,
                max_margin,
            } => Box::new(GridCells::new(obstacles, config, cell_size, max_margin)),
        }
    }
}

/// The query contract every obstacle index satisfies.
///
/// All distances are exact: every implementation returns the same values as [`LinearScan`]
/// (up to floating point noise below `1e-9`). When several obstacles are equally close, any one
/// of them may be reported.
pub trait ObstacleIndex: Debug + Send + Sync {
    /// Options the index was built with
    fn config(&self) -> &IndexConfig;

    /// Every indexed obstacle, ordered by [`ObstacleId`]
    fn obstacles(&self) -> &[ObstacleWithEdges];

    /// All obstacles on `layer` that `point` lies within `margin` of
    fn obstacles_at(&self, point: Point, layer: LayerId, margin: f64) -> Vec<&ObstacleWithEdges>;

    /// Distance along the planar direction `dir` to the first obstacle on `layer`.
    ///
    /// Only obstacles whose extent perpendicular to `dir`, grown by `margin`, strictly contains
    /// the point are considered, and only if their near edge lies strictly ahead of the point.
    /// The reported distance is measured to the raw edge of the obstacle.
    fn ray_collision(&self, point: Point, layer: LayerId, dir: Dir, margin: f64) -> Collision;

    /// See [`nearest_obstacle_distances`](ObstacleIndex::nearest_obstacle_distances)
    fn edge_distance(&self, point: Point, layer: LayerId, dir: Dir) -> f64;

    /// All obstacles on `layer` whose bounds overlap `region`, ordered by [`ObstacleId`]
    fn obstacles_overlapping_region(&self, region: &Bounds, layer: LayerId) -> Vec<&ObstacleWithEdges>;

    /// The obstacle with the given id
    fn get(&self, id: ObstacleId) -> Option<&ObstacleWithEdges> {
        self.obstacles().get(id)
    }

    /// The margin used when no other margin is known
    fn grid_step(&self) -> f64 {
        self.config().grid_step
    }

    /// Number of layers
    fn layer_count(&self) -> usize {
        self.config().layer_count
    }

    /// One obstacle `point` lies within `margin` of, if there is any
    fn obstacle_at(&self, point: Point, layer: LayerId, margin: f64) -> Option<&ObstacleWithEdges> {
        self.obstacles_at(point, layer, margin).into_iter().next()
    }

    /// `true` if `point` lies within `margin` of any obstacle on `layer`
    fn is_occupied(&self, point: Point, layer: LayerId, margin: f64) -> bool {
        self.obstacle_at(point, layer, margin).is_some()
    }

    /// For each of the four cardinal rays from `point`, the signed distance to the nearest edge the
    /// ray would cross.
    ///
    /// Left and right only consider obstacles whose vertical span contains `point.y`, up and down
    /// only those whose horizontal span contains `point.x`. A distance is negative if the point is
    /// inside an obstacle, and infinite if no obstacle qualifies.
    fn nearest_obstacle_distances(&self, point: Point, layer: LayerId) -> EdgeDistances {
        let mut distances = EdgeDistances::UNBOUNDED;
        for dir in Dir::all() {
            if let Some(d) = distances.get_mut(dir) {
                *d = self.edge_distance(point, layer, dir);
            }
        }
        distances
    }

    /// Distance from `point` along `dir` to the first obstacle.
    ///
    /// Planar directions behave like [`ray_collision`](ObstacleIndex::ray_collision). Layer
    /// directions are a one step probe: a move to a layer that does not exist or whose point is
    /// occupied (within `margin`) has a wall distance of `0`, any other has no wall.
    fn directional_collision(&self, point: Point3, dir: Dir, margin: f64) -> Collision {
        if !dir.is_layer_change() {
            return self.ray_collision(point.planar(), point.layer, dir, margin);
        }
        let target = point.layer as isize + dir.dl();
        if target < 0 || target as usize >= self.layer_count() {
            return Collision {
                wall_distance: 0.0,
                obstacle: None,
            };
        }
        match self.obstacle_at(point.planar(), target as LayerId, margin) {
            Some(o) => Collision {
                wall_distance: 0.0,
                obstacle: Some(o.id),
            },
            None => Collision::NONE,
        }
    }
}

/// Distance along `dir` from `point` to the near edge of `o`, if `o` is in the way.
///
/// This is the single definition of "in the way" shared by all indices, which keeps their
/// results bit-identical.
pub(crate) fn ray_distance(o: &ObstacleWithEdges, point: Point, dir: Dir, margin: f64) -> Option<f64> {
    let (x, y) = (point.x, point.y);
    let spans_y = || y > o.bottom - margin && y < o.top + margin;
    let spans_x = || x > o.left - margin && x < o.right + margin;
    match dir {
        Dir::Right if x < o.left && spans_y() => Some(o.left - x),
        Dir::Left if x > o.right && spans_y() => Some(x - o.right),
        Dir::Up if y < o.bottom && spans_x() => Some(o.bottom - y),
        Dir::Down if y > o.top && spans_x() => Some(y - o.top),
        _ => None,
    }
}

/// Signed distance along `dir` from `point` to the edge of `o` a ray would cross first.
pub(crate) fn signed_edge_distance(o: &ObstacleWithEdges, point: Point, dir: Dir) -> Option<f64> {
    let (x, y) = (point.x, point.y);
    let spans_y = y >= o.bottom && y <= o.top;
    let spans_x = x >= o.left && x <= o.right;
    match dir {
        Dir::Right if spans_y && o.right > x => Some(o.left - x),
        Dir::Left if spans_y && o.left < x => Some(x - o.right),
        Dir::Up if spans_x && o.top > y => Some(o.bottom - y),
        Dir::Down if spans_x && o.bottom < y => Some(y - o.top),
        _ => None,
    }
}

/// Wraps `obstacles` with their edges and sorts their ids by layer.
pub(crate) fn prepare(obstacles: Vec<Obstacle>, layer_count: usize) -> (Vec<ObstacleWithEdges>, Vec<Vec<ObstacleId>>) {
    let obstacles: Vec<ObstacleWithEdges> = obstacles
        .into_iter()
        .enumerate()
        .map(|(id, o)| ObstacleWithEdges::new(id, o))
        .collect();

    let mut by_layer = vec![Vec::new(); layer_count];
    for o in obstacles.iter() {
        for &layer in o.obstacle.layers.iter() {
            if let Some(list) = by_layer.get_mut(layer) {
                list.push(o.id);
            }
        }
    }
    // HashSet iteration order is arbitrary, keep every list ordered by id
    for list in by_layer.iter_mut() {
        list.sort_unstable();
    }
    (obstacles, by_layer)
}

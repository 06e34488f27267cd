use super::{prepare, ray_distance, signed_edge_distance, Collision, IndexConfig, ObstacleIndex};
use crate::geometry::{Bounds, Dir, LayerId, Point};
use crate::obstacle::{Obstacle, ObstacleId, ObstacleWithEdges};

/// An [`ObstacleIndex`] that checks every obstacle on the queried layer.
///
/// Slow for large boards, but trivially correct. All other indices are validated against it.
#[derive(Clone, Debug)]
pub struct LinearScan {
    config: IndexConfig,
    obstacles: Vec<ObstacleWithEdges>,
    by_layer: Vec<Vec<ObstacleId>>,
}

impl LinearScan {
    /// Creates a new LinearScan over `obstacles`
    pub fn new(obstacles: Vec<Obstacle>, config: IndexConfig) -> LinearScan {
        let (obstacles, by_layer) = prepare(obstacles, config.layer_count);
        LinearScan {
            config,
            obstacles,
            by_layer,
        }
    }

    fn on_layer(&self, layer: LayerId) -> impl Iterator<Item = &ObstacleWithEdges> + '_ {
        self.by_layer
            .get(layer)
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(move |&id| &self.obstacles[id])
    }
}

impl ObstacleIndex for LinearScan {
    fn config(&self) -> &IndexConfig {
        &self.config
    }

    fn obstacles(&self) -> &[ObstacleWithEdges] {
        &self.obstacles
    }

    fn obstacles_at(&self, point: Point, layer: LayerId, margin: f64) -> Vec<&ObstacleWithEdges> {
        self.on_layer(layer)
            .filter(|o| o.contains(point, margin))
            .collect()
    }

    fn obstacle_at(&self, point: Point, layer: LayerId, margin: f64) -> Option<&ObstacleWithEdges> {
        self.on_layer(layer).find(|o| o.contains(point, margin))
    }

    fn ray_collision(&self, point: Point, layer: LayerId, dir: Dir, margin: f64) -> Collision {
        let mut best = Collision::NONE;
        for o in self.on_layer(layer) {
            if let Some(distance) = ray_distance(o, point, dir, margin) {
                if distance < best.wall_distance {
                    best = Collision {
                        wall_distance: distance,
                        obstacle: Some(o.id),
                    };
                }
            }
        }
        best
    }

    fn edge_distance(&self, point: Point, layer: LayerId, dir: Dir) -> f64 {
        self.on_layer(layer)
            .filter_map(|o| signed_edge_distance(o, point, dir))
            .fold(f64::INFINITY, f64::min)
    }

    fn obstacles_overlapping_region(&self, region: &Bounds, layer: LayerId) -> Vec<&ObstacleWithEdges> {
        self.on_layer(layer)
            .filter(|o| o.bounds().overlaps(region))
            .collect()
    }
}

use super::{prepare, ray_distance, signed_edge_distance, Collision, IndexConfig, ObstacleIndex};
use crate::geometry::{Bounds, Dir, LayerId, Point, EPSILON};
use crate::obstacle::{Obstacle, ObstacleId, ObstacleWithEdges};
use hashbrown::{HashMap, HashSet};

type Cell = (i64, i64);

#[derive(Clone, Debug, Default)]
struct LayerCells {
    cells: HashMap<Cell, Vec<ObstacleId>>,
    /// (min, max) cell index per axis, `None` if the layer is empty
    extent: Option<(Cell, Cell)>,
}

/// An [`ObstacleIndex`] that buckets obstacles into a uniform grid of square cells.
///
/// Every obstacle is stored in each cell its bounds, grown by `max_margin`, touch. Queries only
/// look at the cells they can possibly be answered from, so their cost depends on the local
/// obstacle density instead of the size of the board.
///
/// Queries with a margin larger than `max_margin` are answered by scanning the whole layer.
#[derive(Clone, Debug)]
pub struct GridCells {
    config: IndexConfig,
    cell_size: f64,
    max_margin: f64,
    obstacles: Vec<ObstacleWithEdges>,
    by_layer: Vec<Vec<ObstacleId>>,
    layers: Vec<LayerCells>,
}

impl GridCells {
    /// Creates a new GridCells index.
    ///
    /// ## Arguments
    /// - `obstacles` - the obstacles to index. Their position in this list is their [`ObstacleId`]
    /// - `config` - options shared with other indices
    /// - `cell_size` - the side length of a cell. Around the size of a typical obstacle works well.
    /// - `max_margin` - the largest margin queries are expected to use
    pub fn new(obstacles: Vec<Obstacle>, config: IndexConfig, cell_size: f64, max_margin: f64) -> GridCells {
        let cell_size = if cell_size > 0.0 { cell_size } else { 1.0 };
        let max_margin = max_margin.max(0.0);
        let (obstacles, by_layer) = prepare(obstacles, config.layer_count);

        let mut index = GridCells {
            config,
            cell_size,
            max_margin,
            obstacles,
            by_layer,
            layers: vec![LayerCells::default(); config.layer_count],
        };

        for layer in 0..index.layers.len() {
            let mut cells = LayerCells::default();
            for &id in index.by_layer[layer].iter() {
                let b = index.obstacles[id].bounds().expanded(max_margin);
                let (min, max) = (index.cell_of(b.min_x, b.min_y), index.cell_of(b.max_x, b.max_y));
                for cx in min.0..=max.0 {
                    for cy in min.1..=max.1 {
                        cells.cells.entry((cx, cy)).or_default().push(id);
                    }
                }
                cells.extent = Some(match cells.extent {
                    None => (min, max),
                    Some((lo, hi)) => ((lo.0.min(min.0), lo.1.min(min.1)), (hi.0.max(max.0), hi.1.max(max.1))),
                });
            }
            index.layers[layer] = cells;
        }

        index
    }

    /// The side length of a cell
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    fn cell_of(&self, x: f64, y: f64) -> Cell {
        (
            (x / self.cell_size).floor() as i64,
            (y / self.cell_size).floor() as i64,
        )
    }

    fn cell(&self, layer: LayerId, cell: Cell) -> &[ObstacleId] {
        self.layers
            .get(layer)
            .and_then(|l| l.cells.get(&cell))
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
    }

    fn on_layer(&self, layer: LayerId) -> impl Iterator<Item = &ObstacleWithEdges> + '_ {
        self.by_layer
            .get(layer)
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(move |&id| &self.obstacles[id])
    }

    /// Walks the cells from `point` along `dir` and returns the smallest distance reported by
    /// `distance`, together with the obstacle reporting it.
    fn walk(
        &self,
        point: Point,
        layer: LayerId,
        dir: Dir,
        mut distance: impl FnMut(&ObstacleWithEdges) -> Option<f64>,
    ) -> Collision {
        let mut best = Collision::NONE;
        let extent = match self.layers.get(layer).and_then(|l| l.extent) {
            Some(extent) => extent,
            None => return best,
        };
        let (lo, hi) = extent;
        let mut cell = self.cell_of(point.x, point.y);
        let cs = self.cell_size;

        // rows and columns outside the extent are empty
        let across_outside = if dir.is_horizontal() {
            cell.1 < lo.1 || cell.1 > hi.1
        } else {
            cell.0 < lo.0 || cell.0 > hi.0
        };
        if across_outside {
            return best;
        }
        match dir {
            Dir::Right => cell.0 = cell.0.max(lo.0),
            Dir::Left => cell.0 = cell.0.min(hi.0),
            Dir::Up => cell.1 = cell.1.max(lo.1),
            Dir::Down => cell.1 = cell.1.min(hi.1),
            Dir::NextLayer | Dir::PrevLayer => return best,
        }

        loop {
            let outside = match dir {
                Dir::Right => cell.0 > hi.0,
                Dir::Left => cell.0 < lo.0,
                Dir::Up => cell.1 > hi.1,
                Dir::Down => cell.1 < lo.1,
                Dir::NextLayer | Dir::PrevLayer => true,
            };
            if outside {
                break;
            }

            for &id in self.cell(layer, cell) {
                let o = &self.obstacles[id];
                if let Some(d) = distance(o) {
                    if d < best.wall_distance || (d == best.wall_distance && best.obstacle.map_or(true, |b| id < b)) {
                        best = Collision {
                            wall_distance: d,
                            obstacle: Some(id),
                        };
                    }
                }
            }

            // distance from the point to the closest coordinate of the next cell
            let boundary = match dir {
                Dir::Right => (cell.0 + 1) as f64 * cs - point.x,
                Dir::Left => point.x - cell.0 as f64 * cs,
                Dir::Up => (cell.1 + 1) as f64 * cs - point.y,
                Dir::Down => point.y - cell.1 as f64 * cs,
                Dir::NextLayer | Dir::PrevLayer => f64::INFINITY,
            };
            if boundary - EPSILON > best.wall_distance {
                break;
            }

            cell = match dir {
                Dir::Right => (cell.0 + 1, cell.1),
                Dir::Left => (cell.0 - 1, cell.1),
                Dir::Up => (cell.0, cell.1 + 1),
                Dir::Down => (cell.0, cell.1 - 1),
                Dir::NextLayer | Dir::PrevLayer => break,
            };
        }
        best
    }
}

impl ObstacleIndex for GridCells {
    fn config(&self) -> &IndexConfig {
        &self.config
    }

    fn obstacles(&self) -> &[ObstacleWithEdges] {
        &self.obstacles
    }

    fn obstacles_at(&self, point: Point, layer: LayerId, margin: f64) -> Vec<&ObstacleWithEdges> {
        if margin > self.max_margin {
            return self.on_layer(layer).filter(|o| o.contains(point, margin)).collect();
        }
        self.cell(layer, self.cell_of(point.x, point.y))
            .iter()
            .map(|&id| &self.obstacles[id])
            .filter(|o| o.contains(point, margin))
            .collect()
    }

    fn ray_collision(&self, point: Point, layer: LayerId, dir: Dir, margin: f64) -> Collision {
        if margin > self.max_margin {
            let mut best = Collision::NONE;
            for o in self.on_layer(layer) {
                if let Some(d) = ray_distance(o, point, dir, margin) {
                    if d < best.wall_distance {
                        best = Collision {
                            wall_distance: d,
                            obstacle: Some(o.id),
                        };
                    }
                }
            }
            return best;
        }
        self.walk(point, layer, dir, |o| ray_distance(o, point, dir, margin))
    }

    fn edge_distance(&self, point: Point, layer: LayerId, dir: Dir) -> f64 {
        self.walk(point, layer, dir, |o| signed_edge_distance(o, point, dir))
            .wall_distance
    }

    fn obstacles_overlapping_region(&self, region: &Bounds, layer: LayerId) -> Vec<&ObstacleWithEdges> {
        let (min, max) = (
            self.cell_of(region.min_x, region.min_y),
            self.cell_of(region.max_x, region.max_y),
        );
        let cell_count = (max.0 - min.0 + 1).saturating_mul(max.1 - min.1 + 1);
        let on_layer = self.by_layer.get(layer).map_or(0, |ids| ids.len());
        if cell_count < 0 || cell_count as usize > on_layer {
            return self
                .on_layer(layer)
                .filter(|o| o.bounds().overlaps(region))
                .collect();
        }

        let mut seen = HashSet::new();
        for cx in min.0..=max.0 {
            for cy in min.1..=max.1 {
                for &id in self.cell(layer, (cx, cy)) {
                    if self.obstacles[id].bounds().overlaps(region) {
                        seen.insert(id);
                    }
                }
            }
        }
        let mut ids: Vec<ObstacleId> = seen.into_iter().collect();
        ids.sort_unstable();
        ids.into_iter().map(|id| &self.obstacles[id]).collect()
    }
}

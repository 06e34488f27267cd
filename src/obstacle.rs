//! Obstacles a route has to keep clear of.

use crate::geometry::{Bounds, LayerId, Point};
use hashbrown::HashSet;

/// Identifier of an electrical network
pub type NetId = String;

/// Position of an obstacle in the list an index was built from
pub type ObstacleId = usize;

/// The outline of an [`Obstacle`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ObstacleShape {
    /// axis aligned rectangle
    Rect,
    /// axis aligned ellipse inscribed in the bounding rectangle
    Oval,
}

/// A rectangular or oval region on one or more layers that routes must avoid.
///
/// Routes of the networks listed in `connected_to` may cross or touch the obstacle freely, since
/// they are electrically joined to it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Obstacle {
    /// outline
    pub shape: ObstacleShape,
    /// center of the bounding rectangle
    pub center: Point,
    /// full width of the bounding rectangle
    pub width: f64,
    /// full height of the bounding rectangle
    pub height: f64,
    /// the layers this obstacle exists on
    pub layers: HashSet<LayerId>,
    /// networks that are allowed to touch this obstacle
    pub connected_to: HashSet<NetId>,
}

impl Obstacle {
    /// A rectangle on the given layers, not connected to any network
    pub fn rect(center: Point, width: f64, height: f64, layers: impl IntoIterator<Item = LayerId>) -> Obstacle {
        Obstacle {
            shape: ObstacleShape::Rect,
            center,
            width,
            height,
            layers: layers.into_iter().collect(),
            connected_to: HashSet::new(),
        }
    }

    /// An oval on the given layers, not connected to any network
    pub fn oval(center: Point, width: f64, height: f64, layers: impl IntoIterator<Item = LayerId>) -> Obstacle {
        Obstacle {
            shape: ObstacleShape::Oval,
            ..Obstacle::rect(center, width, height, layers)
        }
    }

    /// Marks the obstacle as belonging to `net`
    pub fn connected_to(mut self, net: impl Into<NetId>) -> Obstacle {
        self.connected_to.insert(net.into());
        self
    }

    /// `true` if routes of `net` may pass through this obstacle
    pub fn is_connected_to(&self, net: &str) -> bool {
        self.connected_to.contains(net)
    }

    /// `true` if the obstacle exists on `layer`
    pub fn is_on_layer(&self, layer: LayerId) -> bool {
        self.layers.contains(&layer)
    }

    /// The bounding rectangle
    pub fn bounds(&self) -> Bounds {
        let (hw, hh) = (self.width / 2.0, self.height / 2.0);
        Bounds::new(
            self.center.x - hw,
            self.center.x + hw,
            self.center.y - hh,
            self.center.y + hh,
        )
    }
}

/// An [`Obstacle`] with its edges precomputed for the comparisons done by the indices.
#[derive(Clone, Debug, PartialEq)]
pub struct ObstacleWithEdges {
    /// position in the list the index was built from
    pub id: ObstacleId,
    /// the obstacle itself
    pub obstacle: Obstacle,
    /// smallest x
    pub left: f64,
    /// largest x
    pub right: f64,
    /// largest y
    pub top: f64,
    /// smallest y
    pub bottom: f64,
}

impl ObstacleWithEdges {
    /// Precomputes the edges of `obstacle`
    pub fn new(id: ObstacleId, obstacle: Obstacle) -> ObstacleWithEdges {
        let b = obstacle.bounds();
        ObstacleWithEdges {
            id,
            obstacle,
            left: b.min_x,
            right: b.max_x,
            top: b.max_y,
            bottom: b.min_y,
        }
    }

    /// The edges as [`Bounds`]
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.left, self.right, self.bottom, self.top)
    }

    /// `true` if `point` lies within `margin` of the obstacle.
    ///
    /// Rectangles grow by `margin` on every side. Ovals use elliptical containment with both
    /// half axes grown by `margin`.
    pub fn contains(&self, point: Point, margin: f64) -> bool {
        match self.obstacle.shape {
            ObstacleShape::Rect => {
                point.x >= self.left - margin
                    && point.x <= self.right + margin
                    && point.y >= self.bottom - margin
                    && point.y <= self.top + margin
            }
            ObstacleShape::Oval => {
                let half_w = self.obstacle.width / 2.0 + margin;
                let half_h = self.obstacle.height / 2.0 + margin;
                if half_w <= 0.0 || half_h <= 0.0 {
                    return false;
                }
                let dx = (point.x - self.obstacle.center.x) / half_w;
                let dy = (point.y - self.obstacle.center.y) / half_h;
                dx * dx + dy * dy <= 1.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_containment() {
        let o = ObstacleWithEdges::new(0, Obstacle::rect(Point::new(0.0, 0.0), 1.0, 1.0, [0]));
        assert!(o.contains(Point::new(0.5, 0.5), 0.0));
        assert!(!o.contains(Point::new(0.6, 0.0), 0.0));
        assert!(o.contains(Point::new(0.6, 0.0), 0.15));
        assert!(o.contains(Point::new(0.6, 0.6), 0.15));
    }

    #[test]
    fn oval_containment() {
        let o = ObstacleWithEdges::new(0, Obstacle::oval(Point::new(0.0, 0.0), 2.0, 1.0, [0]));
        assert!(o.contains(Point::new(1.0, 0.0), 0.0));
        assert!(o.contains(Point::new(0.0, 0.5), 0.0));
        // the corner of the bounding box is outside the ellipse
        assert!(!o.contains(Point::new(0.9, 0.45), 0.0));
        assert!(o.contains(Point::new(1.1, 0.0), 0.15));
    }

    #[test]
    fn nets() {
        let o = Obstacle::rect(Point::default(), 1.0, 1.0, [0, 1]).connected_to("GND");
        assert!(o.is_connected_to("GND"));
        assert!(!o.is_connected_to("VCC"));
        assert!(o.is_on_layer(1));
        assert!(!o.is_on_layer(2));
    }
}

//! Points, directions and the small amount of orthogonal geometry the router needs.

/// Index of a copper layer. `0` is the top layer.
pub type LayerId = usize;

/// Tolerance used when comparing coordinates that were produced by arithmetic.
pub const EPSILON: f64 = 1e-9;

/// A point on the board plane.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    /// horizontal coordinate
    pub x: f64,
    /// vertical coordinate, growing towards [`Dir::Up`]
    pub y: f64,
}

impl Point {
    /// Creates a new Point
    pub const fn new(x: f64, y: f64) -> Point {
        Point { x, y }
    }

    /// Attaches a layer to this Point
    pub const fn on_layer(self, layer: LayerId) -> Point3 {
        Point3 {
            x: self.x,
            y: self.y,
            layer,
        }
    }

    /// The Point `distance` away from `self` in the planar direction `dir`.
    ///
    /// Layer directions leave the Point unchanged.
    pub fn moved(self, dir: Dir, distance: f64) -> Point {
        Point::new(self.x + dir.dx() * distance, self.y + dir.dy() * distance)
    }
}

/// A point on a specific layer.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point3 {
    /// horizontal coordinate
    pub x: f64,
    /// vertical coordinate
    pub y: f64,
    /// the layer the point lies on
    pub layer: LayerId,
}

impl Point3 {
    /// Creates a new Point3
    pub const fn new(x: f64, y: f64, layer: LayerId) -> Point3 {
        Point3 { x, y, layer }
    }

    /// Drops the layer
    pub const fn planar(self) -> Point {
        Point {
            x: self.x,
            y: self.y,
        }
    }

    /// The Point3 `distance` away in direction `dir`.
    ///
    /// Layer directions change the layer by one step and ignore `distance`. Moving below layer `0`
    /// stays on layer `0`.
    pub fn moved(self, dir: Dir, distance: f64) -> Point3 {
        match dir.dl() {
            0 => self.planar().moved(dir, distance).on_layer(self.layer),
            dl => Point3 {
                layer: self.layer.checked_add_signed(dl).unwrap_or(0),
                ..self
            },
        }
    }

    /// `true` if both points share x, y (within [`EPSILON`]) and layer
    pub fn same_as(&self, other: &Point3) -> bool {
        self.layer == other.layer && self.planar().same_as(&other.planar())
    }
}

impl Point {
    /// `true` if both coordinates match within [`EPSILON`]
    pub fn same_as(&self, other: &Point) -> bool {
        (self.x - other.x).abs() <= EPSILON && (self.y - other.y).abs() <= EPSILON
    }
}

impl From<Point3> for Point {
    fn from(p: Point3) -> Point {
        p.planar()
    }
}

use std::fmt;
impl fmt::Display for Point {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "({}, {})", self.x, self.y)
    }
}
impl fmt::Display for Point3 {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "({}, {}, L{})", self.x, self.y, self.layer)
    }
}

/// Distance in the Manhattan Metric, ignoring layers
pub fn manhattan_distance(a: impl Into<Point>, b: impl Into<Point>) -> f64 {
    let (a, b) = (a.into(), b.into());
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

/// Straight line distance, ignoring layers
pub fn euclidean_distance(a: impl Into<Point>, b: impl Into<Point>) -> f64 {
    let (a, b) = (a.into(), b.into());
    (a.x - b.x).hypot(a.y - b.y)
}

/// The directions a route can take from a point.
///
/// The four planar directions are the cardinal directions of the board, the two layer directions
/// change the layer by one without moving.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Dir {
    /// towards increasing y
    Up = 0,
    /// towards increasing x
    Right = 1,
    /// towards decreasing y
    Down = 2,
    /// towards decreasing x
    Left = 3,
    /// to the next layer (`layer + 1`)
    NextLayer = 4,
    /// to the previous layer (`layer - 1`)
    PrevLayer = 5,
}

const UNIT_CIRCLE: [(f64, f64, isize); 6] = [
    (0.0, 1.0, 0),
    (1.0, 0.0, 0),
    (0.0, -1.0, 0),
    (-1.0, 0.0, 0),
    (0.0, 0.0, 1),
    (0.0, 0.0, -1),
];

impl Dir {
    /// The four planar directions, clockwise starting at [`Dir::Up`]
    pub fn all() -> std::iter::Copied<std::slice::Iter<'static, Dir>> {
        [Dir::Up, Dir::Right, Dir::Down, Dir::Left].iter().copied()
    }

    /// The two layer directions
    pub fn layers() -> std::iter::Copied<std::slice::Iter<'static, Dir>> {
        [Dir::NextLayer, Dir::PrevLayer].iter().copied()
    }

    /// The direction pointing the other way
    pub fn opposite(self) -> Dir {
        match self {
            Dir::Up => Dir::Down,
            Dir::Right => Dir::Left,
            Dir::Down => Dir::Up,
            Dir::Left => Dir::Right,
            Dir::NextLayer => Dir::PrevLayer,
            Dir::PrevLayer => Dir::NextLayer,
        }
    }

    /// index into lookup tables
    pub fn num(self) -> usize {
        self as usize
    }

    /// `true` for [`Dir::Up`] and [`Dir::Down`]
    pub fn is_vertical(self) -> bool {
        self == Dir::Up || self == Dir::Down
    }

    /// `true` for [`Dir::Left`] and [`Dir::Right`]
    pub fn is_horizontal(self) -> bool {
        self == Dir::Left || self == Dir::Right
    }

    /// `true` for the two layer directions
    pub fn is_layer_change(self) -> bool {
        self.dl() != 0
    }

    /// x component of the unit vector
    pub fn dx(self) -> f64 {
        UNIT_CIRCLE[self.num()].0
    }

    /// y component of the unit vector
    pub fn dy(self) -> f64 {
        UNIT_CIRCLE[self.num()].1
    }

    /// layer component
    pub fn dl(self) -> isize {
        UNIT_CIRCLE[self.num()].2
    }

    /// The planar direction pointing from `from` to `to` along the dominant axis.
    ///
    /// Returns `None` if both points coincide.
    pub fn between(from: impl Into<Point>, to: impl Into<Point>) -> Option<Dir> {
        let (from, to) = (from.into(), to.into());
        let (dx, dy) = (to.x - from.x, to.y - from.y);
        if dx.abs() <= EPSILON && dy.abs() <= EPSILON {
            None
        } else if dx.abs() >= dy.abs() {
            Some(if dx > 0.0 { Dir::Right } else { Dir::Left })
        } else {
            Some(if dy > 0.0 { Dir::Up } else { Dir::Down })
        }
    }

    /// Distance from `from` to `to` measured along this direction.
    ///
    /// Negative if `to` lies behind `from`.
    pub fn distance_along(self, from: impl Into<Point>, to: impl Into<Point>) -> f64 {
        let (from, to) = (from.into(), to.into());
        (to.x - from.x) * self.dx() + (to.y - from.y) * self.dy()
    }

    /// Offset of `to` from `from` perpendicular to this direction.
    pub fn offset_across(self, from: impl Into<Point>, to: impl Into<Point>) -> f64 {
        let (from, to) = (from.into(), to.into());
        if self.is_vertical() {
            to.x - from.x
        } else {
            to.y - from.y
        }
    }
}

/// An axis aligned rectangle given by its edges.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    /// left edge
    pub min_x: f64,
    /// right edge
    pub max_x: f64,
    /// bottom edge
    pub min_y: f64,
    /// top edge
    pub max_y: f64,
}

impl Bounds {
    /// Creates Bounds from its edges
    pub const fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Bounds {
        Bounds {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// A square of side `size` centered on `center`
    pub fn square(center: Point, size: f64) -> Bounds {
        let half = size / 2.0;
        Bounds::new(
            center.x - half,
            center.x + half,
            center.y - half,
            center.y + half,
        )
    }

    /// The same Bounds grown by `margin` on every side
    pub fn expanded(&self, margin: f64) -> Bounds {
        Bounds::new(
            self.min_x - margin,
            self.max_x + margin,
            self.min_y - margin,
            self.max_y + margin,
        )
    }

    /// `true` if `point` lies inside or on the edge
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }

    /// `true` if the interiors overlap. Touching edges do not count.
    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    /// Distance from `point` to the edge hit when walking in `dir`.
    ///
    /// Negative if `point` is already past that edge, infinite for layer directions.
    pub fn distance_to_edge(&self, point: Point, dir: Dir) -> f64 {
        match dir {
            Dir::Up => self.max_y - point.y,
            Dir::Right => self.max_x - point.x,
            Dir::Down => point.y - self.min_y,
            Dir::Left => point.x - self.min_x,
            Dir::NextLayer | Dir::PrevLayer => f64::INFINITY,
        }
    }
}

/// Intersection of two orthogonal segments.
///
/// Only pairs made of one horizontal and one vertical segment are considered, anything else
/// (parallel, diagonal or degenerate segments) yields `None`. Touching endpoints count as an
/// intersection.
pub fn orthogonal_intersection(a: (Point, Point), b: (Point, Point)) -> Option<Point> {
    let horizontal = |(p, q): (Point, Point)| (p.y - q.y).abs() <= EPSILON && (p.x - q.x).abs() > EPSILON;
    let vertical = |(p, q): (Point, Point)| (p.x - q.x).abs() <= EPSILON && (p.y - q.y).abs() > EPSILON;

    let (h, v) = if horizontal(a) && vertical(b) {
        (a, b)
    } else if vertical(a) && horizontal(b) {
        (b, a)
    } else {
        return None;
    };

    let x = v.0.x;
    let y = h.0.y;
    let (h_min, h_max) = (h.0.x.min(h.1.x), h.0.x.max(h.1.x));
    let (v_min, v_max) = (v.0.y.min(v.1.y), v.0.y.max(v.1.y));
    if x >= h_min - EPSILON && x <= h_max + EPSILON && y >= v_min - EPSILON && y <= v_max + EPSILON {
        Some(Point::new(x, y))
    } else {
        None
    }
}

/// Orientation of a segment
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    /// constant y
    Horizontal,
    /// constant x
    Vertical,
    /// both coordinates change, or the segment has no length
    Other,
}

/// Classifies the segment from `a` to `b`
pub fn orientation(a: Point, b: Point) -> Orientation {
    let same_x = (a.x - b.x).abs() <= EPSILON;
    let same_y = (a.y - b.y).abs() <= EPSILON;
    match (same_x, same_y) {
        (false, true) => Orientation::Horizontal,
        (true, false) => Orientation::Vertical,
        _ => Orientation::Other,
    }
}

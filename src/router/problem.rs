use crate::error::RouteError;
use crate::geometry::{euclidean_distance, Bounds, LayerId, Point, Point3};
use crate::obstacle::{NetId, Obstacle};
use crate::search::ExhaustReason;
use std::ops::Deref;

/// Two points that have to be joined by a trace.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Connection {
    /// the network the trace belongs to
    pub name: NetId,
    /// the points to join, in order. Exactly two are supported.
    pub points_to_connect: Vec<Point3>,
}

impl Connection {
    /// A connection from `start` to `end`
    pub fn new(name: impl Into<NetId>, start: Point3, end: Point3) -> Connection {
        Connection {
            name: name.into(),
            points_to_connect: vec![start, end],
        }
    }

    /// Checks that the connection has exactly two points, all on existing layers, and returns them.
    pub fn endpoints(&self, layer_count: usize) -> Result<(Point3, Point3), RouteError> {
        let count = self.points_to_connect.len();
        if count > 2 {
            return Err(RouteError::TooManyPoints {
                connection: self.name.clone(),
                count,
            });
        }
        if let Some(p) = self.points_to_connect.iter().find(|p| p.layer >= layer_count) {
            return Err(RouteError::LayerOutOfRange {
                connection: self.name.clone(),
                layer: p.layer,
                layer_count,
            });
        }
        match *self.points_to_connect.as_slice() {
            [start, end] => Ok((start, end)),
            _ => Err(RouteError::TooFewPoints {
                connection: self.name.clone(),
                count,
            }),
        }
    }
}

/// Everything the router needs to know about a board.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct RouteProblem {
    /// number of copper layers
    pub layer_count: usize,
    /// pads, holes and keepouts
    pub obstacles: Vec<Obstacle>,
    /// the traces to route, in the order they are routed
    pub connections: Vec<Connection>,
    /// the routable area
    pub bounds: Option<Bounds>,
}

impl RouteProblem {
    /// An empty board with `layer_count` layers
    pub fn new(layer_count: usize) -> RouteProblem {
        RouteProblem {
            layer_count,
            obstacles: vec![],
            connections: vec![],
            bounds: None,
        }
    }
}

/// A layer change within a [`Route`]
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Via {
    /// where the via is placed
    pub position: Point,
    /// the layer the route comes from
    pub from: LayerId,
    /// the layer the route continues on
    pub to: LayerId,
}

/// A solved trace: an orthogonal polyline that changes layers through vias.
///
/// ## Examples
/// ```
/// # use trace_autorouter::{Route, geometry::Point3};
/// let route = Route::new(vec![
///     Point3::new(0.0, 0.0, 0),
///     Point3::new(2.0, 0.0, 0),
///     Point3::new(2.0, 0.0, 1),
///     Point3::new(2.0, 3.0, 1),
/// ]);
///
/// assert_eq!(route.length(), 5.0);
/// assert_eq!(route.vias().len(), 1);
/// assert_eq!(route.segments().count(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Route {
    /// the points of the route, from start to end
    pub points: Vec<Point3>,
}

impl Route {
    /// Creates a new Route
    pub fn new(points: Vec<Point3>) -> Route {
        Route { points }
    }

    /// Every place where two consecutive points are on different layers
    pub fn vias(&self) -> Vec<Via> {
        self.points
            .windows(2)
            .filter(|w| w[0].layer != w[1].layer)
            .map(|w| Via {
                position: w[0].planar(),
                from: w[0].layer,
                to: w[1].layer,
            })
            .collect()
    }

    /// Total length of the planar segments
    pub fn length(&self) -> f64 {
        self.segments().map(|(a, b)| euclidean_distance(a, b)).sum()
    }

    /// All pairs of consecutive points on the same layer
    pub fn segments(&self) -> impl Iterator<Item = (Point3, Point3)> + '_ {
        self.points
            .windows(2)
            .filter(|w| w[0].layer == w[1].layer)
            .map(|w| (w[0], w[1]))
    }
}

impl Deref for Route {
    type Target = [Point3];
    fn deref(&self) -> &[Point3] {
        &self.points
    }
}

/// What happened to a single [`Connection`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum ConnectionResult {
    /// a route was found
    Solved {
        /// name of the connection
        connection_name: NetId,
        /// the route
        route: Route,
    },
    /// the search gave up
    Unsolved {
        /// name of the connection
        connection_name: NetId,
        /// why the search gave up
        reason: ExhaustReason,
    },
}

impl ConnectionResult {
    /// name of the connection
    pub fn connection_name(&self) -> &str {
        match self {
            ConnectionResult::Solved { connection_name, .. } | ConnectionResult::Unsolved { connection_name, .. } => {
                connection_name
            }
        }
    }

    /// `true` if a route was found
    pub fn is_solved(&self) -> bool {
        matches!(self, ConnectionResult::Solved { .. })
    }

    /// The route, if one was found
    pub fn route(&self) -> Option<&Route> {
        match self {
            ConnectionResult::Solved { route, .. } => Some(route),
            ConnectionResult::Unsolved { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints() {
        let a = Point3::new(0.0, 0.0, 0);
        let b = Point3::new(1.0, 0.0, 1);
        assert_eq!(Connection::new("A", a, b).endpoints(2), Ok((a, b)));
        assert_eq!(
            Connection::new("A", a, b).endpoints(1),
            Err(RouteError::LayerOutOfRange {
                connection: "A".into(),
                layer: 1,
                layer_count: 1
            })
        );

        let three = Connection {
            name: "B".into(),
            points_to_connect: vec![a, a, a],
        };
        assert!(matches!(three.endpoints(2), Err(RouteError::TooManyPoints { count: 3, .. })));

        let one = Connection {
            name: "C".into(),
            points_to_connect: vec![a],
        };
        assert!(matches!(one.endpoints(2), Err(RouteError::TooFewPoints { count: 1, .. })));
    }

    #[test]
    fn result_accessors() {
        let solved = ConnectionResult::Solved {
            connection_name: "A".into(),
            route: Route::new(vec![Point3::new(0.0, 0.0, 0), Point3::new(0.0, 1.0, 0)]),
        };
        assert!(solved.is_solved());
        assert_eq!(solved.connection_name(), "A");
        assert_eq!(solved.route().map(|r| r.len()), Some(2));

        let unsolved = ConnectionResult::Unsolved {
            connection_name: "B".into(),
            reason: ExhaustReason::EmptyOpenSet,
        };
        assert!(!unsolved.is_solved());
        assert_eq!(unsolved.route(), None);
    }
}

//! The multi-connection driver.

mod problem;
pub use self::problem::{Connection, ConnectionResult, Route, RouteProblem, Via};

mod traces;
use self::traces::route_obstacles;

use crate::config::RouterConfig;
use crate::debug::DebugContext;
use crate::error::RouteError;
use crate::geometry::Bounds;
use crate::layers::layer_names;
use crate::neighbors::NeighborStrategy;
use crate::obstacle::Obstacle;
use crate::obstacle_index::IndexConfig;
use crate::post_process::{remove_collinear_points, remove_path_loops, segment_blocked, shorten_path_with_shortcuts};
use crate::search::{SearchEngine, SearchOutcome};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Routes every [`Connection`] of a [`RouteProblem`].
///
/// Connections are routed one after another in the order they are listed. Every finished
/// route becomes an obstacle for the connections after it, so the order matters: earlier
/// connections get the short routes.
///
/// ## Examples
/// ```
/// # use trace_autorouter::prelude::*;
/// let mut problem = RouteProblem::new(1);
/// problem
///     .obstacles
///     .push(Obstacle::rect(Point::new(0.0, 0.0), 1.0, 1.0, [0]));
/// problem.connections.push(Connection::new(
///     "A",
///     Point3::new(-3.0, 0.0, 0),
///     Point3::new(3.0, 0.0, 0),
/// ));
///
/// let mut router = Autorouter::new(problem, RouterConfig::default()).unwrap();
/// let results = router.solve_all().unwrap();
///
/// let route = results[0].route().unwrap();
/// assert_eq!(route[0], Point3::new(-3.0, 0.0, 0));
/// assert_eq!(route[route.len() - 1], Point3::new(3.0, 0.0, 0));
/// assert!(route.length() > 6.0);
/// ```
#[derive(Debug)]
pub struct Autorouter {
    problem: RouteProblem,
    config: RouterConfig,
    strategy: Box<dyn NeighborStrategy>,
    debug: DebugContext,
}

impl Autorouter {
    /// Creates a new Autorouter.
    ///
    /// ## Errors
    /// - [`RouteError::InvalidConfig`] if `config` fails [`RouterConfig::validate`] or the
    ///   board has no layers
    /// - the error of [`Connection::endpoints`] for the first malformed connection
    pub fn new(problem: RouteProblem, config: RouterConfig) -> Result<Autorouter, RouteError> {
        config.validate()?;
        if problem.layer_count == 0 {
            return Err(RouteError::InvalidConfig("the board needs at least one layer".into()));
        }
        for connection in problem.connections.iter() {
            connection.endpoints(problem.layer_count)?;
        }
        let strategy = config.strategy(problem.layer_count);
        Ok(Autorouter {
            problem,
            config,
            strategy,
            debug: DebugContext::new(),
        })
    }

    /// Replaces the [`DebugContext`] that collects statistics of every search.
    pub fn with_debug(mut self, debug: DebugContext) -> Autorouter {
        self.debug = debug;
        self
    }

    /// The statistics collected so far
    pub fn debug(&self) -> &DebugContext {
        &self.debug
    }

    /// Gives the [`DebugContext`] back, leaving an empty one in its place.
    pub fn take_debug(&mut self) -> DebugContext {
        let fresh = DebugContext {
            record_snapshots: self.debug.record_snapshots,
            ..Default::default()
        };
        std::mem::replace(&mut self.debug, fresh)
    }

    /// The board being routed
    pub fn problem(&self) -> &RouteProblem {
        &self.problem
    }

    /// The options in use
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Names of the layers of the board, see [`layer_names`]
    pub fn layer_names(&self) -> Vec<String> {
        layer_names(self.problem.layer_count)
    }

    /// Routes all connections in order, each one avoiding the traces of those before it.
    ///
    /// Returns one result per connection, in input order.
    pub fn solve_all(&mut self) -> Result<Vec<ConnectionResult>, RouteError> {
        let mut traces = Vec::new();
        let mut results = Vec::with_capacity(self.problem.connections.len());
        for i in 0..self.problem.connections.len() {
            let connection = self.problem.connections[i].clone();
            let result = self.solve_connection(&connection, &traces)?;
            if let ConnectionResult::Solved { route, .. } = &result {
                traces.extend(route_obstacles(
                    route,
                    &connection.name,
                    self.config.trace_thickness,
                    self.config.layers.via_diameter,
                ));
            }
            results.push(result);
        }
        Ok(results)
    }

    /// Routes a single connection against the obstacles of the board plus `traces`.
    ///
    /// Obstacles connected to the net of `connection` are ignored, including traces.
    pub fn solve_connection(
        &mut self,
        connection: &Connection,
        traces: &[Obstacle],
    ) -> Result<ConnectionResult, RouteError> {
        let board = Board {
            layer_count: self.problem.layer_count,
            bounds: self.problem.bounds,
            obstacles: &self.problem.obstacles,
        };
        route_connection(
            &board,
            traces,
            connection,
            &self.config,
            &*self.strategy,
            Some(&mut self.debug),
        )
    }

    /// Routes every connection against the obstacles of the board only, in parallel.
    ///
    /// Routes do not see each other, so they may cross. Use this for connections that are known
    /// not to interact or to check which connections can be routed at all. The results are in
    /// input order and the statistics are merged into [`debug`](Autorouter::debug) in that
    /// order too.
    #[cfg(feature = "parallel")]
    pub fn solve_independent(&mut self) -> Result<Vec<ConnectionResult>, RouteError> {
        let board = Board {
            layer_count: self.problem.layer_count,
            bounds: self.problem.bounds,
            obstacles: &self.problem.obstacles,
        };
        let config = &self.config;
        let strategy = &*self.strategy;
        let record_snapshots = self.debug.record_snapshots;

        let solved = self
            .problem
            .connections
            .par_iter()
            .map(|connection| {
                let mut debug = DebugContext {
                    record_snapshots,
                    ..Default::default()
                };
                route_connection(&board, &[], connection, config, strategy, Some(&mut debug))
                    .map(|result| (result, debug))
            })
            .collect::<Result<Vec<_>, RouteError>>()?;

        let mut results = Vec::with_capacity(solved.len());
        for (result, debug) in solved {
            self.debug.stats += debug.stats;
            self.debug.snapshots.extend(debug.snapshots);
            results.push(result);
        }
        Ok(results)
    }
}

/// The parts of a [`RouteProblem`] every connection is routed against
#[derive(Clone, Copy, Debug)]
struct Board<'a> {
    layer_count: usize,
    bounds: Option<Bounds>,
    obstacles: &'a [Obstacle],
}

fn route_connection(
    board: &Board,
    traces: &[Obstacle],
    connection: &Connection,
    config: &RouterConfig,
    strategy: &dyn NeighborStrategy,
    mut debug: Option<&mut DebugContext>,
) -> Result<ConnectionResult, RouteError> {
    let (start, goal) = connection.endpoints(board.layer_count)?;
    let name = &connection.name;

    let obstacles: Vec<Obstacle> = board
        .obstacles
        .iter()
        .chain(traces)
        .filter(|o| !o.is_connected_to(name))
        .cloned()
        .collect();
    log_debug!(
        "routing `{}` from {} to {} past {} obstacles",
        name,
        start,
        goal,
        obstacles.len()
    );

    let index = config.index_kind.build(
        obstacles,
        IndexConfig {
            layer_count: board.layer_count,
            grid_step: config.search.grid_step,
            bounds: board.bounds,
        },
    );

    let outcome = {
        let mut engine = SearchEngine::new(strategy, &*index, config.search);
        if let Some(debug) = debug.as_deref_mut() {
            engine = engine.with_debug(debug, name.clone());
        }
        engine.solve(start, goal)
    };

    let result = match outcome {
        SearchOutcome::Solved { path, iterations } => {
            let mut points = path.into_inner();
            if config.remove_loops {
                points = remove_path_loops(&points);
            }
            if config.shortcuts {
                let margin = config.jump.obstacle_margin;
                points = shorten_path_with_shortcuts(&points, |a, b| segment_blocked(&*index, margin, a, b));
            }
            if config.remove_collinear {
                points = remove_collinear_points(&points);
            }
            let route = Route::new(points);
            log_debug!(
                "`{}` solved after {} iterations: {} points, {} vias, length {:.3}",
                name,
                iterations,
                route.len(),
                route.vias().len(),
                route.length()
            );
            ConnectionResult::Solved {
                connection_name: name.clone(),
                route,
            }
        }
        SearchOutcome::Exhausted { iterations, reason } => {
            log_debug!("`{}` not solved after {} iterations: {:?}", name, iterations, reason);
            ConnectionResult::Unsolved {
                connection_name: name.clone(),
                reason,
            }
        }
    };

    if let Some(debug) = debug {
        if result.is_solved() {
            debug.stats.connections_solved += 1;
        } else {
            debug.stats.connections_unsolved += 1;
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Point3};

    fn single_obstacle() -> RouteProblem {
        let mut problem = RouteProblem::new(1);
        problem.obstacles.push(Obstacle::rect(Point::new(0.0, 0.0), 1.0, 1.0, [0]));
        problem.connections.push(Connection::new(
            "A",
            Point3::new(-3.0, 0.0, 0),
            Point3::new(3.0, 0.0, 0),
        ));
        problem
    }

    #[test]
    fn rejects_bad_input() {
        let mut problem = single_obstacle();
        problem.connections[0].points_to_connect.push(Point3::new(0.0, 3.0, 0));
        assert!(matches!(
            Autorouter::new(problem, RouterConfig::default()),
            Err(RouteError::TooManyPoints { count: 3, .. })
        ));

        let problem = RouteProblem::new(0);
        assert!(matches!(
            Autorouter::new(problem, RouterConfig::default()),
            Err(RouteError::InvalidConfig(_))
        ));

        let mut config = RouterConfig::default();
        config.search.max_iterations = 0;
        assert!(Autorouter::new(single_obstacle(), config).is_err());
    }

    #[test]
    fn detour() {
        let mut router = Autorouter::new(single_obstacle(), RouterConfig::default()).unwrap();
        let results = router.solve_all().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].connection_name(), "A");

        let route = results[0].route().unwrap();
        assert!(route.length() >= 6.0 + 2.0 * 0.65 - 1e-9);
        assert!(route.iter().any(|p| p.y.abs() >= 0.65 - 1e-9));
        assert!(route.vias().is_empty());
        assert_eq!(router.debug().stats.connections_solved, 1);
        assert!(router.debug().stats.iterations > 0);
    }

    #[test]
    fn own_net_is_ignored() {
        let mut problem = single_obstacle();
        problem.obstacles[0] = problem.obstacles[0].clone().connected_to("A");
        let mut router = Autorouter::new(problem, RouterConfig::default()).unwrap();
        let results = router.solve_all().unwrap();

        let route = results[0].route().unwrap();
        assert_eq!(route.len(), 2);
        assert!((route.length() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn traces_block_later_connections() {
        let mut problem = RouteProblem::new(1);
        problem.connections.push(Connection::new(
            "A",
            Point3::new(0.0, -3.0, 0),
            Point3::new(0.0, 3.0, 0),
        ));
        problem.connections.push(Connection::new(
            "B",
            Point3::new(-3.0, 0.0, 0),
            Point3::new(3.0, 0.0, 0),
        ));
        problem.bounds = Some(Bounds::new(-5.0, 5.0, -3.0, 3.0));

        let mut router = Autorouter::new(problem, RouterConfig::default()).unwrap();
        let results = router.solve_all().unwrap();
        assert!(results[0].is_solved());
        // the trace of A spans the whole height of the board
        assert!(matches!(
            &results[1],
            ConnectionResult::Unsolved { connection_name, .. } if connection_name == "B"
        ));
        assert_eq!(router.debug().stats.connections_unsolved, 1);

        // without A, B goes straight
        let mut router = Autorouter::new(router.problem().clone(), RouterConfig::default()).unwrap();
        let b = router.problem().connections[1].clone();
        let result = router.solve_connection(&b, &[]).unwrap();
        assert_eq!(result.route().map(|r| r.len()), Some(2));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn independent_connections_ignore_each_other() {
        let mut problem = RouteProblem::new(1);
        problem.connections.push(Connection::new(
            "A",
            Point3::new(0.0, -3.0, 0),
            Point3::new(0.0, 3.0, 0),
        ));
        problem.connections.push(Connection::new(
            "B",
            Point3::new(-3.0, 0.0, 0),
            Point3::new(3.0, 0.0, 0),
        ));

        let mut router = Autorouter::new(problem, RouterConfig::default()).unwrap();
        let results = router.solve_independent().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].connection_name(), "A");
        assert_eq!(results[1].connection_name(), "B");
        assert!(results.iter().all(|r| r.is_solved()));
        assert_eq!(router.debug().stats.connections_solved, 2);
    }
}

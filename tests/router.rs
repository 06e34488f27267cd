use nanorand::{Rng, WyRand};
use trace_autorouter::geometry::{manhattan_distance, orientation, Dir, Orientation};
use trace_autorouter::post_process::{remove_collinear_points, remove_path_loops, segment_blocked, shorten_path_with_shortcuts};
use trace_autorouter::prelude::*;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Replays every segment of `route` through `index` and checks that all of them keep the
/// default obstacle margin.
fn assert_sound(index: &dyn ObstacleIndex, route: &Route) {
    let margin = RouterConfig::default().jump.obstacle_margin - 1e-6;
    for (a, b) in route.segments() {
        assert_ne!(
            orientation(a.planar(), b.planar()),
            Orientation::Other,
            "{} -> {} is not orthogonal",
            a,
            b
        );
        let dir = match Dir::between(a, b) {
            Some(dir) => dir,
            None => continue,
        };
        let wall = index.directional_collision(a, dir, margin).wall_distance;
        let length = manhattan_distance(a, b);
        // `wall` runs to the real edge, so the margin is needed in front of the obstacle too
        assert!(
            wall >= length + margin - 1e-6,
            "{} -> {} comes closer than {} to an obstacle after {}",
            a,
            b,
            margin,
            wall
        );
    }
    for via in route.vias() {
        assert!(!index.is_occupied(via.position, via.from, margin), "via at {}", via.position);
        assert!(!index.is_occupied(via.position, via.to, margin), "via at {}", via.position);
    }
}

fn index_for(problem: &RouteProblem, net: &str) -> Box<dyn ObstacleIndex> {
    let obstacles = problem
        .obstacles
        .iter()
        .filter(|o| !o.is_connected_to(net))
        .cloned()
        .collect();
    IndexKind::LinearScan.build(
        obstacles,
        IndexConfig {
            layer_count: problem.layer_count,
            bounds: problem.bounds,
            ..Default::default()
        },
    )
}

#[test]
fn detour_around_single_obstacle() {
    init();
    let start = Point3::new(-3.0, 0.0, 0);
    let goal = Point3::new(3.0, 0.0, 0);
    let mut problem = RouteProblem::new(1);
    problem.obstacles.push(Obstacle::rect(Point::new(0.0, 0.0), 1.0, 1.0, [0]));
    problem.connections.push(Connection::new("A", start, goal));

    for index_kind in [IndexKind::LinearScan, IndexKind::default()] {
        let config = RouterConfig {
            index_kind,
            ..Default::default()
        };
        let mut router = Autorouter::new(problem.clone(), config).unwrap();
        let results = router.solve_all().unwrap();
        let route = results[0].route().expect("a route around the obstacle");

        assert_eq!(route[0], start);
        assert_eq!(route[route.len() - 1], goal);
        assert!(route.length() >= 6.0 + 2.0 * 0.65 - 1e-9, "length {}", route.length());
        let max_y = route.iter().map(|p| p.y.abs()).fold(0.0, f64::max);
        assert!(max_y >= 0.65 - 1e-9, "max |y| {}", max_y);
        assert_sound(&*index_for(&problem, "A"), route);
    }
}

#[test]
fn oval_obstacle() {
    init();
    let mut problem = RouteProblem::new(1);
    problem.obstacles.push(Obstacle::oval(Point::new(0.0, 0.0), 2.0, 1.0, [0]));
    problem.connections.push(Connection::new(
        "A",
        Point3::new(-3.0, 0.0, 0),
        Point3::new(3.0, 0.0, 0),
    ));

    let mut router = Autorouter::new(problem.clone(), RouterConfig::default()).unwrap();
    let results = router.solve_all().unwrap();
    let route = results[0].route().unwrap();
    assert!(route.length() > 6.0);
    assert_sound(&*index_for(&problem, "A"), route);
}

#[test]
fn same_net_pads_do_not_block() {
    init();
    let mut problem = RouteProblem::new(1);
    problem
        .obstacles
        .push(Obstacle::rect(Point::new(0.0, 0.0), 1.0, 1.0, [0]).connected_to("A"));
    problem.connections.push(Connection::new(
        "A",
        Point3::new(-3.0, 0.0, 0),
        Point3::new(0.0, 0.0, 0),
    ));
    problem.connections.push(Connection::new(
        "A",
        Point3::new(0.0, 0.0, 0),
        Point3::new(0.0, 3.0, 0),
    ));
    problem.connections.push(Connection::new(
        "B",
        Point3::new(-3.0, -2.0, 0),
        Point3::new(3.0, -2.0, 0),
    ));

    let mut router = Autorouter::new(problem, RouterConfig::default()).unwrap();
    let results = router.solve_all().unwrap();
    for result in results.iter() {
        // straight lines: neither the shared pad nor the first trace of A are in the way
        assert_eq!(result.route().map(|r| r.len()), Some(2), "{:?}", result);
    }
}

#[test]
fn foreign_pads_block() {
    init();
    let mut problem = RouteProblem::new(1);
    problem
        .obstacles
        .push(Obstacle::rect(Point::new(0.0, 0.0), 1.0, 1.0, [0]).connected_to("A"));
    problem.connections.push(Connection::new(
        "B",
        Point3::new(-3.0, 0.0, 0),
        Point3::new(3.0, 0.0, 0),
    ));

    let mut router = Autorouter::new(problem.clone(), RouterConfig::default()).unwrap();
    let results = router.solve_all().unwrap();
    let route = results[0].route().unwrap();
    assert!(route.len() > 2);
    assert_sound(&*index_for(&problem, "B"), route);
}

#[test]
fn malformed_connections() {
    let a = Point3::new(0.0, 0.0, 0);
    let b = Point3::new(1.0, 0.0, 0);

    let mut problem = RouteProblem::new(1);
    problem.connections.push(Connection {
        name: "A".into(),
        points_to_connect: vec![a, b, a],
    });
    let err = Autorouter::new(problem, RouterConfig::default()).unwrap_err();
    assert_eq!(
        err,
        RouteError::TooManyPoints {
            connection: "A".into(),
            count: 3
        }
    );
    assert_eq!(
        err.to_string(),
        "connection `A` has 3 points, at most 2 are supported"
    );

    let mut problem = RouteProblem::new(1);
    problem.connections.push(Connection {
        name: "B".into(),
        points_to_connect: vec![a],
    });
    assert!(matches!(
        Autorouter::new(problem, RouterConfig::default()),
        Err(RouteError::TooFewPoints { count: 1, .. })
    ));

    let mut problem = RouteProblem::new(2);
    problem.connections.push(Connection::new("C", a, Point3::new(1.0, 0.0, 2)));
    assert!(matches!(
        Autorouter::new(problem, RouterConfig::default()),
        Err(RouteError::LayerOutOfRange { layer: 2, layer_count: 2, .. })
    ));
}

fn layer_changes(points: &[Point3]) -> usize {
    points.windows(2).filter(|w| w[0].layer != w[1].layer).count()
}

/// Two layers, with a wall across the whole board on the top layer only.
fn wall_problem() -> RouteProblem {
    let mut problem = RouteProblem::new(2);
    problem.bounds = Some(Bounds::new(-5.0, 5.0, -3.0, 3.0));
    problem.obstacles.push(Obstacle::rect(Point::new(0.0, 0.0), 1.0, 8.0, [0]));
    problem.connections.push(Connection::new(
        "A",
        Point3::new(-3.0, 0.0, 0),
        Point3::new(3.0, 0.0, 0),
    ));
    problem
}

#[test]
fn via_through_wall() {
    init();
    let problem = wall_problem();

    let mut router = Autorouter::new(problem.clone(), RouterConfig::default()).unwrap();
    let results = router.solve_all().unwrap();
    let route = results[0].route().expect("a route through the bottom layer");

    assert_eq!(route.vias().len(), 2);
    assert!(route.iter().any(|p| p.layer == 1));
    assert_sound(&*index_for(&problem, "A"), route);

    // a single layer strategy has no way across
    let config = RouterConfig {
        neighbor_mode: NeighborMode::Jump,
        ..Default::default()
    };
    let mut router = Autorouter::new(problem, config).unwrap();
    assert!(!router.solve_all().unwrap()[0].is_solved());
}

#[test]
fn post_processing_keeps_every_via() {
    init();
    let problem = wall_problem();
    let config = RouterConfig::default();
    let connection = &problem.connections[0];
    let (start, goal) = (connection.points_to_connect[0], connection.points_to_connect[1]);

    let index = index_for(&problem, "A");
    let strategy = config.strategy(problem.layer_count);
    let raw = SearchEngine::new(&*strategy, &*index, config.search).solve(start, goal);
    let raw = raw.path().expect("a raw path through the bottom layer");

    let mut router = Autorouter::new(problem.clone(), config.clone()).unwrap();
    let results = router.solve_all().unwrap();
    let route = results[0].route().unwrap();
    assert_eq!(route.vias().len(), layer_changes(&raw.path));

    // down to layer 1 and back, then across the first stretch on layer 0
    let l0 = |x, y| Point3::new(x, y, 0);
    let l1 = |x, y| Point3::new(x, y, 1);
    let looping = vec![
        l0(0.0, 0.0),
        l0(5.0, 0.0),
        l0(5.0, 3.0),
        l1(5.0, 3.0),
        l1(3.0, 3.0),
        l0(3.0, 3.0),
        l0(3.0, -3.0),
    ];
    let empty = IndexKind::LinearScan.build(
        vec![],
        IndexConfig {
            layer_count: 2,
            ..Default::default()
        },
    );
    let margin = config.jump.obstacle_margin;
    let mut points = remove_path_loops(&looping);
    points = shorten_path_with_shortcuts(&points, |a, b| segment_blocked(&*empty, margin, a, b));
    points = remove_collinear_points(&points);
    assert_eq!(layer_changes(&points), layer_changes(&looping));
    assert_eq!(Route::new(points).vias().len(), 2);
}

#[test]
fn traces_become_obstacles() {
    init();
    let mut problem = RouteProblem::new(2);
    problem.bounds = Some(Bounds::new(-5.0, 5.0, -3.0, 3.0));
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
    let results = router.solve_all().unwrap();

    let a = results[0].route().unwrap();
    assert_eq!(a.len(), 2);
    // B has to dive below the trace of A
    let b = results[1].route().unwrap();
    assert_eq!(b.vias().len(), 2);
    for p in b.iter().filter(|p| p.layer == 0) {
        assert!(p.x.abs() >= 0.075, "{} touches the trace of A", p);
    }
    assert_eq!(router.debug().stats.connections_solved, 2);
}

#[test]
fn random_boards_are_routed_soundly() {
    init();
    let mut rng = WyRand::new_seed(4);
    let mut solved = 0;

    for _ in 0..8 {
        let layer_count = rng.generate_range(1_usize..=2);
        let mut problem = RouteProblem::new(layer_count);
        problem.bounds = Some(Bounds::new(-12.0, 12.0, -12.0, 12.0));
        for _ in 0..15 {
            let center = Point::new(
                rng.generate_range(0_u32..=200) as f64 / 10.0 - 10.0,
                rng.generate_range(0_u32..=200) as f64 / 10.0 - 10.0,
            );
            let width = rng.generate_range(2_u32..=30) as f64 / 10.0;
            let height = rng.generate_range(2_u32..=30) as f64 / 10.0;
            let layer = rng.generate_range(0..layer_count);
            problem.obstacles.push(Obstacle::rect(center, width, height, [layer]));
        }

        let index = index_for(&problem, "");
        let free_point = |rng: &mut WyRand| loop {
            let p = Point3::new(
                rng.generate_range(0_u32..=200) as f64 / 10.0 - 10.0,
                rng.generate_range(0_u32..=200) as f64 / 10.0 - 10.0,
                rng.generate_range(0..layer_count),
            );
            if !index.is_occupied(p.planar(), p.layer, 0.5) {
                return p;
            }
        };
        let (start, goal) = (free_point(&mut rng), free_point(&mut rng));
        problem.connections.push(Connection::new("N", start, goal));

        let mut router = Autorouter::new(problem, RouterConfig::default()).unwrap();
        let results = router.solve_all().unwrap();
        if let Some(route) = results[0].route() {
            solved += 1;
            assert_eq!(route[0], start);
            assert_eq!(route[route.len() - 1], goal);
            assert_sound(&*index, route);
        }
    }
    assert!(solved > 0);
}

#[test]
fn debug_snapshots() {
    init();
    let mut problem = RouteProblem::new(1);
    problem.obstacles.push(Obstacle::rect(Point::new(0.0, 0.0), 1.0, 1.0, [0]));
    problem.connections.push(Connection::new(
        "A",
        Point3::new(-3.0, 0.0, 0),
        Point3::new(3.0, 0.0, 0),
    ));

    let mut router = Autorouter::new(problem, RouterConfig::default())
        .unwrap()
        .with_debug(DebugContext::with_snapshots());
    router.solve_all().unwrap();

    let debug = router.take_debug();
    assert_eq!(debug.snapshots.len(), debug.stats.iterations);
    assert!(debug.snapshots.iter().all(|s| s.connection == "A"));
    assert_eq!(debug.snapshots[0].expanded, Point3::new(-3.0, 0.0, 0));
    assert!(debug.stats.nodes_created > debug.stats.iterations);
    assert_eq!(router.debug().stats.iterations, 0);
}

#[cfg(feature = "serde")]
#[test]
fn json_round_trip() {
    let mut problem = RouteProblem::new(2);
    problem.obstacles.push(
        Obstacle::oval(Point::new(1.0, 2.0), 0.5, 0.8, [0, 1]).connected_to("GND"),
    );
    problem.connections.push(Connection::new(
        "GND",
        Point3::new(0.0, 0.0, 0),
        Point3::new(4.0, 0.0, 1),
    ));

    let json = serde_json::to_string(&problem).unwrap();
    assert!(json.contains("pointsToConnect"));
    let parsed: RouteProblem = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, problem);

    let mut router = Autorouter::new(parsed, RouterConfig::default()).unwrap();
    let results = router.solve_all().unwrap();
    let json = serde_json::to_string(&results).unwrap();
    let parsed: Vec<ConnectionResult> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, results);

    let config: RouterConfig = serde_json::from_str(&serde_json::to_string(&RouterConfig::fast()).unwrap()).unwrap();
    assert_eq!(config, RouterConfig::fast());
}

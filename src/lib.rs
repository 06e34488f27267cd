#![warn(
    missing_docs,
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications
)]

//! A crate to route PCB traces between pads without a fixed grid.
//!
//! ## Introduction
//! Routing a trace with a regular A* search over a grid is expensive: a fine grid is needed to
//! squeeze traces between pads, and every cell of that grid becomes a Node the search has to
//! store and visit. Most of those Nodes are boring, since the only places where a trace ever
//! has to decide anything are right in front of an obstacle.
//!
//! This crate searches over continuous coordinates instead. From every Node the search jumps as
//! far as it can in each of the four directions and stops in front of the next wall, once for
//! each of a few margin tiers. Wider margins are cheaper, so traces only hug an obstacle when the
//! shorter route pays for it. A Node that stopped in front of an obstacle can jump past it (and
//! past any obstacles joined to it) in a single step. On boards with more than one layer the
//! search may also change layers through vias, wherever a via fits on both layers.
//!
//! The raw routes are then cleaned up: loops are cut out, detours replaced by shortcuts where
//! the obstacles allow it, and redundant points dropped.
//!
//! ## Examples
//! Routing a single trace around a pad:
//! ```
//! use trace_autorouter::prelude::*;
//!
//! let mut problem = RouteProblem::new(1);
//! problem
//!     .obstacles
//!     .push(Obstacle::rect(Point::new(0.0, 0.0), 1.0, 1.0, [0]));
//! problem.connections.push(Connection::new(
//!     "GND",
//!     Point3::new(-3.0, 0.0, 0),
//!     Point3::new(3.0, 0.0, 0),
//! ));
//!
//! let mut router = Autorouter::new(problem, RouterConfig::default()).unwrap();
//! let results = router.solve_all().unwrap();
//!
//! let route = results[0].route().unwrap();
//! // the route keeps the margin to the pad
//! assert!(route.iter().any(|p| p.y.abs() >= 0.5 + 0.15 - 1e-9));
//! ```
//!
//! Connections are routed in order, and every routed trace becomes an obstacle for the
//! connections after it. Obstacles that belong to the net of a connection never block it:
//! ```
//! use trace_autorouter::prelude::*;
//!
//! let mut problem = RouteProblem::new(2);
//! problem.obstacles.push(
//!     Obstacle::rect(Point::new(0.0, 0.0), 1.0, 1.0, [0, 1]).connected_to("VCC"),
//! );
//! problem.connections.push(Connection::new(
//!     "VCC",
//!     Point3::new(-3.0, 0.0, 0),
//!     Point3::new(3.0, 0.0, 0),
//! ));
//!
//! let mut router = Autorouter::new(problem, RouterConfig::default()).unwrap();
//! let results = router.solve_all().unwrap();
//!
//! assert_eq!(results[0].route().unwrap().len(), 2);
//! ```
//!
//! ### Using the pieces
//! The [`Autorouter`] is a thin driver. The [`SearchEngine`](search::SearchEngine) can be used
//! with any [`ObstacleIndex`](obstacle_index::ObstacleIndex) and
//! [`NeighborStrategy`](neighbors::NeighborStrategy), and can be stepped one iteration at a time:
//! ```
//! use trace_autorouter::prelude::*;
//!
//! let index = IndexKind::LinearScan.build(vec![], IndexConfig::default());
//! let strategy = GridNeighbors::new();
//! let mut engine = SearchEngine::new(&strategy, &*index, SearchConfig::default());
//!
//! engine.begin(Point3::new(0.0, 0.0, 0), Point3::new(1.0, 0.0, 0));
//! assert_eq!(engine.state(), SearchState::Ready);
//! while !engine.step().is_finished() {}
//! assert_eq!(engine.state(), SearchState::Solved);
//! ```
//!
//! ### Configuration
//! [`RouterConfig`] gathers all options. Besides the defaults there are presets that search
//! less ([`RouterConfig::fast`]) or more ([`RouterConfig::thorough`]):
//! ```
//! use trace_autorouter::prelude::*;
//!
//! let config = RouterConfig {
//!     neighbor_mode: NeighborMode::Jump,
//!     index_kind: IndexKind::LinearScan,
//!     ..RouterConfig::fast()
//! };
//! assert!(config.validate().is_ok());
//! ```
//!
//! ## Crate features
//! - `parallel` (default): [`Autorouter::solve_independent`] routes connections on all cores
//! - `log` (default): trace every search iteration through the [`log`](https://docs.rs/log) facade
//! - `serde`: (de)serialize problems, results and options

#[cfg(feature = "log")]
macro_rules! log_trace {
    ($($arg:tt)*) => { log::trace!($($arg)*) };
}
#[cfg(not(feature = "log"))]
macro_rules! log_trace {
    ($($arg:tt)*) => {{ let _ = format_args!($($arg)*); }};
}

#[cfg(feature = "log")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}
#[cfg(not(feature = "log"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {{ let _ = format_args!($($arg)*); }};
}

pub mod geometry;

pub mod layers;

pub mod obstacle;

pub mod obstacle_index;

pub mod search;

pub mod neighbors;

pub mod post_process;

pub mod debug;

mod error;
pub use self::error::RouteError;

mod config;
pub use self::config::{NeighborMode, RouterConfig};

mod router;
pub use self::router::{Autorouter, Connection, ConnectionResult, Route, RouteProblem, Via};

/// The types needed for almost every use of this crate
pub mod prelude {
    pub use crate::debug::DebugContext;
    pub use crate::geometry::{Bounds, LayerId, Point, Point3};
    pub use crate::neighbors::{
        GridNeighbors, JumpConfig, JumpNeighbors, LayerConfig, LayeredJumpNeighbors, MarginTier, NeighborStrategy,
    };
    pub use crate::obstacle::Obstacle;
    pub use crate::obstacle_index::{IndexConfig, IndexKind, ObstacleIndex};
    pub use crate::search::{SearchConfig, SearchEngine, SearchOutcome, SearchState};
    pub use crate::{
        Autorouter, Connection, ConnectionResult, NeighborMode, Route, RouteError, RouteProblem, RouterConfig,
    };
}

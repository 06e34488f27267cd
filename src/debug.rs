//! Counters and optional per-iteration traces for inspecting a routing run.
//!
//! Nothing in here affects the result of a search. A [`DebugContext`] is handed to an
//! [`Autorouter`](crate::Autorouter) or a single [`SearchEngine`](crate::search::SearchEngine)
//! and lives exactly as long as the caller keeps it.

use crate::geometry::Point3;
use crate::search::Cost;

/// Counters accumulated over every search that used the same [`DebugContext`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// nodes popped from the open set and expanded
    pub iterations: usize,
    /// nodes inserted into the open set
    pub nodes_created: usize,
    /// open nodes replaced by a cheaper node at the same position
    pub nodes_replaced: usize,
    /// candidates discarded because they landed inside an obstacle
    pub neighbors_rejected: usize,
    /// layer changes that were checked for via clearance
    pub vias_considered: usize,
    /// connections that produced a route
    pub connections_solved: usize,
    /// connections that were given up on
    pub connections_unsolved: usize,
}

impl std::ops::AddAssign for SearchStats {
    fn add_assign(&mut self, rhs: SearchStats) {
        self.iterations += rhs.iterations;
        self.nodes_created += rhs.nodes_created;
        self.nodes_replaced += rhs.nodes_replaced;
        self.neighbors_rejected += rhs.neighbors_rejected;
        self.vias_considered += rhs.vias_considered;
        self.connections_solved += rhs.connections_solved;
        self.connections_unsolved += rhs.connections_unsolved;
    }
}

/// The state of the open set right after one node was expanded.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IterationSnapshot {
    /// name of the connection being routed
    pub connection: String,
    /// 1-based number of the iteration
    pub iteration: usize,
    /// the node that was expanded
    pub expanded: Point3,
    /// every node still waiting in the open set, with its `f` value
    pub open: Vec<(Point3, Cost)>,
}

/// Collects [`SearchStats`] and, if enabled, [`IterationSnapshot`]s.
///
/// ## Examples
/// ```
/// # use trace_autorouter::debug::DebugContext;
/// let mut debug = DebugContext::with_snapshots();
/// assert!(debug.record_snapshots);
/// assert!(debug.snapshots.is_empty());
///
/// debug.stats.iterations += 3;
/// debug.clear();
/// assert_eq!(debug.stats.iterations, 0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct DebugContext {
    /// store an [`IterationSnapshot`] for every iteration. This gets expensive quickly.
    pub record_snapshots: bool,
    /// the counters
    pub stats: SearchStats,
    /// the recorded snapshots, in the order they were taken
    pub snapshots: Vec<IterationSnapshot>,
}

impl DebugContext {
    /// A context that only counts
    pub fn new() -> DebugContext {
        DebugContext::default()
    }

    /// A context that also records every iteration
    pub fn with_snapshots() -> DebugContext {
        DebugContext {
            record_snapshots: true,
            ..Default::default()
        }
    }

    /// Resets counters and drops all snapshots
    pub fn clear(&mut self) {
        self.stats = SearchStats::default();
        self.snapshots.clear();
    }
}

use super::{Cost, Neighbor, NodeArena, NodeId, NodeLookup, NodeStatus, OpenEntry, Path, SearchConfig, SearchNode};
use crate::debug::{DebugContext, IterationSnapshot};
use crate::geometry::{manhattan_distance, Dir, Point3, EPSILON};
use crate::neighbors::{NeighborStrategy, SearchContext};
use crate::obstacle_index::ObstacleIndex;
use std::collections::BinaryHeap;
use std::time::Instant;

/// Where a [`SearchEngine`] is in its lifecycle.
///
/// ```no_code
/// Ready --step--> Expanding --step--> Solved
///                     |
///                     +-----step----> Exhausted
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchState {
    /// the start node is in the open set, nothing was expanded yet
    Ready,
    /// nodes are being expanded
    Expanding,
    /// a node close enough to the goal was reached
    Solved,
    /// the search gave up
    Exhausted,
}

impl SearchState {
    /// `true` for [`Solved`](SearchState::Solved) and [`Exhausted`](SearchState::Exhausted)
    pub fn is_finished(self) -> bool {
        matches!(self, SearchState::Solved | SearchState::Exhausted)
    }
}

/// Why a search gave up
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExhaustReason {
    /// every reachable node was expanded
    EmptyOpenSet,
    /// [`SearchConfig::max_iterations`] nodes were expanded
    IterationLimit,
    /// [`SearchConfig::time_limit`] passed
    TimeLimit,
}

/// Result of a finished search.
///
/// Exhaustion is a normal outcome, not an error.
#[derive(Clone, Debug, PartialEq)]
pub enum SearchOutcome {
    /// the goal was reached
    Solved {
        /// from the start to the goal, both included
        path: Path<Point3>,
        /// number of expanded nodes
        iterations: usize,
    },
    /// the goal could not be reached
    Exhausted {
        /// number of expanded nodes
        iterations: usize,
        /// why the search stopped
        reason: ExhaustReason,
    },
}

impl SearchOutcome {
    /// The Path, if the search was solved
    pub fn path(&self) -> Option<&Path<Point3>> {
        match self {
            SearchOutcome::Solved { path, .. } => Some(path),
            SearchOutcome::Exhausted { .. } => None,
        }
    }

    /// Number of expanded nodes
    pub fn iterations(&self) -> usize {
        match *self {
            SearchOutcome::Solved { iterations, .. } | SearchOutcome::Exhausted { iterations, .. } => iterations,
        }
    }
}

/// An A* search that can be driven one iteration at a time.
///
/// The engine borrows a [`NeighborStrategy`] and an [`ObstacleIndex`] and owns everything else:
/// the node tree, the open set and the closed set. All of it is reset by
/// [`begin`](SearchEngine::begin), so one engine can run many searches in a row.
///
/// ## Examples
/// ```
/// # use trace_autorouter::prelude::*;
/// let index = IndexKind::LinearScan.build(
///     vec![Obstacle::rect(Point::new(0.0, 0.0), 1.0, 1.0, [0])],
///     IndexConfig::default(),
/// );
/// let strategy = JumpNeighbors::new(JumpConfig::default());
/// let mut engine = SearchEngine::new(&strategy, &*index, SearchConfig::default());
///
/// let outcome = engine.solve(Point3::new(-3.0, 0.0, 0), Point3::new(3.0, 0.0, 0));
/// let path = outcome.path().unwrap();
///
/// assert_eq!(path[0], Point3::new(-3.0, 0.0, 0));
/// assert_eq!(path[path.len() - 1], Point3::new(3.0, 0.0, 0));
/// ```
#[derive(Debug)]
pub struct SearchEngine<'a, S: NeighborStrategy + ?Sized> {
    strategy: &'a S,
    index: &'a dyn ObstacleIndex,
    config: SearchConfig,
    debug: Option<&'a mut DebugContext>,
    label: String,

    nodes: NodeArena,
    heap: BinaryHeap<OpenEntry>,
    open: NodeLookup,
    closed: NodeLookup,
    candidates: Vec<Neighbor>,
    counter: u64,

    start: Point3,
    goal: Point3,
    state: SearchState,
    iterations: usize,
    deadline: Option<Instant>,
    solution: Option<Path<Point3>>,
    reason: ExhaustReason,
}

impl<'a, S: NeighborStrategy + ?Sized> SearchEngine<'a, S> {
    /// Creates a new SearchEngine.
    ///
    /// Call [`begin`](SearchEngine::begin) or [`solve`](SearchEngine::solve) to start a search.
    pub fn new(strategy: &'a S, index: &'a dyn ObstacleIndex, config: SearchConfig) -> Self {
        SearchEngine {
            strategy,
            index,
            config,
            debug: None,
            label: String::new(),
            nodes: NodeArena::new(),
            heap: BinaryHeap::new(),
            open: NodeLookup::new(config.grid_step),
            closed: NodeLookup::new(config.grid_step),
            candidates: Vec::new(),
            counter: 0,
            start: Point3::default(),
            goal: Point3::default(),
            state: SearchState::Exhausted,
            iterations: 0,
            deadline: None,
            solution: None,
            reason: ExhaustReason::EmptyOpenSet,
        }
    }

    /// Reports statistics (and snapshots, if enabled) to `debug`.
    ///
    /// `label` names the search in the snapshots.
    pub fn with_debug(mut self, debug: &'a mut DebugContext, label: impl Into<String>) -> Self {
        self.debug = Some(debug);
        self.label = label.into();
        self
    }

    /// The current state
    pub fn state(&self) -> SearchState {
        self.state
    }

    /// Number of nodes expanded since the last [`begin`](SearchEngine::begin)
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// The node tree of the current search
    pub fn nodes(&self) -> &NodeArena {
        &self.nodes
    }

    /// Resets the engine and places the start node in the open set.
    pub fn begin(&mut self, start: Point3, goal: Point3) {
        self.nodes.clear();
        self.heap.clear();
        self.open.clear();
        self.closed.clear();
        self.counter = 0;
        self.start = start;
        self.goal = goal;
        self.iterations = 0;
        self.solution = None;
        self.reason = ExhaustReason::EmptyOpenSet;
        self.deadline = self.config.time_limit.map(|limit| Instant::now() + limit);

        let ctx = SearchContext::new(self.index, start, goal, self.config.grid_step);
        let h = self.strategy.heuristic(&ctx, start);
        self.push(SearchNode {
            pos: start,
            g: 0.0,
            h,
            f: h * self.config.greedy_multiplier,
            parent: None,
            obstacle_hit: None,
            travel_margin_cost_factor: None,
            enter_margin_cost: None,
            status: NodeStatus::Open,
        });
        self.state = SearchState::Ready;
    }

    /// Runs a complete search from `start` to `goal`.
    pub fn solve(&mut self, start: Point3, goal: Point3) -> SearchOutcome {
        self.begin(start, goal);
        while !self.step().is_finished() {}
        self.outcome()
    }

    /// The result of the last search.
    ///
    /// A search that has not finished yet is reported as exhausted with the iterations so far.
    pub fn outcome(&self) -> SearchOutcome {
        match &self.solution {
            Some(path) if self.state == SearchState::Solved => SearchOutcome::Solved {
                path: path.clone(),
                iterations: self.iterations,
            },
            _ => SearchOutcome::Exhausted {
                iterations: self.iterations,
                reason: self.reason,
            },
        }
    }

    /// Performs a single iteration: pops the most promising node and either finishes or
    /// expands it.
    ///
    /// Calling this on a finished search does nothing.
    pub fn step(&mut self) -> SearchState {
        match self.state {
            SearchState::Solved | SearchState::Exhausted => return self.state,
            SearchState::Ready => self.state = SearchState::Expanding,
            SearchState::Expanding => {}
        }

        if self.iterations >= self.config.max_iterations {
            return self.exhaust(ExhaustReason::IterationLimit);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return self.exhaust(ExhaustReason::TimeLimit);
            }
        }

        let current = match self.pop() {
            Some(id) => id,
            None => return self.exhaust(ExhaustReason::EmptyOpenSet),
        };
        self.iterations += 1;

        let pos = self.nodes[current].pos;
        self.nodes[current].status = NodeStatus::Closed;
        self.open.remove(pos, current);
        self.closed.insert(pos, current);

        log_trace!(
            "[{}] iteration {}: {} f = {:.3} g = {:.3}, {} open",
            self.label,
            self.iterations,
            pos,
            self.nodes[current].f,
            self.nodes[current].g,
            self.heap.len()
        );
        if let Some(debug) = self.debug.as_deref_mut() {
            debug.stats.iterations += 1;
        }

        if pos.layer == self.goal.layer && manhattan_distance(pos, self.goal) <= 2.0 * self.config.grid_step + EPSILON {
            match self.closing_points(pos) {
                Some(closing) => {
                    self.solution = Some(self.build_path(current, &closing));
                    self.state = SearchState::Solved;
                    self.snapshot(pos);
                    return self.state;
                }
                None => log_trace!("[{}] {} is next to the goal, but walled off from it", self.label, pos),
            }
        }

        self.expand(current);
        self.snapshot(pos);
        self.state
    }

    fn expand(&mut self, current: NodeId) {
        let ctx = SearchContext::new(self.index, self.start, self.goal, self.config.grid_step);
        let mut candidates = std::mem::take(&mut self.candidates);
        candidates.clear();
        {
            let node = &self.nodes[current];
            let parent = node.parent.map(|id| &self.nodes[id]);
            self.strategy.neighbors(&ctx, node, parent, &mut candidates);
        }

        let mut replaced = 0;
        for neighbor in candidates.iter() {
            if self.closed.find_near(&self.nodes, neighbor.pos).is_some() {
                continue;
            }
            let g = self.strategy.compute_g(&self.nodes[current], neighbor);

            if let Some(existing) = self.open.find_near(&self.nodes, neighbor.pos) {
                if g >= self.nodes[existing].g {
                    continue;
                }
                let old = &mut self.nodes[existing];
                old.status = NodeStatus::Replaced;
                let old_pos = old.pos;
                self.open.remove(old_pos, existing);
                replaced += 1;
            }

            let h = self.strategy.heuristic(&ctx, neighbor.pos);
            self.push(SearchNode {
                pos: neighbor.pos,
                g,
                h,
                f: g + h * self.config.greedy_multiplier,
                parent: Some(current),
                obstacle_hit: neighbor.obstacle_hit,
                travel_margin_cost_factor: neighbor.travel_margin_cost_factor,
                enter_margin_cost: neighbor.enter_margin_cost,
                status: NodeStatus::Open,
            });
        }

        if ctx.rejected() > 0 {
            log_trace!("[{}] {} neighbors landed inside obstacles", self.label, ctx.rejected());
        }
        if let Some(debug) = self.debug.as_deref_mut() {
            debug.stats.nodes_replaced += replaced;
            debug.stats.neighbors_rejected += ctx.rejected();
            debug.stats.vias_considered += ctx.vias_considered();
        }
        self.candidates = candidates;
    }

    fn push(&mut self, node: SearchNode) {
        let (pos, f) = (node.pos, node.f);
        let id = self.nodes.insert(node);
        self.open.insert(pos, id);
        self.heap.push(OpenEntry {
            f,
            counter: self.counter,
            id,
        });
        self.counter += 1;
        if let Some(debug) = self.debug.as_deref_mut() {
            debug.stats.nodes_created += 1;
        }
    }

    /// Pops the cheapest node that is still open. Replaced nodes are skipped here instead of being
    /// removed from the heap.
    fn pop(&mut self) -> Option<NodeId> {
        while let Some(entry) = self.heap.pop() {
            if self.nodes[entry.id].status == NodeStatus::Open {
                return Some(entry.id);
            }
        }
        None
    }

    fn exhaust(&mut self, reason: ExhaustReason) -> SearchState {
        log_debug!(
            "[{}] giving up after {} iterations: {:?}",
            self.label,
            self.iterations,
            reason
        );
        self.reason = reason;
        self.state = SearchState::Exhausted;
        self.state
    }

    /// `true` if the straight segment from `a` to `b` does not enter an obstacle.
    fn segment_clear(&self, a: Point3, b: Point3) -> bool {
        match Dir::between(a, b) {
            Some(dir) => self.index.directional_collision(a, dir, 0.0).wall_distance >= manhattan_distance(a, b) - EPSILON,
            None => true,
        }
    }

    /// The points leading from `last` to the exact goal, or `None` if every way there runs
    /// through an obstacle.
    ///
    /// If `last` and the goal differ in both coordinates, one of the two elbows between them is
    /// taken, keeping every segment orthogonal.
    fn closing_points(&self, last: Point3) -> Option<Vec<Point3>> {
        let goal = self.goal;
        if last.same_as(&goal) {
            return Some(vec![]);
        }
        if (last.x - goal.x).abs() <= EPSILON || (last.y - goal.y).abs() <= EPSILON {
            return self.segment_clear(last, goal).then(|| vec![goal]);
        }
        [
            Point3::new(goal.x, last.y, last.layer),
            Point3::new(last.x, goal.y, last.layer),
        ]
        .into_iter()
        .find(|&corner| self.segment_clear(last, corner) && self.segment_clear(corner, goal))
        .map(|corner| vec![corner, goal])
    }

    /// The Path to `end`, followed by `closing`.
    fn build_path(&self, end: NodeId, closing: &[Point3]) -> Path<Point3> {
        let mut path = Path::new(self.nodes.path_to(end), self.nodes[end].g);
        let mut last = self.nodes[end].pos;
        for &p in closing {
            path.append(p, manhattan_distance(last, p));
            last = p;
        }
        path
    }

    fn snapshot(&mut self, expanded: Point3) {
        let debug = match self.debug.as_deref_mut() {
            Some(debug) if debug.record_snapshots => debug,
            _ => return,
        };
        let open: Vec<(Point3, Cost)> = self
            .heap
            .iter()
            .filter(|entry| self.nodes[entry.id].status == NodeStatus::Open)
            .map(|entry| (self.nodes[entry.id].pos, entry.f))
            .collect();
        debug.snapshots.push(IterationSnapshot {
            connection: self.label.clone(),
            iteration: self.iterations,
            expanded,
            open,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::neighbors::{GridNeighbors, JumpConfig, JumpNeighbors};
    use crate::obstacle::Obstacle;
    use crate::obstacle_index::{IndexConfig, IndexKind};

    fn single_block() -> Box<dyn ObstacleIndex> {
        IndexKind::LinearScan.build(
            vec![Obstacle::rect(Point::new(0.0, 0.0), 1.0, 1.0, [0])],
            IndexConfig::default(),
        )
    }

    #[test]
    fn stepping() {
        let index = single_block();
        let strategy = JumpNeighbors::new(JumpConfig::default());
        let mut engine = SearchEngine::new(&strategy, &*index, SearchConfig::default());

        engine.begin(Point3::new(-3.0, 0.0, 0), Point3::new(3.0, 0.0, 0));
        assert_eq!(engine.state(), SearchState::Ready);
        assert_eq!(engine.step(), SearchState::Expanding);
        assert_eq!(engine.iterations(), 1);

        while !engine.step().is_finished() {}
        assert_eq!(engine.state(), SearchState::Solved);
        let iterations = engine.iterations();
        assert_eq!(engine.step(), SearchState::Solved);
        assert_eq!(engine.iterations(), iterations);
    }

    #[test]
    fn start_is_goal() {
        let index = single_block();
        let strategy = GridNeighbors::new();
        let mut engine = SearchEngine::new(&strategy, &*index, SearchConfig::default());

        let p = Point3::new(-3.0, 0.0, 0);
        let outcome = engine.solve(p, p);
        assert_eq!(
            outcome,
            SearchOutcome::Solved {
                path: Path::new(vec![p], 0.0),
                iterations: 1
            }
        );
    }

    #[test]
    fn iteration_limit() {
        let index = single_block();
        let strategy = GridNeighbors::new();
        let config = SearchConfig {
            max_iterations: 5,
            ..Default::default()
        };
        let mut engine = SearchEngine::new(&strategy, &*index, config);

        let outcome = engine.solve(Point3::new(-3.0, 0.0, 0), Point3::new(3.0, 0.0, 0));
        assert_eq!(
            outcome,
            SearchOutcome::Exhausted {
                iterations: 5,
                reason: ExhaustReason::IterationLimit
            }
        );
    }

    #[test]
    fn enclosed_goal() {
        // four walls around the goal
        let index = IndexKind::LinearScan.build(
            vec![
                Obstacle::rect(Point::new(0.0, 2.0), 5.0, 1.0, [0]),
                Obstacle::rect(Point::new(0.0, -2.0), 5.0, 1.0, [0]),
                Obstacle::rect(Point::new(2.0, 0.0), 1.0, 5.0, [0]),
                Obstacle::rect(Point::new(-2.0, 0.0), 1.0, 5.0, [0]),
            ],
            IndexConfig::default(),
        );
        let strategy = JumpNeighbors::new(JumpConfig::default());
        let mut engine = SearchEngine::new(&strategy, &*index, SearchConfig::default());

        let outcome = engine.solve(Point3::new(-6.0, 0.0, 0), Point3::new(0.0, 0.0, 0));
        assert!(matches!(
            outcome,
            SearchOutcome::Exhausted {
                reason: ExhaustReason::EmptyOpenSet | ExhaustReason::IterationLimit,
                ..
            }
        ));
    }

    #[test]
    fn elbow_to_goal() {
        let index = IndexKind::LinearScan.build(vec![], IndexConfig::default());
        let strategy = GridNeighbors::new();
        let config = SearchConfig {
            grid_step: 1.0,
            greedy_multiplier: 1.0,
            ..Default::default()
        };
        let mut engine = SearchEngine::new(&strategy, &*index, config);

        let goal = Point3::new(0.5, 0.7, 0);
        let outcome = engine.solve(Point3::new(0.0, 0.0, 0), goal);
        let path = outcome.path().unwrap();
        assert_eq!(path.path, vec![Point3::new(0.0, 0.0, 0), Point3::new(0.5, 0.0, 0), goal]);
        assert!((path.cost - 1.2).abs() < 1e-9);
    }

    #[test]
    fn elbow_avoids_obstacles() {
        // the start is close enough to the goal, but a thin wall sits between them
        let index = IndexKind::LinearScan.build(
            vec![Obstacle::rect(Point::new(0.75, 0.0), 0.2, 0.4, [0])],
            IndexConfig::default(),
        );
        let strategy = GridNeighbors::new();
        let config = SearchConfig {
            grid_step: 1.0,
            greedy_multiplier: 1.0,
            ..Default::default()
        };
        let mut engine = SearchEngine::new(&strategy, &*index, config);

        let goal = Point3::new(1.5, 0.0, 0);
        let outcome = engine.solve(Point3::new(0.0, 0.0, 0), goal);
        let path = outcome.path().unwrap();
        assert!(path.len() > 2, "{}", path);
        assert_eq!(path[path.len() - 1], goal);
        for w in path.path.windows(2) {
            let dir = Dir::between(w[0], w[1]).unwrap();
            let wall = index.directional_collision(w[0], dir, 0.0).wall_distance;
            assert!(wall >= manhattan_distance(w[0], w[1]) - 1e-9, "{} -> {}", w[0], w[1]);
        }
    }

    #[test]
    fn debug_counters() {
        let index = single_block();
        let strategy = JumpNeighbors::new(JumpConfig::default());
        let mut debug = DebugContext::with_snapshots();
        let iterations = {
            let mut engine =
                SearchEngine::new(&strategy, &*index, SearchConfig::default()).with_debug(&mut debug, "A");
            engine
                .solve(Point3::new(-3.0, 0.0, 0), Point3::new(3.0, 0.0, 0))
                .iterations()
        };
        assert_eq!(debug.stats.iterations, iterations);
        assert_eq!(debug.snapshots.len(), iterations);
        assert!(debug.stats.nodes_created > iterations);
        assert_eq!(debug.snapshots[0].connection, "A");
        assert_eq!(debug.snapshots[0].expanded, Point3::new(-3.0, 0.0, 0));
    }
}

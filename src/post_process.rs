//! Transforms applied to a solved route.
//!
//! None of these can fail: the worst they do is return the route unchanged. They only know about
//! geometry, anything to do with obstacles is supplied by the caller as a predicate (see
//! [`segment_blocked`] for the one the router uses).

use crate::geometry::{manhattan_distance, orientation, orthogonal_intersection, Dir, Orientation, Point3, EPSILON};
use crate::obstacle_index::ObstacleIndex;

fn push_unique(result: &mut Vec<Point3>, p: Point3) {
    if !result.last().map_or(false, |last| last.same_as(&p)) {
        result.push(p);
    }
}

/// Removes every part of the route that loops back and crosses itself.
///
/// Every new segment is checked against the earlier, non-adjacent segments since the last layer
/// change. Only a horizontal and a vertical segment can cross; parallel segments and layer changes
/// are never checked, and a loop is never cut across a via. When a crossing is found, everything after the crossed segment is cut and the
/// route continues from the crossing point.
///
/// Consecutive duplicate points are dropped. The result never has more points than `path`.
///
/// ## Examples
/// ```
/// # use trace_autorouter::post_process::remove_path_loops;
/// # use trace_autorouter::geometry::Point3;
/// let p = |x, y| Point3::new(x, y, 0);
/// let path = vec![p(0.0, 0.0), p(4.0, 0.0), p(4.0, 2.0), p(2.0, 2.0), p(2.0, -2.0), p(6.0, -2.0)];
///
/// assert_eq!(
///     remove_path_loops(&path),
///     vec![p(0.0, 0.0), p(2.0, 0.0), p(2.0, -2.0), p(6.0, -2.0)]
/// );
/// ```
pub fn remove_path_loops(path: &[Point3]) -> Vec<Point3> {
    let mut result: Vec<Point3> = Vec::with_capacity(path.len());
    for &p in path {
        let last = match result.last() {
            Some(&last) => last,
            None => {
                result.push(p);
                continue;
            }
        };
        if last.same_as(&p) {
            continue;
        }
        if last.layer != p.layer {
            result.push(p);
            continue;
        }

        let edge = (last.planar(), p.planar());
        // the segment ending in `last` shares a point with `edge` and is skipped
        let checked = result.len().saturating_sub(2);
        // segments before the most recent via belong to a different stretch of this layer
        let first = result
            .windows(2)
            .rposition(|w| w[0].layer != w[1].layer)
            .map_or(0, |i| i + 1);
        let crossing = (first..checked).find_map(|i| {
            let (a, b) = (result[i], result[i + 1]);
            if a.layer != p.layer || b.layer != p.layer {
                return None;
            }
            orthogonal_intersection((a.planar(), b.planar()), edge).map(|x| (i, x.on_layer(p.layer)))
        });

        match crossing {
            Some((i, x)) => {
                result.truncate(i + 1);
                push_unique(&mut result, x);
                push_unique(&mut result, p);
            }
            None => result.push(p),
        }
    }
    result
}

/// `true` if the intervals `[a0, a1]` and `[b0, b1]` share more than a single point
fn spans_overlap(a0: f64, a1: f64, b0: f64, b1: f64) -> bool {
    let (a_min, a_max) = (a0.min(a1), a0.max(a1));
    let (b_min, b_max) = (b0.min(b1), b0.max(b1));
    a_min < b_max - EPSILON && b_min < a_max - EPSILON
}

/// Replaces detours with a direct corner wherever `obstacle_between` allows it.
///
/// For every segment, the route is searched ahead for a later segment on the same layer that runs
/// parallel to it with overlapping extent. Such a pair is the two sides of a detour. The route from
/// the start `A` of the first segment to the end `B` of the second one can be replaced by an L
/// through one of the corners `(A.x, B.y)` or `(B.x, A.y)`, which is never longer. The first
/// corner for which `obstacle_between` is `false` for both new segments is taken.
///
/// The first and last point of `path` are always kept.
///
/// ## Arguments
/// - `path` - an orthogonal route
/// - `obstacle_between` - `true` if the straight segment between two points is blocked
///
/// ## Examples
/// ```
/// # use trace_autorouter::post_process::shorten_path_with_shortcuts;
/// # use trace_autorouter::geometry::Point3;
/// let p = |x, y| Point3::new(x, y, 0);
/// // up, right, down: a detour around nothing
/// let path = vec![p(0.0, 0.0), p(0.0, 2.0), p(5.0, 2.0), p(5.0, 0.0), p(7.0, 0.0)];
///
/// let shortened = shorten_path_with_shortcuts(&path, |_, _| false);
/// assert_eq!(shortened, vec![p(0.0, 0.0), p(5.0, 0.0), p(7.0, 0.0)]);
///
/// let blocked = shorten_path_with_shortcuts(&path, |_, _| true);
/// assert_eq!(blocked, path);
/// ```
pub fn shorten_path_with_shortcuts(path: &[Point3], mut obstacle_between: impl FnMut(Point3, Point3) -> bool) -> Vec<Point3> {
    let mut result = Vec::with_capacity(path.len());
    let mut i = 0;
    while i < path.len() {
        push_unique(&mut result, path[i]);
        if i + 2 >= path.len() {
            i += 1;
            continue;
        }
        let a = path[i];
        let first = orientation(a.planar(), path[i + 1].planar());
        if first == Orientation::Other || path[i + 1].layer != a.layer {
            i += 1;
            continue;
        }

        let mut shortcut = None;
        for j in (i + 2)..(path.len() - 1) {
            let (c, d) = (path[j], path[j + 1]);
            if c.layer != a.layer || d.layer != a.layer {
                break;
            }
            if orientation(c.planar(), d.planar()) != first {
                continue;
            }
            let b = path[i + 1];
            let overlapping = match first {
                Orientation::Horizontal => spans_overlap(a.x, b.x, c.x, d.x),
                Orientation::Vertical => spans_overlap(a.y, b.y, c.y, d.y),
                Orientation::Other => false,
            };
            if !overlapping {
                continue;
            }

            let corners = [Point3::new(a.x, d.y, a.layer), Point3::new(d.x, a.y, a.layer)];
            shortcut = corners
                .iter()
                .copied()
                .find(|&corner| !obstacle_between(a, corner) && !obstacle_between(corner, d))
                .map(|corner| (j + 1, corner));
            if shortcut.is_some() {
                break;
            }
        }

        match shortcut {
            Some((next, corner)) => {
                if !corner.same_as(&path[next]) {
                    push_unique(&mut result, corner);
                }
                i = next;
            }
            None => i += 1,
        }
    }
    result
}

/// Drops interior points that lie on a straight run between their neighbors.
///
/// Only runs on a single layer are merged. A run that doubles back on itself is merged as well,
/// keeping its far end.
///
/// ## Examples
/// ```
/// # use trace_autorouter::post_process::remove_collinear_points;
/// # use trace_autorouter::geometry::Point3;
/// let path = vec![
///     Point3::new(0.0, 0.0, 0),
///     Point3::new(1.0, 0.0, 0),
///     Point3::new(3.0, 0.0, 0),
///     Point3::new(3.0, 0.0, 1),
///     Point3::new(3.0, 2.0, 1),
/// ];
/// assert_eq!(
///     remove_collinear_points(&path),
///     vec![path[0], path[2], path[3], path[4]]
/// );
/// ```
pub fn remove_collinear_points(path: &[Point3]) -> Vec<Point3> {
    let mut result: Vec<Point3> = Vec::with_capacity(path.len());
    for &p in path {
        let n = result.len();
        if n >= 2 {
            let (a, b) = (result[n - 2], result[n - 1]);
            let same_layer = a.layer == b.layer && b.layer == p.layer;
            let same_x = (a.x - b.x).abs() <= EPSILON && (b.x - p.x).abs() <= EPSILON;
            let same_y = (a.y - b.y).abs() <= EPSILON && (b.y - p.y).abs() <= EPSILON;
            if same_layer && (same_x || same_y) {
                result.pop();
            }
        }
        push_unique(&mut result, p);
    }
    result
}

/// `true` if a trace from `a` to `b` would come closer than `margin` to an obstacle in `index`.
///
/// Layer changes and diagonal segments are always reported as blocked, since they cannot be
/// checked with a single ray.
pub fn segment_blocked(index: &dyn ObstacleIndex, margin: f64, a: Point3, b: Point3) -> bool {
    if a.layer != b.layer {
        return true;
    }
    let dir = match Dir::between(a, b) {
        Some(dir) => dir,
        None => return false,
    };
    if orientation(a.planar(), b.planar()) == Orientation::Other {
        return true;
    }
    let length = manhattan_distance(a, b);
    index.directional_collision(a, dir, margin).wall_distance < length + margin
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::obstacle::Obstacle;
    use crate::obstacle_index::{IndexConfig, IndexKind};
    use nanorand::{Rng, WyRand};

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0)
    }

    fn length(path: &[Point3]) -> f64 {
        path.windows(2).map(|w| manhattan_distance(w[0], w[1])).sum()
    }

    fn random_path(rng: &mut WyRand) -> Vec<Point3> {
        let len = rng.generate_range(1_usize..30);
        let mut pos = p(rng.generate_range(0_u32..10) as f64, rng.generate_range(0_u32..10) as f64);
        let mut path = vec![pos];
        for i in 0..len {
            let value = rng.generate_range(0_u32..10) as f64;
            pos = if i % 2 == 0 { p(value, pos.y) } else { p(pos.x, value) };
            path.push(pos);
        }
        path
    }

    #[test]
    fn loop_removal_layer_boundary() {
        let path = vec![
            p(0.0, 0.0),
            p(5.0, 0.0),
            p(5.0, 3.0),
            p(5.0, 3.0),
            p(3.0, 3.0),
            Point3::new(3.0, 3.0, 1),
            Point3::new(3.0, -3.0, 1),
        ];
        assert_eq!(
            remove_path_loops(&path),
            vec![
                p(0.0, 0.0),
                p(5.0, 0.0),
                p(5.0, 3.0),
                p(3.0, 3.0),
                Point3::new(3.0, 3.0, 1),
                Point3::new(3.0, -3.0, 1),
            ]
        );
    }

    #[test]
    fn loop_removal_keeps_vias() {
        // down to layer 1 and back, then across the first segment on layer 0
        let path = vec![
            p(0.0, 0.0),
            p(5.0, 0.0),
            p(5.0, 3.0),
            Point3::new(5.0, 3.0, 1),
            Point3::new(3.0, 3.0, 1),
            p(3.0, 3.0),
            p(3.0, -3.0),
        ];
        let result = remove_path_loops(&path);
        assert_eq!(result, path);
        let vias = result.windows(2).filter(|w| w[0].layer != w[1].layer).count();
        assert_eq!(vias, 2);
    }

    #[test]
    fn loop_removal_backtrack() {
        let path = vec![p(0.0, 0.0), p(5.0, 0.0), p(5.0, 3.0), p(5.0, -1.0)];
        assert_eq!(remove_path_loops(&path), vec![p(0.0, 0.0), p(5.0, 0.0), p(5.0, -1.0)]);
    }

    #[test]
    fn loop_removal_properties() {
        let mut rng = WyRand::new_seed(17);
        for _ in 0..500 {
            let path = random_path(&mut rng);
            let once = remove_path_loops(&path);
            let twice = remove_path_loops(&once);

            assert_eq!(once, twice, "not idempotent for {:?}", path);
            assert!(once.len() <= path.len());
            assert!(length(&once) <= length(&path) + 1e-9);
            assert_eq!(once[0], path[0]);
            assert_eq!(once[once.len() - 1], path[path.len() - 1]);
        }
    }

    #[test]
    fn shortcut_keeps_endpoints() {
        let mut rng = WyRand::new_seed(3);
        for _ in 0..500 {
            let path = random_path(&mut rng);
            let short = shorten_path_with_shortcuts(&path, |_, _| false);

            assert_eq!(short[0], path[0]);
            assert_eq!(short[short.len() - 1], path[path.len() - 1]);
            assert!(length(&short) <= length(&path) + 1e-9);
        }
    }

    #[test]
    fn shortcut_respects_obstacles() {
        let index = IndexKind::LinearScan.build(
            vec![Obstacle::rect(Point::new(2.5, 0.0), 1.0, 1.0, [0])],
            IndexConfig::default(),
        );
        let path = vec![p(0.0, 0.0), p(0.0, 2.0), p(5.0, 2.0), p(5.0, 0.0), p(7.0, 0.0)];
        let short = shorten_path_with_shortcuts(&path, |a, b| segment_blocked(&*index, 0.15, a, b));
        assert_eq!(short, path);

        // a detour that passes well above the obstacle
        let path = vec![p(0.0, 2.0), p(0.0, 3.0), p(5.0, 3.0), p(5.0, 2.0), p(7.0, 2.0)];
        let short = shorten_path_with_shortcuts(&path, |a, b| segment_blocked(&*index, 0.15, a, b));
        assert_eq!(short, vec![p(0.0, 2.0), p(5.0, 2.0), p(7.0, 2.0)]);
    }

    #[test]
    fn shortcut_stays_on_layer() {
        let path = vec![
            p(0.0, 0.0),
            p(0.0, 2.0),
            Point3::new(0.0, 2.0, 1),
            Point3::new(5.0, 2.0, 1),
            Point3::new(5.0, 0.0, 1),
        ];
        assert_eq!(shorten_path_with_shortcuts(&path, |_, _| false), path);
    }

    #[test]
    fn collinear() {
        let path = vec![p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0), p(2.0, 1.0), p(2.0, 1.0), p(2.0, 5.0)];
        assert_eq!(remove_collinear_points(&path), vec![p(0.0, 0.0), p(2.0, 0.0), p(2.0, 5.0)]);
    }

    #[test]
    fn blocked_segments() {
        let index = IndexKind::LinearScan.build(
            vec![Obstacle::rect(Point::new(0.0, 0.0), 1.0, 1.0, [0])],
            IndexConfig::default(),
        );
        assert!(segment_blocked(&*index, 0.15, p(-3.0, 0.0), p(3.0, 0.0)));
        assert!(segment_blocked(&*index, 0.15, p(-3.0, 0.0), p(-0.6, 0.0)));
        assert!(!segment_blocked(&*index, 0.15, p(-3.0, 0.0), p(-0.65, 0.0)));
        assert!(!segment_blocked(&*index, 0.15, p(-3.0, 0.65), p(3.0, 0.65)));
        assert!(segment_blocked(&*index, 0.15, p(-3.0, 0.0), Point3::new(-3.0, 0.0, 1)));
    }
}

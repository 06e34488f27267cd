use super::Route;
use crate::geometry::Point;
use crate::obstacle::Obstacle;

/// Turns a routed trace into obstacles for the connections routed after it.
///
/// Every segment becomes a rectangle `thickness` wide that also covers half the thickness beyond
/// both ends, every via a square of side `via_diameter` on both of its layers. All of them belong
/// to `net`, so later traces of the same network may touch them.
pub(crate) fn route_obstacles(route: &Route, net: &str, thickness: f64, via_diameter: f64) -> Vec<Obstacle> {
    let segments = route.segments().filter(|(a, b)| !a.same_as(b)).map(|(a, b)| {
        let center = Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
        Obstacle::rect(
            center,
            (a.x - b.x).abs() + thickness,
            (a.y - b.y).abs() + thickness,
            [a.layer],
        )
        .connected_to(net)
    });
    let vias = route.vias().into_iter().map(|via| {
        Obstacle::rect(via.position, via_diameter, via_diameter, [via.from, via.to]).connected_to(net)
    });
    segments.chain(vias).collect()
}

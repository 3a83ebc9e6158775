//! Turns raw search results into wires: via annotation, collinear point
//! removal and the length/bend statistics the batch router aggregates.

use crate::utils::conversion::GridConverter;
use icroute_common::db::route::{Path, RoutePoint, Via};
use icroute_common::geom::coord::GridKey;

/// Converts lattice keys into a world-space path. A single key becomes a two-point path.
pub fn path_from_keys(net_id: &str, keys: &[GridKey], converter: &GridConverter, width: f64) -> Path {
    let mut points: Vec<RoutePoint> = keys.iter().map(|&k| converter.to_world(k)).collect();
    if points.len() == 1 {
        points.push(points[0].clone());
    }
    Path::new(net_id, points, width)
}

/// Connects off-lattice pins to the snapped ends of a path with short stubs.
pub fn attach_pin_stubs(mut path: Path, source: &RoutePoint, target: &RoutePoint) -> Path {
    if path.points.first().is_some_and(|p| !p.same_position(source)) {
        path.points.insert(0, RoutePoint::new(source.x, source.y, path.points[0].layer.clone()));
    }
    if let Some(last) = path.points.last() {
        if !last.same_position(target) {
            let stub = RoutePoint::new(target.x, target.y, last.layer.clone());
            path.points.push(stub);
        }
    }
    path
}

/// Keys to a wire with vias annotated. `pins` carries the exact pin
/// positions when they should be joined with stubs instead of snapped.
pub fn build_path(
    net_id: &str,
    keys: &[GridKey],
    converter: &GridConverter,
    width: f64,
    pins: Option<(&RoutePoint, &RoutePoint)>,
    via_diameter: f64,
) -> Path {
    let mut path = path_from_keys(net_id, keys, converter, width);
    if let Some((source, target)) = pins {
        path = attach_pin_stubs(path, source, target);
    }
    insert_vias(path, via_diameter)
}

/// Records a via at every layer change, positioned at the point before the change.
pub fn insert_vias(mut path: Path, diameter: f64) -> Path {
    path.vias = path
        .points
        .windows(2)
        .filter(|w| w[0].layer != w[1].layer)
        .map(|w| Via {
            position: w[0].position(),
            from_layer: w[0].layer.clone(),
            to_layer: w[1].layer.clone(),
            diameter,
        })
        .collect();
    path
}

/// Drops interior points lying on a straight same-layer run with both neighbours.
/// Endpoints and via points are always kept.
pub fn optimize_path(path: &Path) -> Path {
    if path.points.len() <= 2 {
        return path.clone();
    }

    let mut points: Vec<RoutePoint> = Vec::with_capacity(path.points.len());
    points.push(path.points[0].clone());
    for i in 1..path.points.len() - 1 {
        let prev = points.last().unwrap_or(&path.points[i - 1]);
        let curr = &path.points[i];
        let next = &path.points[i + 1];
        if is_redundant(prev, curr, next) {
            continue;
        }
        points.push(curr.clone());
    }
    points.push(path.points[path.points.len() - 1].clone());

    Path {
        points,
        ..path.clone()
    }
}

fn is_redundant(prev: &RoutePoint, curr: &RoutePoint, next: &RoutePoint) -> bool {
    if prev.layer != curr.layer || curr.layer != next.layer {
        return false;
    }
    let cross = (curr.x - prev.x) * (next.y - curr.y) - (curr.y - prev.y) * (next.x - curr.x);
    let dot = (curr.x - prev.x) * (next.x - curr.x) + (curr.y - prev.y) * (next.y - curr.y);
    // Collinear and not doubling back.
    cross.abs() < 1e-9 && dot >= 0.0
}

pub fn calculate_path_length(points: &[RoutePoint]) -> f64 {
    points
        .windows(2)
        .map(|w| w[0].position().distance(&w[1].position()))
        .sum()
}

/// Counts axis changes between consecutive planar moves. Via moves are skipped,
/// so a horizontal run, a via, then a vertical run is one bend.
pub fn count_bends(points: &[RoutePoint]) -> usize {
    let mut bends = 0;
    let mut last_axis: Option<bool> = None;
    for w in points.windows(2) {
        let dx = w[1].x - w[0].x;
        let dy = w[1].y - w[0].y;
        let horizontal = match (dx != 0.0, dy != 0.0) {
            (true, false) => true,
            (false, true) => false,
            // Vias carry no direction; diagonal pin stubs are not bends either.
            (false, false) => continue,
            (true, true) => {
                last_axis = None;
                continue;
            }
        };
        if last_axis.is_some_and(|h| h != horizontal) {
            bends += 1;
        }
        last_axis = Some(horizontal);
    }
    bends
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f64, y: f64, layer: &str) -> RoutePoint {
        RoutePoint::new(x, y, layer)
    }

    #[test]
    fn one_via_at_the_last_point_before_the_switch() {
        let path = Path::new(
            "n1",
            vec![
                pt(0.0, 0.0, "m1"),
                pt(20.0, 0.0, "m1"),
                pt(20.0, 0.0, "m2"),
                pt(20.0, 20.0, "m2"),
            ],
            2.0,
        );
        let path = insert_vias(path, 4.0);
        assert_eq!(path.vias.len(), 1);
        let via = &path.vias[0];
        assert_eq!((via.position.x, via.position.y), (20.0, 0.0));
        assert_eq!((via.from_layer.as_str(), via.to_layer.as_str()), ("m1", "m2"));
        assert_eq!(via.diameter, 4.0);
    }

    #[test]
    fn optimize_keeps_corners_endpoints_and_vias() {
        let path = insert_vias(
            Path::new(
                "n1",
                vec![
                    pt(0.0, 0.0, "m1"),
                    pt(20.0, 0.0, "m1"),
                    pt(40.0, 0.0, "m1"),
                    pt(40.0, 0.0, "m2"),
                    pt(60.0, 0.0, "m2"),
                    pt(80.0, 0.0, "m2"),
                    pt(80.0, 20.0, "m2"),
                    pt(80.0, 40.0, "m2"),
                ],
                2.0,
            ),
            4.0,
        );
        let optimized = optimize_path(&path);
        assert_eq!(
            optimized.points,
            vec![
                pt(0.0, 0.0, "m1"),
                pt(40.0, 0.0, "m1"),
                pt(40.0, 0.0, "m2"),
                pt(80.0, 0.0, "m2"),
                pt(80.0, 40.0, "m2"),
            ]
        );
        assert_eq!(optimized.vias, path.vias);
        assert_eq!(calculate_path_length(&optimized.points), calculate_path_length(&path.points));
        assert_eq!(count_bends(&optimized.points), count_bends(&path.points));
    }

    #[test]
    fn length_ignores_vias() {
        let points = vec![pt(0.0, 0.0, "m1"), pt(0.0, 0.0, "m2"), pt(30.0, 40.0, "m2")];
        assert_eq!(calculate_path_length(&points), 50.0);
    }

    #[test]
    fn bends_count_axis_changes_only() {
        let staircase = vec![
            pt(0.0, 0.0, "m1"),
            pt(20.0, 0.0, "m1"),
            pt(20.0, 20.0, "m1"),
            pt(40.0, 20.0, "m1"),
            pt(60.0, 20.0, "m1"),
        ];
        assert_eq!(count_bends(&staircase), 2);

        let through_via = vec![
            pt(0.0, 0.0, "m1"),
            pt(20.0, 0.0, "m1"),
            pt(20.0, 0.0, "m2"),
            pt(20.0, 20.0, "m2"),
        ];
        assert_eq!(count_bends(&through_via), 1);

        let straight = vec![pt(0.0, 0.0, "m1"), pt(20.0, 0.0, "m1"), pt(40.0, 0.0, "m1")];
        assert_eq!(count_bends(&straight), 0);
    }

    #[test]
    fn stubs_reach_off_grid_pins() {
        let path = Path::new("n1", vec![pt(0.0, 0.0, "m1"), pt(20.0, 0.0, "m1")], 1.0);
        let stubbed = attach_pin_stubs(path.clone(), &pt(3.0, 2.0, "m1"), &pt(20.0, 0.0, "m1"));
        assert_eq!(stubbed.points.len(), 3);
        assert_eq!(stubbed.points[0], pt(3.0, 2.0, "m1"));
        assert_eq!(count_bends(&stubbed.points), 0);
        assert_eq!(attach_pin_stubs(path.clone(), &pt(0.0, 0.0, "m1"), &pt(20.0, 0.0, "m1")), path);
    }

    #[test]
    fn single_key_becomes_two_point_path() {
        let converter = GridConverter::new(20.0, vec!["m1".into()]);
        let path = path_from_keys("n1", &[GridKey::new(2, 3, 0)], &converter, 1.0);
        assert!(path.is_valid());
        assert_eq!(path.points[0], path.points[1]);
        assert_eq!(path.layer, "m1");
    }
}

use crate::db::core::{Cell, Layout};
use crate::db::obstacle::Obstacle;
use crate::db::route::{Path, RoutePoint, RouteResult};
use crate::util::config::RoutingConfig;
use rayon::prelude::*;
use std::collections::HashSet;

const CHECK_TOLERANCE: f64 = 1e-6;
/// Samples per grid pitch when walking a segment for obstacle hits.
const SAMPLES_PER_PITCH: f64 = 4.0;

/// Post-route verification of a batch result against the layout it was routed from.
pub fn verify_routes(
    layout: &Layout,
    result: &RouteResult,
    config: &RoutingConfig,
) -> Result<(), String> {
    log::info!("Starting Route Verification...");

    let mut msgs: Vec<String> = result
        .routes
        .par_iter()
        .flat_map_iter(|path| check_path(layout, path, config))
        .collect();

    let routed: HashSet<&str> = result.routes.iter().map(|p| p.net_id.as_str()).collect();
    for net in &layout.nets {
        let reported = result.errors.iter().any(|e| e.starts_with(&format!("net {}:", net.id)));
        if !routed.contains(net.id.as_str()) && !reported {
            msgs.push(format!("net {}: neither routed nor reported as failed", net.id));
        }
    }

    if msgs.is_empty() {
        log::info!(
            "\x1b[32mPASS\x1b[0m: {} routes verified ({} nets failed to route).",
            result.routes.len(),
            result.errors.len()
        );
        Ok(())
    } else {
        for m in &msgs {
            log::error!("\x1b[31mFAIL\x1b[0m: {}", m);
        }
        Err(format!("{} verification errors; first: {}", msgs.len(), msgs[0]))
    }
}

fn check_path(layout: &Layout, path: &Path, config: &RoutingConfig) -> Vec<String> {
    let mut msgs = Vec::new();
    let id = &path.net_id;

    if !path.is_valid() {
        msgs.push(format!("net {}: path has {} points", id, path.points.len()));
        return msgs;
    }

    let last_pair = path.points.len() - 2;
    let mut layer_changes = 0;
    for (i, pair) in path.points.windows(2).enumerate() {
        let (a, b) = (&pair[0], &pair[1]);
        if a.layer != b.layer {
            layer_changes += 1;
            if !a.same_position(b) {
                msgs.push(format!(
                    "net {}: layer change {} -> {} moves from ({}, {}) to ({}, {})",
                    id, a.layer, b.layer, a.x, a.y, b.x, b.y
                ));
            }
            continue;
        }
        let axis_aligned =
            (a.x - b.x).abs() < CHECK_TOLERANCE || (a.y - b.y).abs() < CHECK_TOLERANCE;
        let is_pin_stub = !config.grid_snap && (i == 0 || i == last_pair);
        if !axis_aligned && !is_pin_stub {
            msgs.push(format!(
                "net {}: diagonal segment ({}, {}) -> ({}, {}) on {}",
                id, a.x, a.y, b.x, b.y, a.layer
            ));
        }
    }

    if layer_changes != path.vias.len() {
        msgs.push(format!(
            "net {}: {} layer changes but {} vias",
            id,
            layer_changes,
            path.vias.len()
        ));
    }

    if let Some(net) = layout.nets.iter().find(|n| n.id == *id) {
        let ends = [(&net.source, &path.points[0]), (&net.target, &path.points[path.points.len() - 1])];
        for (pin, point) in ends {
            let Some(pos) = layout.resolve_pin(pin) else {
                msgs.push(format!("net {}: pin {}/{} does not exist", id, pin.cell, pin.pin));
                continue;
            };
            let snap = if config.grid_snap { config.grid_size / 2.0 } else { 0.0 };
            let reach = snap + CHECK_TOLERANCE;
            if (pos.x - point.x).abs() > reach || (pos.y - point.y).abs() > reach {
                msgs.push(format!(
                    "net {}: route ends at ({}, {}) but pin {}/{} is at ({}, {})",
                    id, point.x, point.y, pin.cell, pin.pin, pos.x, pos.y
                ));
            }
        }
    }

    let obstacles = foreign_obstacles(layout, path, config);
    let start = &path.points[0];
    let end = &path.points[path.points.len() - 1];
    for pair in path.points.windows(2) {
        for p in sample_segment(&pair[0], &pair[1], config.grid_size / SAMPLES_PER_PITCH) {
            if (p.same_position(start) && p.layer == start.layer)
                || (p.same_position(end) && p.layer == end.layer)
            {
                continue;
            }
            if let Some(o) = obstacles.iter().find(|o| o.contains(&p)) {
                msgs.push(format!(
                    "net {}: point ({}, {}) on {} lies inside {:?} obstacle",
                    id, p.x, p.y, p.layer, o.kind
                ));
                break;
            }
        }
    }

    msgs
}

/// Cells other than the net's own endpoints, plus blockages.
fn foreign_obstacles(layout: &Layout, path: &Path, config: &RoutingConfig) -> Vec<Obstacle> {
    let own: Vec<&str> = layout
        .nets
        .iter()
        .find(|n| n.id == path.net_id)
        .map(|n| vec![n.source.cell.as_str(), n.target.cell.as_str()])
        .unwrap_or_default();
    let first = config.first_layer().unwrap_or_default();
    layout
        .cells
        .iter()
        .filter(|c| !own.contains(&c.id.as_str()))
        .map(|c: &Cell| {
            Obstacle::new(
                c.bounding_box(),
                first,
                crate::db::obstacle::ObstacleKind::Cell,
            )
        })
        .chain(layout.blockages.iter().cloned())
        .collect()
}

/// Points every `step` along a same-layer segment, both ends included.
fn sample_segment(a: &RoutePoint, b: &RoutePoint, step: f64) -> Vec<RoutePoint> {
    if a.layer != b.layer {
        return vec![a.clone(), b.clone()];
    }
    let len = a.position().distance(&b.position());
    let n = (len / step).ceil().max(1.0) as usize;
    (0..=n)
        .map(|i| {
            let t = i as f64 / n as f64;
            RoutePoint::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t, a.layer.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::core::{Net, Pin, PinRef};
    use crate::db::route::Via;
    use crate::geom::point::Point;
    use crate::geom::rect::Rect;

    fn cell(id: &str, x: f64, y: f64) -> Cell {
        Cell {
            id: id.into(),
            name: String::new(),
            x,
            y,
            width: 10.0,
            height: 10.0,
            pins: vec![Pin {
                name: "p".into(),
                x: 0.0,
                y: 0.0,
            }],
        }
    }

    fn layout() -> Layout {
        Layout {
            cells: vec![cell("a", 0.0, 0.0), cell("b", 80.0, 0.0), cell("c", 40.0, 0.0)],
            nets: vec![Net {
                id: "n1".into(),
                name: String::new(),
                source: PinRef::new("a", "p"),
                target: PinRef::new("b", "p"),
                priority: 0,
                width: 2.0,
                layer: None,
            }],
            blockages: Vec::new(),
        }
    }

    fn result(points: Vec<RoutePoint>, vias: Vec<Via>) -> RouteResult {
        let mut path = Path::new("n1", points, 2.0);
        path.vias = vias;
        RouteResult {
            routes: vec![path],
            ..Default::default()
        }
    }

    #[test]
    fn straight_run_through_foreign_cell_fails() {
        let res = result(
            vec![RoutePoint::new(0.0, 0.0, "m1"), RoutePoint::new(80.0, 0.0, "m1")],
            Vec::new(),
        );
        let err = verify_routes(&layout(), &res, &RoutingConfig::default()).unwrap_err();
        assert!(err.contains("inside"));
    }

    #[test]
    fn detour_over_second_layer_passes() {
        let via = |x: f64, from: &str, to: &str| Via {
            position: Point::new(x, 0.0),
            from_layer: from.into(),
            to_layer: to.into(),
            diameter: 4.0,
        };
        let res = result(
            vec![
                RoutePoint::new(0.0, 0.0, "m1"),
                RoutePoint::new(20.0, 0.0, "m1"),
                RoutePoint::new(20.0, 0.0, "m2"),
                RoutePoint::new(60.0, 0.0, "m2"),
                RoutePoint::new(60.0, 0.0, "m1"),
                RoutePoint::new(80.0, 0.0, "m1"),
            ],
            vec![via(20.0, "m1", "m2"), via(60.0, "m2", "m1")],
        );
        assert!(verify_routes(&layout(), &res, &RoutingConfig::default()).is_ok());
    }

    #[test]
    fn sub_pitch_blockage_between_lattice_points_is_caught() {
        let mut layout = layout();
        layout.cells.pop();
        layout.blockages.push(Obstacle::new(
            Rect::new(Point::new(25.0, -2.0), Point::new(28.0, 2.0)),
            "m1",
            crate::db::obstacle::ObstacleKind::Blockage,
        ));
        let res = result(
            vec![
                RoutePoint::new(0.0, 0.0, "m1"),
                RoutePoint::new(20.0, 0.0, "m1"),
                RoutePoint::new(40.0, 0.0, "m1"),
                RoutePoint::new(60.0, 0.0, "m1"),
                RoutePoint::new(80.0, 0.0, "m1"),
            ],
            Vec::new(),
        );
        let err = verify_routes(&layout, &res, &RoutingConfig::default()).unwrap_err();
        assert!(err.contains("Blockage"));
    }

    #[test]
    fn route_must_end_on_its_pins() {
        let mut layout = layout();
        layout.cells.pop();
        let res = result(
            vec![RoutePoint::new(0.0, 0.0, "m1"), RoutePoint::new(60.0, 0.0, "m1")],
            Vec::new(),
        );
        let err = verify_routes(&layout, &res, &RoutingConfig::default()).unwrap_err();
        assert!(err.contains("route ends at (60, 0)"));
    }

    #[test]
    fn missing_vias_and_unreported_nets_are_flagged() {
        let res = result(
            vec![
                RoutePoint::new(0.0, 0.0, "m1"),
                RoutePoint::new(0.0, 0.0, "m2"),
                RoutePoint::new(0.0, 20.0, "m2"),
            ],
            Vec::new(),
        );
        assert!(verify_routes(&layout(), &res, &RoutingConfig::default()).is_err());

        let empty = RouteResult::default();
        let err = verify_routes(&layout(), &empty, &RoutingConfig::default()).unwrap_err();
        assert!(err.contains("neither routed"));
    }
}

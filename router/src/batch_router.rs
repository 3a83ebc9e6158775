use crate::algo::astar::{AStar, SearchOutcome};
use crate::algo::cost::CostModel;
use crate::cancel::CancelToken;
use crate::drc::check_drc;
use crate::error::RoutingError;
use crate::grid::ObstacleGrid;
use crate::path;
use crate::utils::conversion::GridConverter;
use icroute_common::db::core::{Cell, Net, PinRef};
use icroute_common::db::drc::DrcRule;
use icroute_common::db::obstacle::{Obstacle, ObstacleKind};
use icroute_common::db::route::{NetViolation, Path, RoutePoint, RouteResult};
use icroute_common::geom::coord::GridKey;
use icroute_common::geom::rect::Rect;
use icroute_common::util::config::RoutingConfig;
use icroute_common::util::profiler::ScopedTimer;
use std::collections::HashMap;

/// Everything one batch call reads. Nothing here is mutated.
pub struct BatchInput<'a> {
    pub nets: &'a [Net],
    pub cells: &'a [Cell],
    pub blockages: &'a [Obstacle],
}

struct Endpoints<'a> {
    source: RoutePoint,
    target: RoutePoint,
    own_cells: [&'a str; 2],
}

/// Routes every net one after the other. Per-net failures land in
/// `RouteResult::errors`; only malformed input or cancellation return `Err`.
pub fn run(
    input: &BatchInput,
    config: &RoutingConfig,
    converter: &GridConverter,
    rules: &[DrcRule],
    cancel: &CancelToken,
) -> Result<RouteResult, RoutingError> {
    let timer = ScopedTimer::new("Batch routing");

    validate_geometry(input)?;
    let endpoints = resolve_endpoints(input, config, converter)?;

    log::info!(
        "Routing {} nets over {} cells on {} layers (grid {:.3})",
        input.nets.len(),
        input.cells.len(),
        converter.layer_count(),
        converter.grid_size()
    );

    let mut order: Vec<usize> = (0..input.nets.len()).collect();
    if config.order_by_priority {
        order.sort_by_key(|&i| input.nets[i].priority);
    }

    let cost = CostModel::new(config);
    let mut solver = AStar::new(config.max_iterations);
    let mut result = RouteResult::default();
    let mut routed_wires: Vec<Obstacle> = Vec::new();

    for &net_idx in &order {
        let net = &input.nets[net_idx];
        let ends = &endpoints[net_idx];

        let obstacles = net_obstacles(input, ends.own_cells, config, &routed_wires);

        let (Some(start), Some(end)) = (converter.to_grid(&ends.source), converter.to_grid(&ends.target))
        else {
            return Err(RoutingError::UnknownLayer {
                net: net.id.clone(),
                layer: ends.source.layer.clone(),
            });
        };

        let grid = ObstacleGrid::new(converter, &obstacles, &[start, end], config.window_margin);
        let keys = match solver.find_path(&grid, &cost, start, end, cancel) {
            SearchOutcome::Found(keys) => keys,
            SearchOutcome::Cancelled => {
                log::warn!("Routing cancelled at net {}", net.id);
                return Err(RoutingError::Cancelled);
            }
            SearchOutcome::Exhausted => {
                fail(
                    &mut result,
                    format!(
                        "net {}: no path from ({}, {}) on {} to ({}, {}) on {}",
                        net.id,
                        ends.source.x,
                        ends.source.y,
                        ends.source.layer,
                        ends.target.x,
                        ends.target.y,
                        ends.target.layer
                    ),
                );
                continue;
            }
            SearchOutcome::IterationLimit => {
                fail(
                    &mut result,
                    format!(
                        "net {}: search gave up after {} expansions",
                        net.id, config.max_iterations
                    ),
                );
                continue;
            }
        };

        let path = finish_path(net, &keys, ends, config, converter);

        let bends = path::count_bends(&path.points);
        if bends > config.max_bends {
            fail(
                &mut result,
                format!(
                    "net {}: route needs {} bends, limit is {}",
                    net.id, bends, config.max_bends
                ),
            );
            continue;
        }

        if config.drc_aware {
            let drc = check_drc(&path, rules);
            result.stats.violation_count += drc.violations.len();
            result
                .violations
                .extend(drc.violations.into_iter().map(|violation| NetViolation {
                    net_id: net.id.clone(),
                    violation,
                }));
        }

        let length = path::calculate_path_length(&path.points);
        log::debug!(
            "net {}: {} points, length {:.2}, {} vias, {} bends ({} expansions)",
            net.id,
            path.points.len(),
            length,
            path.vias.len(),
            bends,
            solver.expansions()
        );

        result.stats.total_length += length;
        result.stats.via_count += path.vias.len();
        result.stats.bend_count += bends;
        result.stats.routed_nets += 1;

        if config.avoid_routed_wires {
            routed_wires.extend(wire_obstacles(&path));
        }
        result.routes.push(path);
    }

    log::info!(
        "Routed {}/{} nets in {:?}: length {:.2}, {} vias, {} bends, {} DRC violations",
        result.stats.routed_nets,
        input.nets.len(),
        timer.elapsed(),
        result.stats.total_length,
        result.stats.via_count,
        result.stats.bend_count,
        result.stats.violation_count
    );

    Ok(result)
}

fn fail(result: &mut RouteResult, message: String) {
    log::warn!("{}", message);
    result.errors.push(message);
    result.stats.failed_nets += 1;
}

fn finish_path(
    net: &Net,
    keys: &[GridKey],
    ends: &Endpoints,
    config: &RoutingConfig,
    converter: &GridConverter,
) -> Path {
    let pins = (!config.grid_snap).then_some((&ends.source, &ends.target));
    let path = path::build_path(&net.id, keys, converter, net.width, pins, config.via_diameter);
    if config.optimize_paths {
        path::optimize_path(&path)
    } else {
        path
    }
}

/// Cells other than the net's own, on the first layer, plus blockages and earlier wires.
fn net_obstacles(
    input: &BatchInput,
    own_cells: [&str; 2],
    config: &RoutingConfig,
    routed_wires: &[Obstacle],
) -> Vec<Obstacle> {
    let first_layer = config.first_layer().unwrap_or_default();
    input
        .cells
        .iter()
        .filter(|c| !own_cells.contains(&c.id.as_str()))
        .map(|c| Obstacle::new(c.bounding_box(), first_layer, ObstacleKind::Cell))
        .chain(input.blockages.iter().cloned())
        .chain(routed_wires.iter().cloned())
        .collect()
}

/// Same-layer segments of a routed path, widened to the wire width.
fn wire_obstacles(path: &Path) -> impl Iterator<Item = Obstacle> + '_ {
    path.points
        .windows(2)
        .filter(|w| w[0].layer == w[1].layer)
        .map(move |w| {
            Obstacle::new(
                Rect::from_corners(w[0].position(), w[1].position()).inflate(path.width / 2.0),
                w[0].layer.clone(),
                ObstacleKind::Route,
            )
        })
}

fn validate_geometry(input: &BatchInput) -> Result<(), RoutingError> {
    if let Some(cell) = input.cells.iter().find(|c| !c.is_finite()) {
        return Err(RoutingError::InvalidGeometry(format!(
            "cell '{}' has non-finite coordinates",
            cell.id
        )));
    }
    if let Some(b) = input.blockages.iter().find(|b| !b.rect.is_finite()) {
        return Err(RoutingError::InvalidGeometry(format!(
            "blockage on {} has non-finite coordinates",
            b.layer
        )));
    }
    if let Some(net) = input
        .nets
        .iter()
        .find(|n| !n.width.is_finite() || n.width < 0.0)
    {
        return Err(RoutingError::InvalidGeometry(format!(
            "net {} has invalid width {}",
            net.id, net.width
        )));
    }
    Ok(())
}

fn resolve_endpoints<'a>(
    input: &'a BatchInput,
    config: &RoutingConfig,
    converter: &GridConverter,
) -> Result<Vec<Endpoints<'a>>, RoutingError> {
    let cells: HashMap<&str, &Cell> = input.cells.iter().map(|c| (c.id.as_str(), c)).collect();

    let resolve = |net: &Net, pin: &PinRef, layer: &str| -> Result<RoutePoint, RoutingError> {
        let cell = cells.get(pin.cell.as_str()).ok_or_else(|| RoutingError::UnknownCell {
            net: net.id.clone(),
            cell: pin.cell.clone(),
        })?;
        let pos = cell.pin_position(&pin.pin).ok_or_else(|| RoutingError::UnknownPin {
            net: net.id.clone(),
            cell: pin.cell.clone(),
            pin: pin.pin.clone(),
        })?;
        if !converter.is_representable(pos) {
            return Err(RoutingError::InvalidGeometry(format!(
                "net {}: pin {}/{} at ({}, {}) lies outside the routing lattice",
                net.id, pin.cell, pin.pin, pos.x, pos.y
            )));
        }
        Ok(RoutePoint::new(pos.x, pos.y, layer))
    };

    input
        .nets
        .iter()
        .map(|net| {
            let layer = net
                .layer
                .as_deref()
                .or(config.first_layer())
                .unwrap_or_default();
            if converter.layer_index(layer).is_none() {
                return Err(RoutingError::UnknownLayer {
                    net: net.id.clone(),
                    layer: layer.to_string(),
                });
            }
            Ok(Endpoints {
                source: resolve(net, &net.source, layer)?,
                target: resolve(net, &net.target, layer)?,
                own_cells: [net.source.cell.as_str(), net.target.cell.as_str()],
            })
        })
        .collect()
}

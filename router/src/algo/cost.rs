use icroute_common::db::route::RoutePoint;
use icroute_common::geom::coord::GridKey;
use icroute_common::util::config::{Direction, RoutingConfig};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Axis of a planar move, `None` for a via or a zero-length move.
#[inline]
pub fn axis(from: GridKey, to: GridKey) -> Option<Axis> {
    if from.layer != to.layer {
        return None;
    }
    match (from.x != to.x, from.y != to.y) {
        (true, false) => Some(Axis::Horizontal),
        (false, true) => Some(Axis::Vertical),
        _ => None,
    }
}

/// Planar axis of the most recent wire run. A via keeps the heading of the run it left.
#[inline]
pub fn heading_after(heading: Option<Axis>, from: GridKey, to: GridKey) -> Option<Axis> {
    axis(from, to).or(heading)
}

/// Layout-space step cost: Euclidean distance plus the via penalty on a layer change.
pub fn step_cost(from: &RoutePoint, to: &RoutePoint, config: &RoutingConfig) -> f64 {
    let via = if from.layer != to.layer { config.via_cost } else { 0.0 };
    from.position().distance(&to.position()) + via
}

/// Manhattan distance ignoring layer. Never exceeds the true remaining cost.
pub fn heuristic(a: &RoutePoint, b: &RoutePoint) -> f64 {
    a.position().manhattan(&b.position())
}

/// Edge costs of the lattice graph, in layout units.
#[derive(Clone, Debug)]
pub struct CostModel {
    grid_size: f64,
    via_cost: f64,
    bend_cost: f64,
    wrong_way_cost: f64,
    preferred: Direction,
}

impl CostModel {
    pub fn new(config: &RoutingConfig) -> Self {
        Self {
            grid_size: config.grid_size,
            via_cost: config.via_cost,
            bend_cost: config.bend_cost,
            wrong_way_cost: config.wrong_way_cost,
            preferred: config.preferred_direction,
        }
    }

    /// Distance plus via penalty. For lattice neighbours Manhattan and Euclidean coincide.
    #[inline]
    pub fn step_cost(&self, from: GridKey, to: GridKey) -> f64 {
        let distance = from.manhattan(&to) as f64 * self.grid_size;
        if from.layer != to.layer {
            distance + self.via_cost
        } else {
            distance
        }
    }

    /// Full cost of moving `from -> to` when the last planar run went along `heading`.
    #[inline]
    pub fn transition_cost(&self, heading: Option<Axis>, from: GridKey, to: GridKey) -> f64 {
        let mut cost = self.step_cost(from, to);
        let outgoing = axis(from, to);

        if let (Some(incoming), Some(out)) = (heading, outgoing) {
            if incoming != out {
                cost += self.bend_cost;
            }
        }

        match (self.preferred, outgoing) {
            (Direction::Horizontal, Some(Axis::Vertical))
            | (Direction::Vertical, Some(Axis::Horizontal)) => cost += self.wrong_way_cost,
            _ => {}
        }

        cost
    }

    #[inline]
    pub fn heuristic(&self, a: GridKey, b: GridKey) -> f64 {
        a.manhattan(&b) as f64 * self.grid_size
    }
}

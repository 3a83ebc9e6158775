use crate::geom::point::Point;
use serde::{Deserialize, Serialize};

/// Point on a named routing layer, in layout units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub x: f64,
    pub y: f64,
    pub layer: String,
}

impl RoutePoint {
    pub fn new(x: f64, y: f64, layer: impl Into<String>) -> Self {
        Self {
            x,
            y,
            layer: layer.into(),
        }
    }

    pub fn position(&self) -> Point<f64> {
        Point::new(self.x, self.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn same_position(&self, other: &RoutePoint) -> bool {
        self.x == other.x && self.y == other.y
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Via {
    pub position: Point<f64>,
    pub from_layer: String,
    pub to_layer: String,
    pub diameter: f64,
}

/// Routed wire of one net. Points trace the centerline; `layer` is the layer of the first segment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub net_id: String,
    pub points: Vec<RoutePoint>,
    pub width: f64,
    pub layer: String,
    #[serde(default)]
    pub vias: Vec<Via>,
}

impl Path {
    pub fn new(net_id: impl Into<String>, points: Vec<RoutePoint>, width: f64) -> Self {
        let layer = points.first().map(|p| p.layer.clone()).unwrap_or_default();
        Self {
            net_id: net_id.into(),
            points,
            width,
            layer,
            vias: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.points.len() >= 2
    }

    pub fn start(&self) -> Option<&RoutePoint> {
        self.points.first()
    }

    pub fn end(&self) -> Option<&RoutePoint> {
        self.points.last()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteStats {
    pub total_length: f64,
    pub via_count: usize,
    pub bend_count: usize,
    pub violation_count: usize,
    pub routed_nets: usize,
    pub failed_nets: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetViolation {
    pub net_id: String,
    pub violation: crate::db::drc::DrcViolation,
}

/// Output of one batch routing call.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    pub routes: Vec<Path>,
    pub stats: RouteStats,
    #[serde(default)]
    pub violations: Vec<NetViolation>,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl RouteResult {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn route_for(&self, net_id: &str) -> Option<&Path> {
        self.routes.iter().find(|p| p.net_id == net_id)
    }
}

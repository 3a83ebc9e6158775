use crate::db::obstacle::Obstacle;
use crate::geom::point::Point;
use crate::geom::rect::Rect;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pin {
    pub name: String,
    /// Offset from the owning cell's origin.
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub pins: Vec<Pin>,
}

impl Cell {
    pub fn origin(&self) -> Point<f64> {
        Point::new(self.x, self.y)
    }

    pub fn bounding_box(&self) -> Rect {
        Rect::from_corners(
            self.origin(),
            Point::new(self.x + self.width, self.y + self.height),
        )
    }

    pub fn find_pin(&self, name: &str) -> Option<&Pin> {
        self.pins.iter().find(|p| p.name == name)
    }

    /// Absolute layout position of the named pin.
    pub fn pin_position(&self, name: &str) -> Option<Point<f64>> {
        self.find_pin(name)
            .map(|p| self.origin() + Point::new(p.x, p.y))
    }

    pub fn is_finite(&self) -> bool {
        self.bounding_box().is_finite() && self.pins.iter().all(|p| p.x.is_finite() && p.y.is_finite())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PinRef {
    pub cell: String,
    pub pin: String,
}

impl PinRef {
    pub fn new(cell: impl Into<String>, pin: impl Into<String>) -> Self {
        Self {
            cell: cell.into(),
            pin: pin.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Net {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub source: PinRef,
    pub target: PinRef,
    /// Lower routes first, but only when the router is asked to honour it.
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_net_width")]
    pub width: f64,
    /// Preferred layer for both endpoints; the first routing layer when absent.
    #[serde(default)]
    pub layer: Option<String>,
}

fn default_net_width() -> f64 {
    2.0
}

/// Placed design handed to the router: cells, the nets to connect, and fixed blockages.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default)]
    pub cells: Vec<Cell>,
    #[serde(default)]
    pub nets: Vec<Net>,
    #[serde(default)]
    pub blockages: Vec<Obstacle>,
}

impl Layout {
    pub fn find_cell(&self, id: &str) -> Option<&Cell> {
        self.cells.iter().find(|c| c.id == id)
    }

    pub fn resolve_pin(&self, pin: &PinRef) -> Option<Point<f64>> {
        self.find_cell(&pin.cell)?.pin_position(&pin.pin)
    }

    /// Bounding box of all cells and blockages.
    pub fn extent(&self) -> Option<Rect> {
        self.cells
            .iter()
            .map(|c| c.bounding_box())
            .chain(self.blockages.iter().map(|b| b.rect))
            .reduce(|a, b| a.union(&b))
    }
}

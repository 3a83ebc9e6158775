use crate::db::route::RoutePoint;
use crate::geom::rect::Rect;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObstacleKind {
    Cell,
    Route,
    Blockage,
}

/// Blocked rectangle on one routing layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub rect: Rect,
    pub layer: String,
    pub kind: ObstacleKind,
}

impl Obstacle {
    pub fn new(rect: Rect, layer: impl Into<String>, kind: ObstacleKind) -> Self {
        Self {
            rect,
            layer: layer.into(),
            kind,
        }
    }

    /// Same layer and inside the rectangle, edges included.
    pub fn contains(&self, p: &RoutePoint) -> bool {
        self.layer == p.layer && self.rect.contains(p.position())
    }
}

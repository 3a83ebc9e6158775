use serde::{Deserialize, Serialize};

/// Discrete search state: grid column, grid row and routing layer index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridKey {
    pub x: i32,
    pub y: i32,
    pub layer: u8,
}

impl GridKey {
    pub fn new(x: i32, y: i32, layer: u8) -> Self {
        Self { x, y, layer }
    }

    /// Planar grid distance, layer ignored.
    pub fn manhattan(&self, other: &GridKey) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

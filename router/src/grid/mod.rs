pub mod obstacle_grid;
pub mod obstacles;
pub mod window;

pub use obstacle_grid::ObstacleGrid;

use icroute_common::geom::coord::GridKey;

/// Finite, read-only search space seen by the pathfinder.
pub trait RoutingGrid: Sync + Send {
    fn layers(&self) -> u8;

    /// Whether `key` lies inside the searchable region.
    fn contains(&self, key: GridKey) -> bool;

    fn is_blocked(&self, key: GridKey) -> bool;
}

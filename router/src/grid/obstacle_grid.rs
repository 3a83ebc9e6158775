use super::RoutingGrid;
use super::obstacles::ObstacleIndex;
use super::window::RoutingWindow;
use crate::utils::conversion::GridConverter;
use icroute_common::db::obstacle::Obstacle;
use icroute_common::geom::coord::GridKey;

/// Multi-layer lattice over a static obstacle set, bounded by a [`RoutingWindow`].
pub struct ObstacleGrid<'a> {
    converter: &'a GridConverter,
    index: ObstacleIndex,
    window: RoutingWindow,
}

impl<'a> ObstacleGrid<'a> {
    pub fn new(
        converter: &'a GridConverter,
        obstacles: &[Obstacle],
        endpoints: &[GridKey],
        margin: u32,
    ) -> Self {
        let index = ObstacleIndex::new(obstacles, converter);
        let window = RoutingWindow::new(endpoints, index.bounds(), converter, margin);
        log::trace!(
            "Search window {}x{}x{} over {} obstacles",
            window.width(),
            window.height(),
            converter.layer_count(),
            index.len()
        );
        Self {
            converter,
            index,
            window,
        }
    }

    pub fn window(&self) -> &RoutingWindow {
        &self.window
    }
}

impl RoutingGrid for ObstacleGrid<'_> {
    fn layers(&self) -> u8 {
        self.converter.layer_count()
    }

    #[inline]
    fn contains(&self, key: GridKey) -> bool {
        key.layer < self.layers() && self.window.contains(key)
    }

    #[inline]
    fn is_blocked(&self, key: GridKey) -> bool {
        self.index.is_blocked(self.converter.world_xy(key), key.layer)
    }
}

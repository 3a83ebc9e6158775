use crate::utils::conversion::GridConverter;
use icroute_common::db::obstacle::Obstacle;
use icroute_common::db::route::RoutePoint;
use icroute_common::geom::point::Point;
use icroute_common::geom::rect::Rect;
use icroute_common::geom::rtree::SpatialIndex;

/// A point is blocked iff an obstacle on its layer contains it, edges included.
pub fn is_blocked(p: &RoutePoint, obstacles: &[Obstacle]) -> bool {
    obstacles.iter().any(|o| o.contains(p))
}

/// Per-layer R-tree over an obstacle set. Answers the same predicate as [`is_blocked`].
pub struct ObstacleIndex {
    layers: Vec<SpatialIndex>,
    bounds: Option<Rect>,
}

impl ObstacleIndex {
    pub fn new(obstacles: &[Obstacle], converter: &GridConverter) -> Self {
        let mut per_layer: Vec<Vec<(Rect, usize)>> = vec![Vec::new(); converter.layer_count() as usize];
        let mut bounds: Option<Rect> = None;
        let mut skipped = 0;

        for (id, obstacle) in obstacles.iter().enumerate() {
            let Some(layer) = converter.layer_index(&obstacle.layer) else {
                skipped += 1;
                continue;
            };
            per_layer[layer as usize].push((obstacle.rect, id));
            bounds = Some(match bounds {
                Some(b) => b.union(&obstacle.rect),
                None => obstacle.rect,
            });
        }

        if skipped > 0 {
            log::debug!("Ignoring {} obstacles on non-routing layers", skipped);
        }

        Self {
            layers: per_layer.into_iter().map(SpatialIndex::bulk_load).collect(),
            bounds,
        }
    }

    #[inline]
    pub fn is_blocked(&self, p: Point<f64>, layer: u8) -> bool {
        self.layers
            .get(layer as usize)
            .is_some_and(|index| index.query_point(p).next().is_some())
    }

    /// Union of all indexed obstacle rectangles.
    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    pub fn len(&self) -> usize {
        self.layers.iter().map(SpatialIndex::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

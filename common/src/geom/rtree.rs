use super::point::Point;
use super::rect::Rect;
use rstar::{AABB, RTree};

pub struct SpatialIndex {
    tree: RTree<IndexedRect>,
}

struct IndexedRect {
    rect: Rect,
    id: usize,
}

impl rstar::RTreeObject for IndexedRect {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.rect.min.x, self.rect.min.y],
            [self.rect.max.x, self.rect.max.y],
        )
    }
}

impl SpatialIndex {
    /// Bulk-loads `(rect, id)` pairs; faster than repeated inserts for a static set.
    pub fn bulk_load(items: Vec<(Rect, usize)>) -> Self {
        let items = items
            .into_iter()
            .map(|(rect, id)| IndexedRect { rect, id })
            .collect();
        Self {
            tree: RTree::bulk_load(items),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Ids of every rectangle containing `p`, edges included.
    pub fn query_point(&self, p: Point<f64>) -> impl Iterator<Item = usize> + '_ {
        let aabb = AABB::from_point([p.x, p.y]);
        self.tree
            .locate_in_envelope_intersecting(&aabb)
            .filter(move |item| item.rect.contains(p))
            .map(|item| item.id)
    }
}

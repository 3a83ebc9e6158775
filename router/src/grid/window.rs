use crate::utils::conversion::GridConverter;
use icroute_common::geom::coord::GridKey;
use icroute_common::geom::rect::Rect;

/// Rectangular span of grid columns/rows the search may visit (all layers).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoutingWindow {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl RoutingWindow {
    /// Covers `keys` and `extent` (layout units), grown by `margin` cells on every side.
    pub fn new(keys: &[GridKey], extent: Option<Rect>, converter: &GridConverter, margin: u32) -> Self {
        let mut min_x = i64::MAX;
        let mut max_x = i64::MIN;
        let mut min_y = i64::MAX;
        let mut max_y = i64::MIN;
        for k in keys {
            min_x = min_x.min(k.x as i64);
            max_x = max_x.max(k.x as i64);
            min_y = min_y.min(k.y as i64);
            max_y = max_y.max(k.y as i64);
        }
        if let Some(r) = extent {
            let g = converter.grid_size();
            min_x = min_x.min((r.min.x / g).floor() as i64);
            max_x = max_x.max((r.max.x / g).ceil() as i64);
            min_y = min_y.min((r.min.y / g).floor() as i64);
            max_y = max_y.max((r.max.y / g).ceil() as i64);
        }
        if min_x > max_x || min_y > max_y {
            min_x = 0;
            max_x = 0;
            min_y = 0;
            max_y = 0;
        }
        let m = margin as i64;
        let clamp = |v: i64| v.clamp(i32::MIN as i64, i32::MAX as i64) as i32;
        Self {
            min_x: clamp(min_x - m),
            max_x: clamp(max_x + m),
            min_y: clamp(min_y - m),
            max_y: clamp(max_y + m),
        }
    }

    #[inline(always)]
    pub fn contains(&self, key: GridKey) -> bool {
        key.x >= self.min_x && key.x <= self.max_x && key.y >= self.min_y && key.y <= self.max_y
    }

    pub fn width(&self) -> u64 {
        (self.max_x as i64 - self.min_x as i64 + 1) as u64
    }

    pub fn height(&self) -> u64 {
        (self.max_y as i64 - self.min_y as i64 + 1) as u64
    }
}

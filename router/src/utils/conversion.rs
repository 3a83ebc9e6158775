use icroute_common::db::route::RoutePoint;
use icroute_common::geom::coord::GridKey;
use icroute_common::geom::point::Point;
use icroute_common::util::config::RoutingConfig;

/// Maps layout coordinates onto the routing lattice and back.
#[derive(Clone, Debug)]
pub struct GridConverter {
    grid_size: f64,
    layers: Vec<String>,
}

impl GridConverter {
    pub fn new(grid_size: f64, layers: Vec<String>) -> Self {
        Self { grid_size, layers }
    }

    pub fn from_config(config: &RoutingConfig) -> Self {
        Self::new(config.grid_size, config.layers.clone())
    }

    pub fn grid_size(&self) -> f64 {
        self.grid_size
    }

    pub fn layers(&self) -> &[String] {
        &self.layers
    }

    pub fn layer_count(&self) -> u8 {
        self.layers.len() as u8
    }

    pub fn layer_index(&self, name: &str) -> Option<u8> {
        self.layers.iter().position(|l| l == name).map(|i| i as u8)
    }

    pub fn layer_name(&self, index: u8) -> &str {
        &self.layers[index as usize]
    }

    /// Nearest lattice column/row; halves round away from zero.
    #[inline]
    pub fn grid_xy(&self, p: Point<f64>) -> (i32, i32) {
        (
            (p.x / self.grid_size).round() as i32,
            (p.y / self.grid_size).round() as i32,
        )
    }

    /// Whether `p` snaps to a lattice column/row that fits the key type.
    pub fn is_representable(&self, p: Point<f64>) -> bool {
        let in_range = |v: f64| {
            let g = (v / self.grid_size).round();
            g >= i32::MIN as f64 && g <= i32::MAX as f64
        };
        in_range(p.x) && in_range(p.y)
    }

    #[inline]
    pub fn world_xy(&self, key: GridKey) -> Point<f64> {
        Point::new(
            key.x as f64 * self.grid_size,
            key.y as f64 * self.grid_size,
        )
    }

    /// `None` when the point's layer is not a routing layer.
    pub fn to_grid(&self, p: &RoutePoint) -> Option<GridKey> {
        let layer = self.layer_index(&p.layer)?;
        let (x, y) = self.grid_xy(p.position());
        Some(GridKey::new(x, y, layer))
    }

    pub fn to_world(&self, key: GridKey) -> RoutePoint {
        let p = self.world_xy(key);
        RoutePoint::new(p.x, p.y, self.layer_name(key.layer))
    }

    pub fn snap(&self, p: &RoutePoint) -> Option<RoutePoint> {
        self.to_grid(p).map(|k| self.to_world(k))
    }
}

pub mod algo;
pub mod batch_router;
pub mod cancel;
pub mod drc;
pub mod engine;
pub mod error;
pub mod grid;
pub mod path;
pub mod utils;

pub use cancel::CancelToken;
pub use drc::check_drc;
pub use engine::Router;
pub use error::RoutingError;

use icroute_common::db::core::{Cell, Layout, Net};
use icroute_common::db::drc::DrcRule;
use icroute_common::db::obstacle::Obstacle;
use icroute_common::db::route::{Path, RoutePoint, RouteResult};
use icroute_common::util::config::RoutingConfig;
use rayon::prelude::*;

pub fn route(nets: &[Net], cells: &[Cell], config: &RoutingConfig) -> Result<RouteResult, RoutingError> {
    Router::new(config.clone())?.route_nets(nets, cells)
}

pub fn route_with_rules(
    nets: &[Net],
    cells: &[Cell],
    config: &RoutingConfig,
    rules: &[DrcRule],
) -> Result<RouteResult, RoutingError> {
    Router::new(config.clone())?
        .with_rules(rules.to_vec())
        .route_nets(nets, cells)
}

pub fn find_path(
    start: &RoutePoint,
    end: &RoutePoint,
    obstacles: &[Obstacle],
    config: &RoutingConfig,
) -> Result<Option<Path>, RoutingError> {
    Router::new(config.clone())?.find_path(start, end, obstacles)
}

/// Routes independent layouts in parallel. Results come back in input order.
pub fn route_many(
    layouts: &[Layout],
    config: &RoutingConfig,
    rules: &[DrcRule],
) -> Result<Vec<RouteResult>, RoutingError> {
    let router = Router::new(config.clone())?.with_rules(rules.to_vec());
    log::info!(
        "Routing {} layouts on {} threads",
        layouts.len(),
        rayon::current_num_threads()
    );
    layouts.par_iter().map(|layout| router.route(layout)).collect()
}

use crate::algo::astar::{AStar, SearchOutcome};
use crate::algo::cost::CostModel;
use crate::batch_router::{self, BatchInput};
use crate::cancel::CancelToken;
use crate::drc::check_drc;
use crate::error::RoutingError;
use crate::grid::ObstacleGrid;
use crate::path;
use crate::utils::conversion::GridConverter;
use icroute_common::db::core::{Cell, Layout, Net};
use icroute_common::db::drc::{DrcResult, DrcRule};
use icroute_common::db::obstacle::Obstacle;
use icroute_common::db::route::{Path, RoutePoint, RouteResult};
use icroute_common::util::config::RoutingConfig;

/// A configured routing engine. Holds no per-call state, so one instance
/// can serve any number of layouts, from any number of threads.
#[derive(Clone, Debug)]
pub struct Router {
    config: RoutingConfig,
    converter: GridConverter,
    rules: Vec<DrcRule>,
    cancel: CancelToken,
}

impl Router {
    pub fn new(config: RoutingConfig) -> Result<Self, RoutingError> {
        config.validate().map_err(RoutingError::InvalidConfig)?;
        let converter = GridConverter::from_config(&config);
        Ok(Self {
            config,
            converter,
            rules: Vec::new(),
            cancel: CancelToken::default(),
        })
    }

    pub fn with_rules(mut self, rules: Vec<DrcRule>) -> Self {
        self.rules = rules;
        self
    }

    /// Searches started by this router stop early once `token` is cancelled.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    pub fn rules(&self) -> &[DrcRule] {
        &self.rules
    }

    pub fn route(&self, layout: &Layout) -> Result<RouteResult, RoutingError> {
        self.run(&BatchInput {
            nets: &layout.nets,
            cells: &layout.cells,
            blockages: &layout.blockages,
        })
    }

    pub fn route_nets(&self, nets: &[Net], cells: &[Cell]) -> Result<RouteResult, RoutingError> {
        self.run(&BatchInput {
            nets,
            cells,
            blockages: &[],
        })
    }

    fn run(&self, input: &BatchInput) -> Result<RouteResult, RoutingError> {
        batch_router::run(input, &self.config, &self.converter, &self.rules, &self.cancel)
    }

    /// Cheapest route between two points that avoids `obstacles`.
    ///
    /// Returns `Ok(None)` when no route exists within the search window or
    /// the iteration cap. The path is not simplified: it holds one point per
    /// grid step, and vias are annotated at every layer change.
    pub fn find_path(
        &self,
        start: &RoutePoint,
        end: &RoutePoint,
        obstacles: &[Obstacle],
    ) -> Result<Option<Path>, RoutingError> {
        for p in [start, end] {
            if !p.is_finite() {
                return Err(RoutingError::InvalidGeometry(format!(
                    "point ({}, {}) is not finite",
                    p.x, p.y
                )));
            }
            if !self.converter.is_representable(p.position()) {
                return Err(RoutingError::InvalidGeometry(format!(
                    "point ({}, {}) lies outside the routing lattice",
                    p.x, p.y
                )));
            }
        }
        if let Some(o) = obstacles.iter().find(|o| !o.rect.is_finite()) {
            return Err(RoutingError::InvalidGeometry(format!(
                "obstacle on {} has non-finite coordinates",
                o.layer
            )));
        }

        let key = |p: &RoutePoint| {
            self.converter.to_grid(p).ok_or_else(|| RoutingError::UnknownLayer {
                net: String::new(),
                layer: p.layer.clone(),
            })
        };
        let (from, to) = (key(start)?, key(end)?);

        let grid = ObstacleGrid::new(&self.converter, obstacles, &[from, to], self.config.window_margin);
        let cost = CostModel::new(&self.config);
        let mut solver = AStar::new(self.config.max_iterations);

        match solver.find_path(&grid, &cost, from, to, &self.cancel) {
            SearchOutcome::Found(keys) => Ok(Some(path::build_path(
                "",
                &keys,
                &self.converter,
                self.config.wire_width,
                None,
                self.config.via_diameter,
            ))),
            SearchOutcome::Exhausted | SearchOutcome::IterationLimit => {
                log::debug!(
                    "No path from ({}, {}) on {} to ({}, {}) on {} after {} expansions",
                    start.x,
                    start.y,
                    start.layer,
                    end.x,
                    end.y,
                    end.layer,
                    solver.expansions()
                );
                Ok(None)
            }
            SearchOutcome::Cancelled => Err(RoutingError::Cancelled),
        }
    }

    pub fn check(&self, path: &Path) -> DrcResult {
        check_drc(path, &self.rules)
    }
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            routing: RoutingConfig::default(),
            input: InputConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Horizontal,
    Vertical,
    Any,
}

/// Parameters of one routing invocation. Immutable once handed to the router.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoutingConfig {
    #[serde(default = "default_grid_size")]
    pub grid_size: f64,
    #[serde(default = "default_layers")]
    pub layers: Vec<String>,
    #[serde(default = "default_via_cost")]
    pub via_cost: f64,
    #[serde(default = "default_bend_cost")]
    pub bend_cost: f64,
    #[serde(default = "default_max_bends")]
    pub max_bends: usize,
    #[serde(default = "default_true")]
    pub drc_aware: bool,
    #[serde(default = "default_true")]
    pub grid_snap: bool,
    #[serde(default = "default_preferred_direction")]
    pub preferred_direction: Direction,
    /// Extra cost of a planar step against `preferred_direction`.
    #[serde(default)]
    pub wrong_way_cost: f64,
    /// Free grid cells kept around the endpoints and obstacles when bounding a search.
    #[serde(default = "default_window_margin")]
    pub window_margin: u32,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_true")]
    pub optimize_paths: bool,
    #[serde(default = "default_via_diameter")]
    pub via_diameter: f64,
    /// Width used by `find_path`, which has no net to take a width from.
    #[serde(default = "default_wire_width")]
    pub wire_width: f64,
    /// Treat wires of already routed nets as obstacles for later nets.
    #[serde(default)]
    pub avoid_routed_wires: bool,
    /// Route nets by ascending `priority` instead of list order.
    #[serde(default)]
    pub order_by_priority: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            grid_size: default_grid_size(),
            layers: default_layers(),
            via_cost: default_via_cost(),
            bend_cost: default_bend_cost(),
            max_bends: default_max_bends(),
            drc_aware: default_true(),
            grid_snap: default_true(),
            preferred_direction: default_preferred_direction(),
            wrong_way_cost: 0.0,
            window_margin: default_window_margin(),
            max_iterations: default_max_iterations(),
            optimize_paths: default_true(),
            via_diameter: default_via_diameter(),
            wire_width: default_wire_width(),
            avoid_routed_wires: false,
            order_by_priority: false,
        }
    }
}

impl RoutingConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.layers.is_empty() {
            return Err("at least one routing layer is required".to_string());
        }
        if self.layers.len() > u8::MAX as usize {
            return Err(format!("too many routing layers ({})", self.layers.len()));
        }
        for (i, layer) in self.layers.iter().enumerate() {
            if layer.is_empty() {
                return Err(format!("routing layer {} has an empty name", i));
            }
            if self.layers[..i].contains(layer) {
                return Err(format!("routing layer '{}' is listed twice", layer));
            }
        }
        if !self.grid_size.is_finite() || self.grid_size <= 0.0 {
            return Err(format!("grid size must be positive, got {}", self.grid_size));
        }
        for (name, value) in [
            ("via cost", self.via_cost),
            ("bend cost", self.bend_cost),
            ("wrong-way cost", self.wrong_way_cost),
            ("via diameter", self.via_diameter),
            ("wire width", self.wire_width),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be a non-negative number, got {}", name, value));
            }
        }
        if self.max_iterations == 0 {
            return Err("max iterations must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn first_layer(&self) -> Option<&str> {
        self.layers.first().map(String::as_str)
    }
}

#[derive(Debug, Deserialize)]
pub struct InputConfig {
    #[serde(default = "default_layout_file")]
    pub layout: String,
    #[serde(default)]
    pub rules: Option<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            layout: default_layout_file(),
            rules: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_result_file")]
    pub result: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default = "default_image_size")]
    pub image_size: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            result: default_result_file(),
            image: None,
            image_size: default_image_size(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_grid_size() -> f64 {
    20.0
}

fn default_layers() -> Vec<String> {
    vec!["m1".to_string(), "m2".to_string()]
}

fn default_via_cost() -> f64 {
    10.0
}

fn default_bend_cost() -> f64 {
    5.0
}

fn default_max_bends() -> usize {
    20
}

fn default_preferred_direction() -> Direction {
    Direction::Any
}

fn default_window_margin() -> u32 {
    10
}

fn default_max_iterations() -> usize {
    200_000
}

fn default_via_diameter() -> f64 {
    4.0
}

fn default_wire_width() -> f64 {
    2.0
}

fn default_layout_file() -> String {
    "inputs/layout.json".to_string()
}

fn default_result_file() -> String {
    "output/routes.json".to_string()
}

fn default_image_size() -> u32 {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let text = r#"
            [routing]
            grid_size = 10.0
            layers = ["met1", "met2", "met3"]
            preferred_direction = "horizontal"

            [output]
            image = "output/routes.png"
        "#;
        let config: Config = toml::from_str(text).unwrap();
        assert_eq!(config.routing.grid_size, 10.0);
        assert_eq!(config.routing.layers.len(), 3);
        assert_eq!(config.routing.preferred_direction, Direction::Horizontal);
        assert_eq!(config.routing.via_cost, 10.0);
        assert!(config.routing.grid_snap);
        assert_eq!(config.input.layout, "inputs/layout.json");
        assert_eq!(config.output.image.as_deref(), Some("output/routes.png"));
        assert!(config.routing.validate().is_ok());
    }

    #[test]
    fn empty_file_is_a_valid_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.routing, RoutingConfig::default());
    }

    #[test]
    fn validate_rejects_bad_grids() {
        let mut config = RoutingConfig::default();
        config.layers.clear();
        assert!(config.validate().is_err());

        let mut config = RoutingConfig::default();
        config.grid_size = 0.0;
        assert!(config.validate().is_err());
        config.grid_size = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = RoutingConfig::default();
        config.layers = vec!["m1".into(), "m1".into()];
        assert!(config.validate().unwrap_err().contains("twice"));

        let mut config = RoutingConfig::default();
        config.via_cost = -1.0;
        assert!(config.validate().is_err());
    }
}

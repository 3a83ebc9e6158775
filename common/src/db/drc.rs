use crate::geom::point::Point;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Spacing,
    Width,
    Area,
    Overlap,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrcRule {
    #[serde(default)]
    pub name: String,
    pub kind: RuleKind,
    /// Layers the rule governs. Empty means every layer.
    #[serde(default)]
    pub layers: Vec<String>,
    pub value: f64,
    #[serde(default = "default_severity")]
    pub severity: Severity,
}

fn default_severity() -> Severity {
    Severity::Error
}

impl DrcRule {
    pub fn governs(&self, layer: &str) -> bool {
        self.layers.is_empty() || self.layers.iter().any(|l| l == layer)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrcViolation {
    pub kind: RuleKind,
    pub message: String,
    pub position: Point<f64>,
    pub severity: Severity,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DrcResult {
    pub violations: Vec<DrcViolation>,
    pub is_valid: bool,
}

impl DrcResult {
    pub fn from_violations(violations: Vec<DrcViolation>) -> Self {
        let is_valid = violations.iter().all(|v| v.severity != Severity::Error);
        Self {
            violations,
            is_valid,
        }
    }
}

/// Per-technology rule table, usually loaded from a `[[rules]]` TOML file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleTable {
    #[serde(default)]
    pub rules: Vec<DrcRule>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_table_parses_from_toml() {
        let text = r#"
            [[rules]]
            name = "m1.width"
            kind = "width"
            layers = ["m1"]
            value = 1.5

            [[rules]]
            kind = "spacing"
            value = 2.0
            severity = "warning"
        "#;
        let table: RuleTable = toml::from_str(text).unwrap();
        assert_eq!(table.rules.len(), 2);
        assert_eq!(table.rules[0].severity, Severity::Error);
        assert!(table.rules[0].governs("m1"));
        assert!(!table.rules[0].governs("m2"));
        assert!(table.rules[1].governs("m7"));
    }

    #[test]
    fn warnings_alone_keep_result_valid() {
        let warning = DrcViolation {
            kind: RuleKind::Width,
            message: "narrow".into(),
            position: Point::new(0.0, 0.0),
            severity: Severity::Warning,
        };
        assert!(DrcResult::from_violations(vec![warning.clone()]).is_valid);
        let error = DrcViolation {
            severity: Severity::Error,
            ..warning
        };
        assert!(!DrcResult::from_violations(vec![error]).is_valid);
    }
}

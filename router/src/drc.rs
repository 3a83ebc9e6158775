use icroute_common::db::drc::{DrcResult, DrcRule, DrcViolation, RuleKind};
use icroute_common::db::route::Path;
use icroute_common::geom::point::Point;

/// Checks one finished path against the rules governing its primary layer.
///
/// Only width rules can be decided from a single path. Spacing, area and
/// overlap need the rest of the layout and belong to a full-layout DRC pass.
pub fn check_drc(path: &Path, rules: &[DrcRule]) -> DrcResult {
    let position = path.start().map(|p| p.position()).unwrap_or(Point::new(0.0, 0.0));
    let mut violations = Vec::new();

    for rule in rules.iter().filter(|r| r.governs(&path.layer)) {
        match rule.kind {
            RuleKind::Width => {
                if path.width < rule.value {
                    violations.push(DrcViolation {
                        kind: RuleKind::Width,
                        message: format!(
                            "{}wire width {} is below the minimum {} on {}",
                            rule_label(rule),
                            path.width,
                            rule.value,
                            path.layer
                        ),
                        position,
                        severity: rule.severity,
                    });
                }
            }
            RuleKind::Spacing | RuleKind::Area | RuleKind::Overlap => {}
        }
    }

    if !violations.is_empty() {
        log::debug!("net {}: {} DRC violations", path.net_id, violations.len());
    }
    DrcResult::from_violations(violations)
}

fn rule_label(rule: &DrcRule) -> String {
    if rule.name.is_empty() {
        String::new()
    } else {
        format!("{}: ", rule.name)
    }
}

// driftwatch-core/src/domain/alerting/severity.rs

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::drift::DriftSummary;
use crate::domain::policy::{SeverityRule, SeverityThresholds};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    None,
    Low,
    Medium,
    High,
}

impl Severity {
    /// Static lookup; `None` carries no recommendation.
    pub fn recommended_action(self) -> Option<&'static str> {
        match self {
            Severity::None => None,
            Severity::Low => Some("Monitor closely"),
            Severity::Medium => Some("Investigate data pipeline"),
            Severity::High => Some("Retrain model immediately"),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::None => "NONE",
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
        };
        f.write_str(label)
    }
}

/// Maps a summary to a severity level. Total: every summary gets a level.
/// Rules are checked from the most severe down and the first match wins.
pub fn classify(summary: &DriftSummary, thresholds: &SeverityThresholds) -> Severity {
    let ratio = summary.drift_ratio;
    let min_p = summary.min_p_value();

    let matches = |rule: &SeverityRule| ratio >= rule.min_ratio || min_p < rule.max_p_value;

    if matches(&thresholds.high) {
        Severity::High
    } else if matches(&thresholds.medium) {
        Severity::Medium
    } else if matches(&thresholds.low) {
        Severity::Low
    } else {
        Severity::None
    }
}

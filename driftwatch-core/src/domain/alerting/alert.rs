// driftwatch-core/src/domain/alerting/alert.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::alerting::severity::{Severity, classify};
use crate::domain::drift::DriftSummary;
use crate::domain::policy::SeverityThresholds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    NoAlert,
    Alert,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub severity: Severity,
    pub drift_ratio: f64,
    pub drifted_features: usize,
    pub timestamp: DateTime<Utc>,
    pub recommended_action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertReport {
    pub status: AlertStatus,
    pub alerts: Vec<Alert>,
}

impl AlertReport {
    pub fn none() -> Self {
        Self {
            status: AlertStatus::NoAlert,
            alerts: Vec::new(),
        }
    }

    pub fn severity(&self) -> Severity {
        self.alerts
            .iter()
            .map(|a| a.severity)
            .max()
            .unwrap_or(Severity::None)
    }
}

pub fn generate(summary: &DriftSummary, thresholds: &SeverityThresholds) -> AlertReport {
    generate_at(summary, thresholds, Utc::now())
}

pub fn generate_at(
    summary: &DriftSummary,
    thresholds: &SeverityThresholds,
    now: DateTime<Utc>,
) -> AlertReport {
    let severity = classify(summary, thresholds);
    let Some(action) = severity.recommended_action() else {
        return AlertReport::none();
    };

    AlertReport {
        status: AlertStatus::Alert,
        alerts: vec![Alert {
            severity,
            drift_ratio: summary.drift_ratio,
            drifted_features: summary.drifted_features,
            timestamp: now,
            recommended_action: action.to_string(),
        }],
    }
}

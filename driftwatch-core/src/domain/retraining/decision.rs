// driftwatch-core/src/domain/retraining/decision.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::domain::alerting::AlertStatus;
use crate::domain::error::DomainError;
use crate::domain::policy::{ResponsePolicy, RetrainingSettings};
use crate::domain::retraining::job::RetrainingJob;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrainingAction {
    NoAction,
    LogAndMonitor,
    NotifyAndPrepareRetraining,
    /// Pure decision only; resolved into one of the three outcomes below.
    TriggerRetraining,
    RetrainingTriggered,
    RetrainingSkipped,
    RetrainingFailed,
}

impl fmt::Display for RetrainingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RetrainingAction::NoAction => "no_action",
            RetrainingAction::LogAndMonitor => "log_and_monitor",
            RetrainingAction::NotifyAndPrepareRetraining => "notify_and_prepare_retraining",
            RetrainingAction::TriggerRetraining => "trigger_retraining",
            RetrainingAction::RetrainingTriggered => "retraining_triggered",
            RetrainingAction::RetrainingSkipped => "retraining_skipped",
            RetrainingAction::RetrainingFailed => "retraining_failed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub action: RetrainingAction,
    pub reason: String,
}

/// Decision engine. Terminal per call: nothing is left "in progress".
pub fn decide(drift_ratio: f64, status: AlertStatus, policy: &ResponsePolicy) -> Decision {
    let (action, reason) = match status {
        AlertStatus::NoAlert => (RetrainingAction::NoAction, "No active drift alert"),
        AlertStatus::Alert if drift_ratio < policy.monitor_below => {
            (RetrainingAction::LogAndMonitor, "Minor drift detected")
        }
        AlertStatus::Alert if drift_ratio < policy.trigger_at => (
            RetrainingAction::NotifyAndPrepareRetraining,
            "Moderate drift detected",
        ),
        AlertStatus::Alert => (RetrainingAction::TriggerRetraining, "Severe drift detected"),
    };
    Decision {
        action,
        reason: reason.to_string(),
    }
}

/// Both data floors must hold before a retraining is worth launching:
/// the accumulated-sample floor and the snapshot window.
pub fn check_readiness(available: usize, settings: &RetrainingSettings) -> Result<(), DomainError> {
    if available < settings.min_labeled_samples {
        return Err(DomainError::InsufficientLabels {
            available,
            required: settings.min_labeled_samples,
        });
    }
    if available < settings.window_size {
        return Err(DomainError::InsufficientData {
            available,
            required: settings.window_size,
        });
    }
    Ok(())
}

/// What the pipeline did in response to a drift check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionReport {
    pub action: RetrainingAction,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<RetrainingJob>,
}

impl ActionReport {
    pub fn new(action: RetrainingAction, reason: impl Into<String>) -> Self {
        Self {
            action,
            reason: reason.into(),
            snapshot: None,
            job: None,
        }
    }
}

impl From<Decision> for ActionReport {
    fn from(decision: Decision) -> Self {
        Self::new(decision.action, decision.reason)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_no_alert_means_no_action() {
        let d = decide(0.9, AlertStatus::NoAlert, &ResponsePolicy::default());
        assert_eq!(d.action, RetrainingAction::NoAction);
    }

    #[test]
    fn test_ratio_bands() {
        let p = ResponsePolicy::default();
        let cases = [
            (0.0, RetrainingAction::LogAndMonitor),
            (0.019, RetrainingAction::LogAndMonitor),
            (0.02, RetrainingAction::NotifyAndPrepareRetraining),
            (0.099, RetrainingAction::NotifyAndPrepareRetraining),
            (0.1, RetrainingAction::TriggerRetraining),
            (1.0, RetrainingAction::TriggerRetraining),
        ];
        for (ratio, expected) in cases {
            assert_eq!(decide(ratio, AlertStatus::Alert, &p).action, expected, "ratio {}", ratio);
        }
    }

    #[test]
    fn test_readiness_cites_label_shortfall() {
        let settings = RetrainingSettings::default();
        let err = check_readiness(100, &settings).unwrap_err();
        assert_eq!(
            err,
            DomainError::InsufficientLabels {
                available: 100,
                required: 500
            }
        );
        assert!(err.to_string().contains("100 < 500"));
    }

    #[test]
    fn test_readiness_checks_window_too() {
        let settings = RetrainingSettings {
            min_labeled_samples: 500,
            window_size: 1000,
            ..RetrainingSettings::default()
        };
        let err = check_readiness(600, &settings).unwrap_err();
        assert!(err.to_string().contains("600 < 1000"));
        assert!(check_readiness(600, &RetrainingSettings::default()).is_ok());
    }

    #[test]
    fn test_action_labels_match_serde() {
        let json = serde_json::to_string(&RetrainingAction::NotifyAndPrepareRetraining).unwrap();
        assert_eq!(json, "\"notify_and_prepare_retraining\"");
        assert_eq!(
            RetrainingAction::RetrainingSkipped.to_string(),
            "retraining_skipped"
        );
    }
}

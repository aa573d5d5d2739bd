// driftwatch-core/src/domain/policy.rs
//
// Every threshold the pipeline acts on lives here, so tests and operators can
// vary policy without touching the detection or decision logic.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::{Validate, ValidationError};

use crate::domain::retraining::promotion::PromotionPolicy;

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
#[serde(default)]
pub struct DriftPolicy {
    pub name: String,

    pub paths: StoragePaths,

    #[validate(nested)]
    pub drift: DriftSettings,

    #[validate(nested)]
    pub severity: SeverityThresholds,

    #[validate(nested)]
    pub response: ResponsePolicy,

    #[validate(nested)]
    pub retraining: RetrainingSettings,

    #[validate(nested)]
    pub promotion: PromotionPolicy,
}

impl Default for DriftPolicy {
    fn default() -> Self {
        Self {
            name: "model".to_string(),
            paths: StoragePaths::default(),
            drift: DriftSettings::default(),
            severity: SeverityThresholds::default(),
            response: ResponsePolicy::default(),
            retraining: RetrainingSettings::default(),
            promotion: PromotionPolicy::default(),
        }
    }
}

/// Persisted state layout. Relative paths are resolved against the project directory.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct StoragePaths {
    pub reference: PathBuf,
    pub prediction_log: PathBuf,
    pub accumulated: PathBuf,
    pub snapshots: PathBuf,
    pub runs: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self {
            reference: PathBuf::from("reference_stats.json"),
            prediction_log: PathBuf::from("logs/predictions.jsonl"),
            accumulated: PathBuf::from("data/retraining/retraining.jsonl"),
            snapshots: PathBuf::from("data/retraining/snapshots"),
            runs: PathBuf::from("runs/runs.jsonl"),
        }
    }
}

impl StoragePaths {
    pub fn resolve(&mut self, root: &std::path::Path) {
        for path in [
            &mut self.reference,
            &mut self.prediction_log,
            &mut self.accumulated,
            &mut self.snapshots,
            &mut self.runs,
        ] {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        }
    }
}

/// What the aggregator does when the log holds fewer records than requested.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ShortWindowPolicy {
    /// Defer: report `no_data` until the full window is available.
    #[default]
    NoData,
    /// Compare whatever records exist.
    Partial,
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
#[serde(default)]
pub struct DriftSettings {
    /// Significance level of the KS test.
    #[validate(range(exclusive_min = 0.0, exclusive_max = 1.0))]
    pub alpha: f64,

    /// Minimum current-window values before a feature is compared at all.
    #[validate(range(min = 1))]
    pub min_samples: usize,

    #[validate(range(min = 1))]
    pub window_size: usize,

    pub short_window: ShortWindowPolicy,

    #[validate(nested)]
    pub classifier: ClassifierSettings,
}

impl Default for DriftSettings {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            min_samples: 10,
            window_size: 100,
            short_window: ShortWindowPolicy::NoData,
            classifier: ClassifierSettings::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
#[serde(default)]
pub struct ClassifierSettings {
    pub enabled: bool,

    #[validate(range(min = 0.5, max = 1.0))]
    pub auc_threshold: f64,

    pub seed: u64,

    /// Cap on rows drawn from each population.
    #[validate(range(min = 1))]
    pub max_samples: usize,

    #[validate(range(min = 2))]
    pub min_samples: usize,

    #[validate(range(exclusive_min = 0.0))]
    pub learning_rate: f64,

    #[validate(range(min = 1))]
    pub epochs: usize,

    #[validate(range(min = 0.0))]
    pub l2: f64,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            auc_threshold: 0.75,
            seed: 42,
            max_samples: 5000,
            min_samples: 10,
            learning_rate: 0.1,
            epochs: 300,
            l2: 0.01,
        }
    }
}

/// One row of the severity table: the level applies when the drift ratio
/// reaches `min_ratio` or the smallest p-value falls below `max_p_value`.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Validate)]
pub struct SeverityRule {
    #[validate(range(min = 0.0, max = 1.0))]
    pub min_ratio: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub max_p_value: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_severity_order"))]
pub struct SeverityThresholds {
    #[validate(nested)]
    pub high: SeverityRule,
    #[validate(nested)]
    pub medium: SeverityRule,
    #[validate(nested)]
    pub low: SeverityRule,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            high: SeverityRule {
                min_ratio: 0.6,
                max_p_value: 0.001,
            },
            medium: SeverityRule {
                min_ratio: 0.4,
                max_p_value: 0.01,
            },
            low: SeverityRule {
                min_ratio: 0.2,
                max_p_value: 0.05,
            },
        }
    }
}

fn validate_severity_order(t: &SeverityThresholds) -> Result<(), ValidationError> {
    let ratios_ordered = t.high.min_ratio >= t.medium.min_ratio && t.medium.min_ratio >= t.low.min_ratio;
    let p_values_ordered =
        t.high.max_p_value <= t.medium.max_p_value && t.medium.max_p_value <= t.low.max_p_value;
    if ratios_ordered && p_values_ordered {
        Ok(())
    } else {
        Err(ValidationError::new("severity_thresholds_not_ordered"))
    }
}

/// Drift-ratio bands of the retraining decision engine.
#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_response_bands"))]
pub struct ResponsePolicy {
    /// Below this ratio an alert is only logged and monitored.
    #[validate(range(min = 0.0, max = 1.0))]
    pub monitor_below: f64,
    /// At or above this ratio retraining is attempted.
    #[validate(range(min = 0.0, max = 1.0))]
    pub trigger_at: f64,
}

impl Default for ResponsePolicy {
    fn default() -> Self {
        Self {
            monitor_below: 0.02,
            trigger_at: 0.1,
        }
    }
}

fn validate_response_bands(p: &ResponsePolicy) -> Result<(), ValidationError> {
    if p.monitor_below <= p.trigger_at {
        Ok(())
    } else {
        Err(ValidationError::new("monitor_band_above_trigger"))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
#[serde(default)]
pub struct RetrainingSettings {
    /// Floor on accumulated labeled samples before any retraining.
    #[validate(range(min = 1))]
    pub min_labeled_samples: usize,

    /// Rows handed to the trainer in one snapshot.
    #[validate(range(min = 1))]
    pub window_size: usize,

    /// Remove merged records from the live log once training succeeded.
    pub clear_log_on_success: bool,

    #[validate(range(min = 1))]
    pub timeout_secs: u64,

    /// Operator-set cap; the oldest accumulated rows are dropped past it.
    pub max_accumulated_rows: Option<usize>,

    /// Trainer program and arguments. `{dataset}` is replaced by the snapshot path.
    #[validate(length(min = 1))]
    pub command: Vec<String>,
}

impl Default for RetrainingSettings {
    fn default() -> Self {
        Self {
            min_labeled_samples: 500,
            window_size: 200,
            clear_log_on_success: true,
            timeout_secs: 3600,
            max_accumulated_rows: None,
            command: ["python", "-m", "src.models.train", "--data", "{dataset}"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(DriftPolicy::default().validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "name: credit\ndrift:\n  alpha: 0.01\nretraining:\n  min_labeled_samples: 50\n";
        let policy: DriftPolicy = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(policy.name, "credit");
        assert_eq!(policy.drift.alpha, 0.01);
        assert_eq!(policy.drift.min_samples, 10);
        assert_eq!(policy.retraining.min_labeled_samples, 50);
        assert_eq!(policy.retraining.window_size, 200);
        assert_eq!(policy.drift.short_window, ShortWindowPolicy::NoData);
    }

    #[test]
    fn test_out_of_range_alpha_is_rejected() {
        let mut policy = DriftPolicy::default();
        policy.drift.alpha = 1.5;
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_unordered_severity_is_rejected() {
        let mut policy = DriftPolicy::default();
        policy.severity.low.min_ratio = 0.9;
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_resolve_only_touches_relative_paths() {
        let mut paths = StoragePaths {
            reference: PathBuf::from("/abs/ref.json"),
            ..StoragePaths::default()
        };
        paths.resolve(std::path::Path::new("/project"));
        assert_eq!(paths.reference, PathBuf::from("/abs/ref.json"));
        assert_eq!(
            paths.prediction_log,
            PathBuf::from("/project/logs/predictions.jsonl")
        );
    }
}

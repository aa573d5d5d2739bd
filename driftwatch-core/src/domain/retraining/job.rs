// driftwatch-core/src/domain/retraining/job.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::domain::retraining::promotion::{PromotionDecision, Verdict};

pub type Metrics = BTreeMap<String, f64>;

/// Tag recorded on every drift-caused training run.
pub const TRIGGER_TAG: &str = "trigger";
pub const TRIGGER_DRIFT: &str = "drift_detected";
pub const TRIGGER_MANUAL: &str = "manual";
pub const RETRAINING_TAG: &str = "retraining";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobOutcome {
    Success,
    Failure,
}

/// One launched training run. Terminal once `outcome` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrainingJob {
    pub run_id: String,
    pub dataset: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: JobOutcome,
    #[serde(default)]
    pub metrics: Metrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PromotionDecision>,
}

impl RetrainingJob {
    pub fn succeeded(&self) -> bool {
        self.outcome == JobOutcome::Success
    }

    pub fn promoted(&self) -> bool {
        self.succeeded()
            && self
                .promotion
                .as_ref()
                .is_some_and(|p| p.decision == Verdict::Promote)
    }
}

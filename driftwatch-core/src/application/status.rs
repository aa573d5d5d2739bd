// driftwatch-core/src/application/status.rs

use serde::Serialize;
use std::path::PathBuf;

use crate::application::accumulator::RetrainingDataAccumulator;
use crate::domain::policy::RetrainingSettings;
use crate::domain::retraining::check_readiness;
use crate::error::DriftwatchError;

/// Readiness view shown by `driftwatch status` (READY / WAITING).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RetrainingStatus {
    pub available: usize,
    pub required: usize,
    pub window: usize,
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waiting_reason: Option<String>,
    pub snapshots: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_snapshot: Option<PathBuf>,
}

impl RetrainingStatus {
    pub fn label(&self) -> &'static str {
        if self.ready { "READY" } else { "WAITING" }
    }
}

pub fn retraining_status(
    accumulator: &RetrainingDataAccumulator,
    settings: &RetrainingSettings,
) -> Result<RetrainingStatus, DriftwatchError> {
    let available = accumulator.available_samples()?;
    let readiness = check_readiness(available, settings);
    let snapshots = accumulator.snapshots();

    Ok(RetrainingStatus {
        available,
        required: settings.min_labeled_samples,
        window: settings.window_size,
        ready: readiness.is_ok(),
        waiting_reason: readiness.err().map(|e| e.to_string()),
        snapshots: snapshots.len(),
        latest_snapshot: snapshots.last().cloned(),
    })
}

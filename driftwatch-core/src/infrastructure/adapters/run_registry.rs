// driftwatch-core/src/infrastructure/adapters/run_registry.rs

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::debug;

use crate::domain::retraining::{Metrics, RetrainingJob};
use crate::error::DriftwatchError;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs::{ensure_parent, read_jsonl};
use crate::ports::run_registry::RunRegistry;

/// Append-only run history, one `RetrainingJob` per line.
pub struct JsonlRunRegistry {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlRunRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }
}

impl RunRegistry for JsonlRunRegistry {
    fn record(&self, job: &RetrainingJob) -> Result<(), DriftwatchError> {
        let mut line = serde_json::to_vec(job)?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().map_err(|_| {
            DriftwatchError::Infrastructure(InfrastructureError::Io(std::io::Error::other(
                "Run registry Mutex Poisoned",
            )))
        })?;
        ensure_parent(&self.path)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(&line)?;
        debug!(run_id = %job.run_id, "Run recorded");
        Ok(())
    }

    fn production_metrics(&self) -> Result<Option<Metrics>, DriftwatchError> {
        Ok(self
            .runs()?
            .into_iter()
            .rev()
            .find(RetrainingJob::promoted)
            .map(|job| job.metrics))
    }

    fn runs(&self) -> Result<Vec<RetrainingJob>, DriftwatchError> {
        Ok(read_jsonl(&self.path)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::retraining::{JobOutcome, PromotionDecision, Verdict};
    use anyhow::Result;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn job(id: &str, outcome: JobOutcome, verdict: Option<Verdict>, auc: f64) -> RetrainingJob {
        RetrainingJob {
            run_id: id.into(),
            dataset: PathBuf::from("snap.jsonl"),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            outcome,
            metrics: BTreeMap::from([("roc_auc".to_string(), auc)]),
            artifact: None,
            stdout: String::new(),
            stderr: String::new(),
            error: None,
            tags: BTreeMap::new(),
            promotion: verdict.map(|decision| PromotionDecision {
                decision,
                wins: 0,
                compared: 0,
            }),
        }
    }

    #[test]
    fn test_production_metrics_follow_latest_promotion() -> Result<()> {
        let dir = tempdir()?;
        let registry = JsonlRunRegistry::new(dir.path().join("runs/runs.jsonl"));
        assert_eq!(registry.production_metrics()?, None);

        registry.record(&job("a", JobOutcome::Success, Some(Verdict::Promote), 0.70))?;
        registry.record(&job("b", JobOutcome::Success, Some(Verdict::Promote), 0.80))?;
        registry.record(&job("c", JobOutcome::Success, Some(Verdict::Reject), 0.60))?;
        registry.record(&job("d", JobOutcome::Failure, None, 0.99))?;

        let prod = registry.production_metrics()?.unwrap();
        assert_eq!(prod["roc_auc"], 0.80);
        assert_eq!(registry.runs()?.len(), 4);
        Ok(())
    }
}

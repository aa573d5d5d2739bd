// driftwatch-core/src/application/trigger.rs

use chrono::Utc;
use rand::Rng;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use crate::domain::retraining::{
    JobOutcome, Metrics, PromotionPolicy, RETRAINING_TAG, RetrainingJob, TRIGGER_TAG,
};
use crate::ports::run_registry::RunRegistry;
use crate::ports::trainer::{Trainer, TrainingJobError};

/// Launches one training run per call and records it. Never retries.
#[derive(Clone)]
pub struct RetrainingJobTrigger {
    trainer: Arc<dyn Trainer>,
    registry: Arc<dyn RunRegistry>,
    promotion: PromotionPolicy,
    timeout: Duration,
}

impl RetrainingJobTrigger {
    pub fn new(
        trainer: Arc<dyn Trainer>,
        registry: Arc<dyn RunRegistry>,
        promotion: PromotionPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            trainer,
            registry,
            promotion,
            timeout,
        }
    }

    pub fn registry(&self) -> &Arc<dyn RunRegistry> {
        &self.registry
    }

    /// Trains on `snapshot` and returns the terminal job record.
    /// `trigger` is stored as the run's `trigger` tag.
    #[instrument(skip(self), fields(timeout_secs = self.timeout.as_secs()))]
    pub async fn launch(&self, snapshot: &Path, trigger: &str) -> RetrainingJob {
        let run_id = new_run_id();
        let started_at = Utc::now();
        info!(%run_id, "🚀 Launching retraining job");

        // The trainer future owns the child process; dropping it on timeout kills it.
        let result = match tokio::time::timeout(self.timeout, self.trainer.train(snapshot)).await {
            Ok(result) => result,
            Err(_) => Err(TrainingJobError::TimedOut(self.timeout.as_secs())),
        };

        let tags = BTreeMap::from([
            (TRIGGER_TAG.to_string(), trigger.to_string()),
            (RETRAINING_TAG.to_string(), "true".to_string()),
        ]);

        let mut job = match result {
            Ok(report) => RetrainingJob {
                run_id,
                dataset: snapshot.to_path_buf(),
                started_at,
                finished_at: Utc::now(),
                outcome: JobOutcome::Success,
                metrics: report.metrics,
                artifact: report.artifact,
                stdout: report.stdout,
                stderr: report.stderr,
                error: None,
                tags,
                promotion: None,
            },
            Err(err) => {
                error!(%run_id, error = %err, "Retraining job failed");
                let (stdout, stderr) = err.output();
                RetrainingJob {
                    run_id,
                    dataset: snapshot.to_path_buf(),
                    started_at,
                    finished_at: Utc::now(),
                    outcome: JobOutcome::Failure,
                    metrics: Metrics::new(),
                    artifact: None,
                    stdout: stdout.to_string(),
                    stderr: stderr.to_string(),
                    error: Some(err.to_string()),
                    tags,
                    promotion: None,
                }
            }
        };

        if job.succeeded() {
            let production = match self.registry.production_metrics() {
                Ok(metrics) => metrics,
                Err(e) => {
                    warn!(error = %e, "Could not read production metrics; treating as cold start");
                    None
                }
            };
            let decision = self.promotion.evaluate(production.as_ref(), &job.metrics);
            info!(
                run_id = %job.run_id,
                decision = ?decision.decision,
                wins = decision.wins,
                compared = decision.compared,
                "Promotion check"
            );
            job.promotion = Some(decision);
        }

        // Bookkeeping only: a registry failure never changes the job outcome.
        if let Err(e) = self.registry.record(&job) {
            warn!(run_id = %job.run_id, error = %e, "Failed to record run");
        }
        job
    }
}

fn new_run_id() -> String {
    let suffix: u32 = rand::thread_rng().r#gen();
    format!("run_{}_{:08x}", Utc::now().format("%Y%m%d_%H%M%S"), suffix)
}

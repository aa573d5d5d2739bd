// driftwatch-core/src/application/monitor.rs

use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::application::accumulator::RetrainingDataAccumulator;
use crate::application::status::{RetrainingStatus, retraining_status};
use crate::application::trigger::RetrainingJobTrigger;
use crate::domain::alerting::{self, AlertReport, AlertStatus};
use crate::domain::drift::{ClassifierDriftTest, ClassifierOutcome, DriftAggregator, DriftOutcome};
use crate::domain::error::DomainError;
use crate::domain::policy::DriftPolicy;
use crate::domain::reference::ReferenceDistribution;
use crate::domain::retraining::{
    ActionReport, RetrainingAction, TRIGGER_DRIFT, TRIGGER_MANUAL, check_readiness, decide,
};
use crate::error::DriftwatchError;
use crate::infrastructure::adapters::{
    CommandTrainer, JsonReferenceStore, JsonlDatasetStore, JsonlPredictionLog, JsonlRunRegistry,
};
use crate::infrastructure::config::load_policy;
use crate::ports::prediction_log::PredictionLog;
use crate::ports::run_registry::RunRegistry;
use crate::ports::trainer::Trainer;

/// Everything one drift check produced, in the shape the dashboard reads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriftCheckReport {
    pub drift_summary: DriftOutcome,
    pub alert_report: AlertReport,
    pub response_action: ActionReport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier: Option<ClassifierOutcome>,
}

/// Drift check and retraining response for one deployed model.
pub struct DriftMonitor {
    policy: DriftPolicy,
    reference: ReferenceDistribution,
    log: Arc<dyn PredictionLog>,
    accumulator: RetrainingDataAccumulator,
    trigger: RetrainingJobTrigger,
    /// Single flight within this process. The accumulator's file lock
    /// extends it to other processes; both are held for the whole
    /// stage → train → commit sequence.
    retraining_gate: Mutex<()>,
}

impl DriftMonitor {
    /// Wires the file-backed adapters for a project directory. Fails when the
    /// configuration is invalid or no reference distribution exists.
    #[instrument]
    pub fn open(project_dir: &Path) -> Result<Self, DriftwatchError> {
        let policy = load_policy(project_dir)?;
        let reference = JsonReferenceStore::new(&policy.paths.reference).load()?;

        let log: Arc<dyn PredictionLog> = Arc::new(JsonlPredictionLog::new(&policy.paths.prediction_log));
        let trainer: Arc<dyn Trainer> = Arc::new(CommandTrainer::new(policy.retraining.command.clone()));
        let registry: Arc<dyn RunRegistry> = Arc::new(JsonlRunRegistry::new(&policy.paths.runs));

        Ok(Self::new(policy, reference, log, trainer, registry))
    }

    pub fn new(
        policy: DriftPolicy,
        reference: ReferenceDistribution,
        log: Arc<dyn PredictionLog>,
        trainer: Arc<dyn Trainer>,
        registry: Arc<dyn RunRegistry>,
    ) -> Self {
        let store = JsonlDatasetStore::new(&policy.paths.accumulated, &policy.paths.snapshots);
        let accumulator = RetrainingDataAccumulator::new(log.clone(), store, policy.retraining.clone());
        let trigger = RetrainingJobTrigger::new(
            trainer,
            registry,
            policy.promotion.clone(),
            Duration::from_secs(policy.retraining.timeout_secs),
        );
        Self {
            policy,
            reference,
            log,
            accumulator,
            trigger,
            retraining_gate: Mutex::new(()),
        }
    }

    pub fn policy(&self) -> &DriftPolicy {
        &self.policy
    }

    pub fn reference(&self) -> &ReferenceDistribution {
        &self.reference
    }

    pub fn log(&self) -> &Arc<dyn PredictionLog> {
        &self.log
    }

    pub fn accumulator(&self) -> &RetrainingDataAccumulator {
        &self.accumulator
    }

    pub fn registry(&self) -> &Arc<dyn RunRegistry> {
        self.trigger.registry()
    }

    /// Compares the last `window_size` records against the reference and acts
    /// on the result. Always returns a report; read failures become `no_data`.
    #[instrument(skip(self))]
    pub async fn check_drift(&self, window_size: usize) -> DriftCheckReport {
        // 1. Read the window (no lock: the log guarantees whole records)
        let window = match self.log.tail(window_size) {
            Ok(window) => window,
            Err(e) => {
                warn!(error = %e, "Prediction log unreadable");
                return no_data_report(DriftOutcome::no_data(e.to_string()));
            }
        };

        // 2. Per-feature comparison
        let outcome = DriftAggregator::new(&self.policy.drift).aggregate(
            &self.reference,
            &window.records,
            window_size,
            window.malformed.len(),
        );
        let Some(summary) = outcome.summary() else {
            info!(?outcome, "No drift summary available");
            return no_data_report(outcome);
        };

        // 3. Population-level secondary signal
        let classifier = self
            .policy
            .drift
            .classifier
            .enabled
            .then(|| ClassifierDriftTest::new(&self.policy.drift.classifier).evaluate(&self.reference, &window.records));

        // 4. Severity → alert → action
        let alert_report = alerting::generate(summary, &self.policy.severity);
        info!(
            drift_ratio = summary.drift_ratio,
            drifted = summary.drifted_features,
            checked = summary.total_features_checked,
            severity = %alert_report.severity(),
            "📊 Drift check complete"
        );
        let response_action = self.respond(summary.drift_ratio, alert_report.status).await;

        DriftCheckReport {
            drift_summary: outcome,
            alert_report,
            response_action,
            classifier,
        }
    }

    /// Runs the decision engine and, on a trigger, the retraining sequence.
    pub async fn respond(&self, drift_ratio: f64, status: AlertStatus) -> ActionReport {
        let decision = decide(drift_ratio, status, &self.policy.response);
        if decision.action != RetrainingAction::TriggerRetraining {
            return decision.into();
        }
        self.retrain(TRIGGER_DRIFT, decision.reason).await
    }

    /// Operator-forced retraining. The data floors still apply.
    pub async fn force_retrain(&self) -> ActionReport {
        self.retrain(TRIGGER_MANUAL, "Retraining requested by operator".to_string())
            .await
    }

    pub fn status(&self) -> Result<RetrainingStatus, DriftwatchError> {
        retraining_status(&self.accumulator, &self.policy.retraining)
    }

    #[instrument(skip(self))]
    async fn retrain(&self, trigger: &str, reason: String) -> ActionReport {
        // 1. Single flight (this process, then any process on the project)
        let Ok(_gate) = self.retraining_gate.try_lock() else {
            info!("Retraining already in flight, skipping");
            return skipped(DomainError::RetrainingInFlight.to_string());
        };
        let mut retraining_lock = match self.accumulator.open_retraining_lock() {
            Ok(lock) => lock,
            Err(e) => return failed(format!("could not open retraining lock: {e}")),
        };
        let _held = match retraining_lock.try_write() {
            Ok(guard) => guard,
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                info!("Retraining already in flight in another process, skipping");
                return skipped(DomainError::RetrainingInFlight.to_string());
            }
            Err(e) => return failed(format!("could not take retraining lock: {e}")),
        };

        // 2. Data floors
        let settings = &self.policy.retraining;
        let available = match self.accumulator.available_samples() {
            Ok(n) => n,
            Err(e) => return failed(format!("could not count labeled samples: {e}")),
        };
        if let Err(e) = check_readiness(available, settings) {
            info!(available, reason = %e, "Retraining skipped");
            return skipped(e.to_string());
        }

        // 3. Snapshot (durable state untouched until commit)
        let staged = match self.accumulator.stage(settings.window_size) {
            Ok(staged) => staged,
            Err(DriftwatchError::Domain(e)) => return skipped(e.to_string()),
            Err(e) => return failed(format!("could not stage retraining data: {e}")),
        };
        let snapshot = staged.snapshot.clone();

        // 4. Train
        let job = self.trigger.launch(&snapshot, trigger).await;
        if !job.succeeded() {
            let error = job.error.clone().unwrap_or_default();
            let mut report = ActionReport::new(
                RetrainingAction::RetrainingFailed,
                format!("retraining job failed: {error}"),
            );
            report.snapshot = Some(snapshot);
            report.job = Some(job);
            return report;
        }

        // 5. Commit only after confirmed success
        let reason = match self.accumulator.commit(staged) {
            Ok(_) => reason,
            Err(e) => {
                warn!(error = %e, "Training succeeded but the dataset commit failed");
                format!("{reason} (dataset commit failed: {e})")
            }
        };
        info!(run_id = %job.run_id, promoted = job.promoted(), "✅ Retraining completed");

        let mut report = ActionReport::new(RetrainingAction::RetrainingTriggered, reason);
        report.snapshot = Some(snapshot);
        report.job = Some(job);
        report
    }
}

fn no_data_report(outcome: DriftOutcome) -> DriftCheckReport {
    let reason = match &outcome {
        DriftOutcome::NoData { reason } => format!("No drift summary: {reason}"),
        DriftOutcome::Ok(_) => "No active drift alert".to_string(),
    };
    DriftCheckReport {
        drift_summary: outcome,
        alert_report: AlertReport::none(),
        response_action: ActionReport::new(RetrainingAction::NoAction, reason),
        classifier: None,
    }
}

fn skipped(reason: String) -> ActionReport {
    ActionReport::new(RetrainingAction::RetrainingSkipped, reason)
}

fn failed(reason: String) -> ActionReport {
    ActionReport::new(RetrainingAction::RetrainingFailed, reason)
}

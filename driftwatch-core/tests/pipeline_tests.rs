// driftwatch-core/tests/pipeline_tests.rs
//
// End-to-end runs of the monitor over real files in a temp project.

#![allow(clippy::unwrap_used)]

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::{TempDir, tempdir};

use driftwatch_core::application::DriftMonitor;
use driftwatch_core::domain::alerting::{AlertStatus, Severity};
use driftwatch_core::domain::drift::DriftOutcome;
use driftwatch_core::domain::policy::{DriftPolicy, ShortWindowPolicy};
use driftwatch_core::domain::record::{FeatureMap, FeatureValue, PredictionRecord};
use driftwatch_core::domain::reference::ReferenceDistribution;
use driftwatch_core::domain::retraining::{Metrics, RetrainingAction};
use driftwatch_core::infrastructure::adapters::{JsonlPredictionLog, JsonlRunRegistry};
use driftwatch_core::ports::prediction_log::PredictionLog;
use driftwatch_core::ports::run_registry::RunRegistry;
use driftwatch_core::ports::trainer::{Trainer, TrainingJobError, TrainingReport};

// --- HELPERS ---

/// Inverse standard normal CDF (Acklam).
fn probit(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    let p_low = 0.02425;
    if p < p_low {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - p_low {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -probit(1.0 - p)
    }
}

/// Evenly spaced quantiles of N(mean, 1), in a scrambled but fixed order.
fn normal_sample(n: usize, mean: f64) -> Vec<f64> {
    (0..n)
        .map(|i| (i * 7919) % n)
        .map(|i| mean + probit((i as f64 + 0.5) / n as f64))
        .collect()
}

const FEATURES: [&str; 4] = ["age", "balance", "duration", "income"];

fn reference() -> ReferenceDistribution {
    ReferenceDistribution {
        generation: "v1".into(),
        created_at: Utc::now(),
        features: FEATURES
            .iter()
            .map(|f| (f.to_string(), normal_sample(1000, 0.0)))
            .collect(),
    }
}

fn fill_log(log: &dyn PredictionLog, n: usize, mean: f64) {
    let columns: Vec<Vec<f64>> = FEATURES.iter().map(|_| normal_sample(n, mean)).collect();
    for i in 0..n {
        let features: FeatureMap = FEATURES
            .iter()
            .zip(&columns)
            .map(|(name, values)| (name.to_string(), FeatureValue::Number(values[i])))
            .collect();
        let probability = (i % 10) as f64 / 10.0;
        log.append(&PredictionRecord::new(features, u8::from(probability >= 0.5), probability))
            .unwrap();
    }
}

/// Trainer double: records what the live log looked like while it ran.
struct ObservingTrainer {
    log_path: PathBuf,
    log_during_training: Mutex<Option<Vec<u8>>>,
    fail: bool,
    delay: Duration,
    calls: Mutex<usize>,
}

impl ObservingTrainer {
    fn new(log_path: &Path, fail: bool, delay: Duration) -> Self {
        Self {
            log_path: log_path.to_path_buf(),
            log_during_training: Mutex::new(None),
            fail,
            delay,
            calls: Mutex::new(0),
        }
    }
}

#[async_trait]
impl Trainer for ObservingTrainer {
    async fn train(&self, dataset: &Path) -> Result<TrainingReport, TrainingJobError> {
        *self.calls.lock().unwrap() += 1;
        *self.log_during_training.lock().unwrap() = fs::read(&self.log_path).ok();
        assert!(dataset.exists(), "snapshot must exist before training");
        tokio::time::sleep(self.delay).await;
        if self.fail {
            return Err(TrainingJobError::Failed("diverged".into()));
        }
        Ok(TrainingReport {
            metrics: Metrics::from([("roc_auc".to_string(), 0.81)]),
            artifact: Some("models/candidate".into()),
            ..TrainingReport::default()
        })
    }
}

struct Project {
    dir: TempDir,
    policy: DriftPolicy,
    log: Arc<JsonlPredictionLog>,
}

impl Project {
    fn new(configure: impl FnOnce(&mut DriftPolicy)) -> Result<Self> {
        let dir = tempdir()?;
        let mut policy = DriftPolicy::default();
        configure(&mut policy);
        policy.paths.resolve(dir.path());
        let log = Arc::new(JsonlPredictionLog::new(&policy.paths.prediction_log));
        Ok(Self { dir, policy, log })
    }

    fn monitor(&self, trainer: Arc<dyn Trainer>) -> DriftMonitor {
        let registry: Arc<dyn RunRegistry> = Arc::new(JsonlRunRegistry::new(&self.policy.paths.runs));
        DriftMonitor::new(self.policy.clone(), reference(), self.log.clone(), trainer, registry)
    }

    fn snapshots(&self) -> Vec<PathBuf> {
        match fs::read_dir(&self.policy.paths.snapshots) {
            Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
            Err(_) => Vec::new(),
        }
    }

    fn read(&self, path: &Path) -> Vec<u8> {
        fs::read(path).unwrap_or_default()
    }
}

// --- SCENARIOS ---

#[tokio::test]
async fn test_stable_window_raises_no_alert() -> Result<()> {
    let project = Project::new(|_| {})?;
    fill_log(project.log.as_ref(), 100, 0.0);
    let trainer = Arc::new(ObservingTrainer::new(project.log.path(), false, Duration::ZERO));
    let monitor = project.monitor(trainer.clone());

    let report = monitor.check_drift(100).await;

    let summary = report.drift_summary.summary().unwrap();
    assert_eq!(summary.total_features_checked, 4);
    assert_eq!(summary.drifted_features, 0);
    assert!(summary.details.values().all(|d| d.p_value > 0.05));
    assert_eq!(report.alert_report.status, AlertStatus::NoAlert);
    assert_eq!(report.response_action.action, RetrainingAction::NoAction);
    assert_eq!(*trainer.calls.lock().unwrap(), 0);
    Ok(())
}

#[tokio::test]
async fn test_shifted_window_is_high_severity() -> Result<()> {
    let project = Project::new(|p| p.retraining.min_labeled_samples = 10_000)?;
    fill_log(project.log.as_ref(), 100, 5.0);
    let trainer = Arc::new(ObservingTrainer::new(project.log.path(), false, Duration::ZERO));
    let monitor = project.monitor(trainer);

    let report = monitor.check_drift(100).await;

    let summary = report.drift_summary.summary().unwrap();
    assert_eq!(summary.drift_ratio, 1.0);
    assert!(summary.min_p_value() < 0.001);
    assert_eq!(report.alert_report.severity(), Severity::High);
    assert_eq!(
        report.alert_report.alerts[0].recommended_action,
        "Retrain model immediately"
    );
    // Severe drift, but far below the label floor.
    assert_eq!(report.response_action.action, RetrainingAction::RetrainingSkipped);
    assert!(report.response_action.reason.contains("100 < 10000"));
    Ok(())
}

#[tokio::test]
async fn test_insufficient_labels_skip_retraining() -> Result<()> {
    let project = Project::new(|_| {})?;
    fill_log(project.log.as_ref(), 100, 0.0);
    let trainer = Arc::new(ObservingTrainer::new(project.log.path(), false, Duration::ZERO));
    let monitor = project.monitor(trainer.clone());

    let action = monitor.respond(0.5, AlertStatus::Alert).await;

    assert_eq!(action.action, RetrainingAction::RetrainingSkipped);
    assert!(action.reason.contains("100 < 500"), "reason: {}", action.reason);
    assert!(project.snapshots().is_empty());
    assert_eq!(*trainer.calls.lock().unwrap(), 0);
    Ok(())
}

#[tokio::test]
async fn test_enough_labels_trigger_one_retraining() -> Result<()> {
    let project = Project::new(|_| {})?;
    fill_log(project.log.as_ref(), 600, 0.0);
    let log_before = project.read(project.log.path());
    let trainer = Arc::new(ObservingTrainer::new(project.log.path(), false, Duration::ZERO));
    let monitor = project.monitor(trainer.clone());

    let action = monitor.respond(0.5, AlertStatus::Alert).await;

    assert_eq!(action.action, RetrainingAction::RetrainingTriggered);
    assert_eq!(project.snapshots().len(), 1);
    let snapshot = action.snapshot.clone().unwrap();
    assert_eq!(fs::read_to_string(&snapshot)?.lines().count(), 200);

    // The live log was untouched while the job ran, and pruned afterwards.
    assert_eq!(trainer.log_during_training.lock().unwrap().as_deref(), Some(&log_before[..]));
    assert!(project.log.is_empty()?);
    assert_eq!(monitor.accumulator().store().load()?.len(), 600);

    let job = action.job.unwrap();
    assert!(job.promoted());
    assert_eq!(job.tags["trigger"], "drift_detected");
    assert_eq!(monitor.registry().runs()?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_failed_job_leaves_state_byte_identical() -> Result<()> {
    let project = Project::new(|_| {})?;
    fill_log(project.log.as_ref(), 600, 0.0);
    let trainer = Arc::new(ObservingTrainer::new(project.log.path(), true, Duration::ZERO));
    let monitor = project.monitor(trainer);

    let log_before = project.read(project.log.path());
    let dataset_before = project.read(&project.policy.paths.accumulated);

    let action = monitor.respond(0.5, AlertStatus::Alert).await;

    assert_eq!(action.action, RetrainingAction::RetrainingFailed);
    assert!(action.reason.contains("diverged"));
    assert_eq!(project.read(project.log.path()), log_before);
    assert_eq!(project.read(&project.policy.paths.accumulated), dataset_before);
    assert_eq!(monitor.registry().production_metrics()?, None);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_triggers_launch_a_single_job() -> Result<()> {
    let project = Project::new(|_| {})?;
    fill_log(project.log.as_ref(), 600, 0.0);
    let trainer = Arc::new(ObservingTrainer::new(
        project.log.path(),
        false,
        Duration::from_millis(200),
    ));
    let monitor = project.monitor(trainer.clone());

    let (a, b) = tokio::join!(
        monitor.respond(0.9, AlertStatus::Alert),
        monitor.respond(0.9, AlertStatus::Alert)
    );

    let mut actions = vec![a.action, b.action];
    actions.sort_by_key(|a| a.to_string());
    assert_eq!(
        actions,
        vec![RetrainingAction::RetrainingSkipped, RetrainingAction::RetrainingTriggered]
    );
    let skipped = if a.action == RetrainingAction::RetrainingSkipped { a } else { b };
    assert_eq!(skipped.reason, "retraining already in progress");
    assert_eq!(*trainer.calls.lock().unwrap(), 1);
    assert_eq!(project.snapshots().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_monitors_sharing_a_project_launch_a_single_job() -> Result<()> {
    let project = Project::new(|_| {})?;
    fill_log(project.log.as_ref(), 600, 0.0);
    let trainer = Arc::new(ObservingTrainer::new(
        project.log.path(),
        false,
        Duration::from_millis(200),
    ));
    // Two monitors stand in for two processes: no in-memory gate is shared,
    // only the files.
    let first = project.monitor(trainer.clone());
    let second = project.monitor(trainer.clone());

    let (a, b) = tokio::join!(
        first.respond(0.9, AlertStatus::Alert),
        second.respond(0.9, AlertStatus::Alert)
    );

    assert_eq!(a.action, RetrainingAction::RetrainingTriggered);
    assert_eq!(b.action, RetrainingAction::RetrainingSkipped);
    assert_eq!(b.reason, "retraining already in progress");
    assert_eq!(*trainer.calls.lock().unwrap(), 1);
    assert_eq!(first.accumulator().store().load()?.len(), 600);

    // The lock is released with the run.
    fill_log(project.log.as_ref(), 600, 0.0);
    let again = second.respond(0.9, AlertStatus::Alert).await;
    assert_eq!(again.action, RetrainingAction::RetrainingTriggered);
    Ok(())
}

#[tokio::test]
async fn test_short_window_follows_policy() -> Result<()> {
    let strict = Project::new(|_| {})?;
    fill_log(strict.log.as_ref(), 30, 0.0);
    let trainer = Arc::new(ObservingTrainer::new(strict.log.path(), false, Duration::ZERO));
    let report = strict.monitor(trainer.clone()).check_drift(100).await;
    assert!(matches!(report.drift_summary, DriftOutcome::NoData { .. }));
    assert_eq!(report.response_action.action, RetrainingAction::NoAction);

    let partial = Project::new(|p| p.drift.short_window = ShortWindowPolicy::Partial)?;
    fill_log(partial.log.as_ref(), 30, 0.0);
    let report = partial.monitor(trainer).check_drift(100).await;
    assert_eq!(report.drift_summary.summary().unwrap().window_size, 30);

    let json = serde_json::to_value(&report)?;
    assert_eq!(json["drift_summary"]["status"], "ok");
    assert!(json["classifier"].is_object());
    Ok(())
}

#[tokio::test]
async fn test_open_requires_reference() -> Result<()> {
    let dir = tempdir()?;
    let err = DriftMonitor::open(dir.path()).err().unwrap();
    assert!(err.to_string().contains("Reference distribution not found"));

    let mut policy = BTreeMap::new();
    policy.insert("name", "credit");
    fs::write(dir.path().join("driftwatch.yaml"), serde_yaml::to_string(&policy)?)?;
    fs::write(
        dir.path().join("reference_stats.json"),
        serde_json::to_string(&reference())?,
    )?;
    let monitor = DriftMonitor::open(dir.path())?;
    assert_eq!(monitor.policy().name, "credit");
    assert_eq!(monitor.reference().features.len(), 4);
    Ok(())
}

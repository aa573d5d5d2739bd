// driftwatch/src/commands/log.rs
//
// USE CASE: Record one served prediction.

use std::path::PathBuf;

use anyhow::Context;
use driftwatch_core::domain::record::{FeatureMap, PredictionRecord};
use driftwatch_core::infrastructure::adapters::JsonlPredictionLog;
use driftwatch_core::infrastructure::config::load_policy;
use driftwatch_core::ports::prediction_log::PredictionLog;

pub async fn execute(
    project_dir: PathBuf,
    features: String,
    prediction: u8,
    probability: f64,
    label: Option<u8>,
) -> anyhow::Result<()> {
    if !(0.0..=1.0).contains(&probability) {
        anyhow::bail!("❌ --probability must be within [0, 1], got {}", probability);
    }
    let features: FeatureMap = serde_json::from_str(&features)
        .context("--features must be a JSON object of feature values")?;

    let policy = load_policy(&project_dir)?;
    let log = JsonlPredictionLog::new(&policy.paths.prediction_log);

    let mut record = PredictionRecord::new(features, prediction, probability);
    record.label = label;

    // Blocking append off the async runtime, like the serving hook.
    let path = log.path().to_path_buf();
    tokio::task::spawn_blocking(move || log.append(&record)).await??;

    println!("📝 Prediction logged to {}", path.display());
    Ok(())
}

// driftwatch/src/commands/status.rs
//
// USE CASE: Retraining readiness.

use std::path::PathBuf;
use std::sync::Arc;

use comfy_table::Table;
use comfy_table::presets::UTF8_FULL;
use driftwatch_core::application::{RetrainingDataAccumulator, retraining_status};
use driftwatch_core::infrastructure::adapters::{JsonlDatasetStore, JsonlPredictionLog};
use driftwatch_core::infrastructure::config::load_policy;

use crate::cli::OutputFormat;

pub fn execute(project_dir: PathBuf, format: OutputFormat) -> anyhow::Result<()> {
    let policy = load_policy(&project_dir)?;
    let accumulator = RetrainingDataAccumulator::new(
        Arc::new(JsonlPredictionLog::new(&policy.paths.prediction_log)),
        JsonlDatasetStore::new(&policy.paths.accumulated, &policy.paths.snapshots),
        policy.retraining.clone(),
    );
    let status = retraining_status(&accumulator, &policy.retraining)?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["", "Value"]);
    table.add_row(vec!["Status".to_string(), status.label().to_string()]);
    table.add_row(vec!["Labeled samples".to_string(), status.available.to_string()]);
    table.add_row(vec!["Required".to_string(), status.required.to_string()]);
    table.add_row(vec!["Snapshot window".to_string(), status.window.to_string()]);
    table.add_row(vec!["Snapshots".to_string(), status.snapshots.to_string()]);
    println!("{table}");

    if let Some(reason) = &status.waiting_reason {
        println!("⏳ {}", reason);
    }
    Ok(())
}

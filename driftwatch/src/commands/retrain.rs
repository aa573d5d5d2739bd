// driftwatch/src/commands/retrain.rs
//
// USE CASE: Operator-forced retraining.

use std::path::PathBuf;

use anyhow::Context;
use driftwatch_core::application::DriftMonitor;
use driftwatch_core::domain::retraining::RetrainingAction;

use crate::cli::OutputFormat;
use crate::commands::check::print_action;

pub async fn execute(project_dir: PathBuf, format: OutputFormat) -> anyhow::Result<()> {
    let monitor = DriftMonitor::open(&project_dir)
        .with_context(|| format!("Failed to open drift monitor in {:?}", project_dir))?;

    println!("🔁 Forcing retraining...");
    let action = monitor.force_retrain().await;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&action)?),
        OutputFormat::Table => print_action(&action),
    }

    if action.action == RetrainingAction::RetrainingFailed {
        // Exit with error code for CI/CD
        std::process::exit(1);
    }
    Ok(())
}

// driftwatch/src/commands/check.rs
//
// USE CASE: One drift check + retraining response.

use std::path::PathBuf;

use anyhow::Context;
use comfy_table::Table;
use comfy_table::presets::UTF8_FULL;
use driftwatch_core::application::{DriftCheckReport, DriftMonitor};
use driftwatch_core::domain::drift::{ClassifierOutcome, DriftOutcome};
use driftwatch_core::domain::retraining::ActionReport;

use crate::cli::OutputFormat;

pub async fn execute(
    project_dir: PathBuf,
    window: Option<usize>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let monitor = DriftMonitor::open(&project_dir)
        .with_context(|| format!("Failed to open drift monitor in {:?}", project_dir))?;
    let window = window.unwrap_or(monitor.policy().drift.window_size);

    let report = monitor.check_drift(window).await;
    print_report(&report, format)
}

pub fn print_report(report: &DriftCheckReport, format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    match &report.drift_summary {
        DriftOutcome::NoData { reason } => {
            println!("⏳ No data: {}", reason);
        }
        DriftOutcome::Ok(summary) => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_header(vec!["Feature", "KS statistic", "p-value", "Drift"]);
            for (feature, detail) in &summary.details {
                table.add_row(vec![
                    feature.clone(),
                    format!("{:.4}", detail.statistic),
                    format!("{:.3e}", detail.p_value),
                    (if detail.drift_detected { "⚠️ yes" } else { "no" }).to_string(),
                ]);
            }
            for feature in &summary.skipped_features {
                table.add_row(vec![feature.clone(), "-".into(), "-".into(), "skipped".into()]);
            }
            println!("{table}");
            println!(
                "📊 {} / {} features drifted (ratio {:.2}) over {} records",
                summary.drifted_features,
                summary.total_features_checked,
                summary.drift_ratio,
                summary.window_size
            );
            if summary.malformed_records > 0 {
                println!("   ⚠️  {} malformed log line(s) skipped", summary.malformed_records);
            }
        }
    }

    if let Some(ClassifierOutcome::Ok(c)) = &report.classifier {
        println!(
            "🤖 Classifier AUC {:.3} ({})",
            c.auc,
            if c.drift_detected { "drift" } else { "stable" }
        );
    }

    for alert in &report.alert_report.alerts {
        println!(
            "🚨 Severity {}: {}",
            alert.severity, alert.recommended_action
        );
    }
    print_action(&report.response_action);
    Ok(())
}

pub fn print_action(action: &ActionReport) {
    println!("➡️  Action: {} ({})", action.action, action.reason);
    if let Some(snapshot) = &action.snapshot {
        println!("   Snapshot: {}", snapshot.display());
    }
    if let Some(job) = &action.job {
        println!("   Run: {} [{:?}]", job.run_id, job.outcome);
        for (name, value) in &job.metrics {
            println!("     {name}: {value:.4}");
        }
        if let Some(promotion) = &job.promotion {
            println!(
                "   Promotion: {:?} ({}/{} metrics improved)",
                promotion.decision, promotion.wins, promotion.compared
            );
        }
    }
}

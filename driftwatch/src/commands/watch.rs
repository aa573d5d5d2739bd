// driftwatch/src/commands/watch.rs
//
// USE CASE: Scheduled drift checks.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use driftwatch_core::application::DriftMonitor;
use tracing::{info, warn};

use crate::cli::OutputFormat;
use crate::commands::check::print_report;

pub async fn execute(project_dir: PathBuf, interval: u64, iterations: Option<u64>) -> anyhow::Result<()> {
    if interval == 0 {
        anyhow::bail!("❌ --interval must be at least 1 second");
    }
    let monitor = DriftMonitor::open(&project_dir)
        .with_context(|| format!("Failed to open drift monitor in {:?}", project_dir))?;
    let window = monitor.policy().drift.window_size;

    println!("⏱️  Checking drift every {}s (window {})", interval, window);
    let mut ticker = tokio::time::interval(Duration::from_secs(interval));
    let mut done = 0u64;

    loop {
        ticker.tick().await;
        done += 1;
        info!(iteration = done, "Scheduled drift check");

        let report = monitor.check_drift(window).await;
        // A bad iteration is reported and polling goes on.
        if let Err(e) = print_report(&report, OutputFormat::Table) {
            warn!(error = %e, "Failed to render drift report");
        }

        if iterations.is_some_and(|max| done >= max) {
            break;
        }
    }
    Ok(())
}

// driftwatch/src/commands/inject_drift.rs
//
// USE CASE: Synthetic drift for demos and pipeline checks.

use std::path::PathBuf;

use driftwatch_core::application::{DriftInjection, DriftKind, inject_drift};
use driftwatch_core::infrastructure::adapters::JsonlPredictionLog;
use driftwatch_core::infrastructure::config::load_policy;

use crate::cli::DriftKindArg;

impl From<DriftKindArg> for DriftKind {
    fn from(kind: DriftKindArg) -> Self {
        match kind {
            DriftKindArg::Shift => DriftKind::Shift,
            DriftKindArg::Scale => DriftKind::Scale,
            DriftKindArg::Noise => DriftKind::Noise,
        }
    }
}

pub fn execute(
    project_dir: PathBuf,
    feature: String,
    kind: DriftKindArg,
    magnitude: f64,
    window: usize,
    seed: u64,
) -> anyhow::Result<()> {
    let policy = load_policy(&project_dir)?;
    let log = JsonlPredictionLog::new(&policy.paths.prediction_log);

    let injection = DriftInjection {
        feature,
        kind: kind.into(),
        magnitude,
        window,
        seed,
    };
    let appended = inject_drift(&log, &injection)?;

    println!(
        "💉 Appended {} drifted record(s) ({} x{} on '{}')",
        appended, injection.kind, injection.magnitude, injection.feature
    );
    Ok(())
}

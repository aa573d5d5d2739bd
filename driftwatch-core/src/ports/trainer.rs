// driftwatch-core/src/ports/trainer.rs

use async_trait::async_trait;
use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

use crate::domain::retraining::Metrics;

/// What a finished training run hands back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingReport {
    pub metrics: Metrics,
    pub artifact: Option<String>,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Error, Debug, Diagnostic)]
pub enum TrainingJobError {
    #[error("Failed to launch training job: {0}")]
    #[diagnostic(
        code(driftwatch::trainer::spawn),
        help("Check `retraining.command` in driftwatch.yaml.")
    )]
    Spawn(String),

    #[error("Training job exited with status {code:?}")]
    #[diagnostic(code(driftwatch::trainer::exit))]
    NonZeroExit {
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("Training job timed out after {0}s")]
    #[diagnostic(
        code(driftwatch::trainer::timeout),
        help("Raise `retraining.timeout_secs` or shrink the snapshot window.")
    )]
    TimedOut(u64),

    #[error("Training job failed: {0}")]
    #[diagnostic(code(driftwatch::trainer::failed))]
    Failed(String),
}

impl TrainingJobError {
    /// Captured process output, when the job got far enough to produce any.
    pub fn output(&self) -> (&str, &str) {
        match self {
            TrainingJobError::NonZeroExit { stdout, stderr, .. } => (stdout, stderr),
            _ => ("", ""),
        }
    }
}

/// Runs one training job on a snapshot file.
#[async_trait]
pub trait Trainer: Send + Sync {
    async fn train(&self, dataset: &Path) -> Result<TrainingReport, TrainingJobError>;
}

// driftwatch-core/src/infrastructure/adapters/command_trainer.rs

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{info, instrument, warn};

use crate::domain::retraining::Metrics;
use crate::ports::trainer::{Trainer, TrainingJobError, TrainingReport};

pub const DATASET_PLACEHOLDER: &str = "{dataset}";

/// Runs an external training program on a snapshot.
///
/// `{dataset}` in any argument is replaced by the snapshot path. The child is
/// killed if the future is dropped, which is how a timeout stops it.
#[derive(Debug, Clone)]
pub struct CommandTrainer {
    command: Vec<String>,
}

/// Optional last stdout line of a successful run.
#[derive(Debug, Deserialize)]
struct TrainerSummary {
    #[serde(default)]
    metrics: Metrics,
    #[serde(default)]
    artifact: Option<String>,
}

impl CommandTrainer {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    fn build(&self, dataset: &Path) -> Result<Command, TrainingJobError> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| TrainingJobError::Spawn("empty training command".to_string()))?;

        let dataset = dataset.to_string_lossy();
        let mut cmd = Command::new(program);
        cmd.args(args.iter().map(|a| a.replace(DATASET_PLACEHOLDER, &dataset)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        Ok(cmd)
    }
}

fn parse_summary(stdout: &str) -> Option<TrainerSummary> {
    let last = stdout.lines().rev().find(|l| !l.trim().is_empty())?;
    serde_json::from_str(last.trim()).ok()
}

#[async_trait]
impl Trainer for CommandTrainer {
    #[instrument(skip(self), fields(program = ?self.command.first()))]
    async fn train(&self, dataset: &Path) -> Result<TrainingReport, TrainingJobError> {
        let mut cmd = self.build(dataset)?;
        let output = cmd
            .output()
            .await
            .map_err(|e| TrainingJobError::Spawn(e.to_string()))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            warn!(code = ?output.status.code(), "Training command failed");
            return Err(TrainingJobError::NonZeroExit {
                code: output.status.code(),
                stdout,
                stderr,
            });
        }

        let (metrics, artifact) = match parse_summary(&stdout) {
            Some(summary) => (summary.metrics, summary.artifact),
            None => (Metrics::new(), None),
        };
        info!(metrics = metrics.len(), "Training command succeeded");

        Ok(TrainingReport {
            metrics,
            artifact,
            stdout,
            stderr,
        })
    }
}

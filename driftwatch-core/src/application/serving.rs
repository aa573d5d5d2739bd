// driftwatch-core/src/application/serving.rs

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::record::{FeatureMap, PredictionRecord};
use crate::ports::prediction_log::PredictionLog;

/// Serving-side hook. Logging must never slow down or fail an inference.
#[derive(Clone)]
pub struct PredictionLogger {
    log: Arc<dyn PredictionLog>,
}

impl PredictionLogger {
    pub fn new(log: Arc<dyn PredictionLog>) -> Self {
        Self { log }
    }

    /// Fire-and-forget append, stamped with the current time.
    ///
    /// Must be called from inside a tokio runtime. Failures are only logged;
    /// the handle lets callers wait for the write when they care.
    pub fn log_prediction(
        &self,
        features: FeatureMap,
        prediction: u8,
        probability: f64,
    ) -> JoinHandle<()> {
        self.log_record(PredictionRecord::new(features, prediction, probability))
    }

    pub fn log_record(&self, record: PredictionRecord) -> JoinHandle<()> {
        let log = Arc::clone(&self.log);
        tokio::task::spawn_blocking(move || match log.append(&record) {
            Ok(()) => debug!(prediction = record.prediction, "Prediction logged"),
            Err(e) => warn!(error = %e, "Failed to log prediction"),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::DriftwatchError;
    use crate::infrastructure::adapters::JsonlPredictionLog;
    use crate::ports::prediction_log::LogWindow;
    use anyhow::Result;
    use tempfile::tempdir;

    struct BrokenLog;

    impl PredictionLog for BrokenLog {
        fn append(&self, _record: &PredictionRecord) -> Result<(), DriftwatchError> {
            Err(std::io::Error::other("disk full").into())
        }
        fn tail(&self, _n: usize) -> Result<LogWindow, DriftwatchError> {
            Ok(LogWindow::default())
        }
        fn read_all(&self) -> Result<LogWindow, DriftwatchError> {
            Ok(LogWindow::default())
        }
        fn len(&self) -> Result<usize, DriftwatchError> {
            Ok(0)
        }
        fn truncate_prefix(&self, _lines: usize) -> Result<(), DriftwatchError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_log_prediction_appends() -> Result<()> {
        let dir = tempdir()?;
        let log = Arc::new(JsonlPredictionLog::new(dir.path().join("predictions.jsonl")));
        let logger = PredictionLogger::new(log.clone());

        let mut features = FeatureMap::new();
        features.insert("age".into(), 42.0.into());
        logger.log_prediction(features, 1, 1.7).await?;

        let window = log.read_all()?;
        assert_eq!(window.records.len(), 1);
        assert_eq!(window.records[0].probability, 1.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_failures_never_reach_the_caller() -> Result<()> {
        let logger = PredictionLogger::new(Arc::new(BrokenLog));
        logger.log_prediction(FeatureMap::new(), 0, 0.1).await?;
        Ok(())
    }
}

// driftwatch-core/src/ports/run_registry.rs

use crate::domain::retraining::{Metrics, RetrainingJob};
use crate::error::DriftwatchError;

/// History of training runs, used to find the metrics to beat.
pub trait RunRegistry: Send + Sync {
    fn record(&self, job: &RetrainingJob) -> Result<(), DriftwatchError>;

    /// Metrics of the latest promoted run, if any.
    fn production_metrics(&self) -> Result<Option<Metrics>, DriftwatchError>;

    fn runs(&self) -> Result<Vec<RetrainingJob>, DriftwatchError>;
}

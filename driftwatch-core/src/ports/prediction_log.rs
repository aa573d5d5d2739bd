// driftwatch-core/src/ports/prediction_log.rs

use crate::domain::error::DomainError;
use crate::domain::record::PredictionRecord;
use crate::error::DriftwatchError;

/// The newest records of the log plus what had to be dropped to read them.
#[derive(Debug, Default)]
pub struct LogWindow {
    /// Oldest first.
    pub records: Vec<PredictionRecord>,
    pub malformed: Vec<DomainError>,
    /// Complete lines scanned, malformed ones included. Passing this to
    /// `truncate_prefix` drops exactly what the caller has seen.
    pub lines: usize,
}

/// Append-only store of served predictions.
///
/// Calls are blocking; the serving path wraps them in `spawn_blocking`.
/// Implementations must make a concurrent reader see only complete records.
pub trait PredictionLog: Send + Sync {
    fn append(&self, record: &PredictionRecord) -> Result<(), DriftwatchError>;

    /// The last `n` well-formed records.
    fn tail(&self, n: usize) -> Result<LogWindow, DriftwatchError>;

    /// Every well-formed record, oldest first.
    fn read_all(&self) -> Result<LogWindow, DriftwatchError>;

    /// Complete lines currently in the log, malformed ones included.
    fn len(&self) -> Result<usize, DriftwatchError>;

    fn is_empty(&self) -> Result<bool, DriftwatchError> {
        Ok(self.len()? == 0)
    }

    /// Drops the first `lines` complete lines. Lines appended after the caller
    /// read the log survive.
    fn truncate_prefix(&self, lines: usize) -> Result<(), DriftwatchError>;
}

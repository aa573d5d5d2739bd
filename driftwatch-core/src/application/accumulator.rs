// driftwatch-core/src/application/accumulator.rs

use fd_lock::RwLock;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::domain::dataset::{self, LabeledSample};
use crate::domain::error::DomainError;
use crate::domain::policy::RetrainingSettings;
use crate::error::DriftwatchError;
use crate::infrastructure::adapters::JsonlDatasetStore;
use crate::infrastructure::fs::{lock_path, open_lock};
use crate::ports::prediction_log::PredictionLog;

/// A snapshot written to disk whose merge has not been made durable yet.
///
/// Dropping it without `commit` leaves the log and the accumulated dataset
/// untouched; only the snapshot file remains.
#[derive(Debug)]
#[must_use = "a staged retraining does nothing until committed"]
pub struct StagedRetraining {
    pub snapshot: PathBuf,
    /// Rows in the snapshot.
    pub rows: usize,
    /// Log records merged that were not in the dataset yet.
    pub added: usize,
    merged: Vec<LabeledSample>,
    consumed_log_lines: usize,
}

/// Owns the accumulated retraining dataset and its snapshots.
#[derive(Clone)]
pub struct RetrainingDataAccumulator {
    log: Arc<dyn PredictionLog>,
    store: JsonlDatasetStore,
    settings: RetrainingSettings,
}

impl RetrainingDataAccumulator {
    pub fn new(
        log: Arc<dyn PredictionLog>,
        store: JsonlDatasetStore,
        settings: RetrainingSettings,
    ) -> Self {
        Self {
            log,
            store,
            settings,
        }
    }

    pub fn store(&self) -> &JsonlDatasetStore {
        &self.store
    }

    /// Advisory lock shared by every process working on this dataset. Hold
    /// its write guard from `stage` through `commit`, or a concurrent commit
    /// could prune log lines this run never merged.
    pub fn open_retraining_lock(&self) -> Result<RwLock<File>, DriftwatchError> {
        Ok(open_lock(&lock_path(self.store.accumulated_path()))?)
    }

    /// Size of the dataset a merge would produce right now. Read-only.
    pub fn available_samples(&self) -> Result<usize, DriftwatchError> {
        let existing = self.store.load()?;
        let log = self.log.read_all()?;
        Ok(dataset::merged_len(&existing, &log.records))
    }

    /// Merges the log into the dataset in memory and writes the newest
    /// `window_size` rows to a fresh snapshot.
    #[instrument(skip(self))]
    pub fn stage(&self, window_size: usize) -> Result<StagedRetraining, DriftwatchError> {
        // 1. Current state
        let existing = self.store.load()?;
        let log = self.log.read_all()?;

        // 2. Merge (dedup by fingerprint)
        let merge = dataset::merge(existing, &log.records);
        if merge.rows.len() < window_size {
            return Err(DomainError::InsufficientData {
                available: merge.rows.len(),
                required: window_size,
            }
            .into());
        }

        // 3. Snapshot of the most recent rows
        let window = &merge.rows[merge.rows.len() - window_size..];
        let snapshot = self.store.write_snapshot(window)?;

        info!(
            snapshot = ?snapshot,
            rows = window_size,
            added = merge.added,
            relabeled = merge.relabeled,
            "Retraining data staged"
        );

        Ok(StagedRetraining {
            snapshot,
            rows: window_size,
            added: merge.added,
            merged: merge.rows,
            consumed_log_lines: log.lines,
        })
    }

    /// Makes a staged merge durable, then prunes the log lines it consumed.
    #[instrument(skip(self, staged), fields(snapshot = ?staged.snapshot))]
    pub fn commit(&self, staged: StagedRetraining) -> Result<PathBuf, DriftwatchError> {
        let mut merged = staged.merged;
        dataset::cap(&mut merged, self.settings.max_accumulated_rows);
        self.store.persist(&merged)?;

        if self.settings.clear_log_on_success {
            self.log.truncate_prefix(staged.consumed_log_lines)?;
            info!(lines = staged.consumed_log_lines, "Merged log records cleared");
        }
        Ok(staged.snapshot)
    }

    /// Stage then commit in one go, for operator-driven runs outside the trigger path.
    pub fn accumulate(&self, window_size: usize) -> Result<PathBuf, DriftwatchError> {
        let mut lock = self.open_retraining_lock()?;
        let _held = lock.write()?;
        let staged = self.stage(window_size)?;
        self.commit(staged)
    }

    pub fn snapshots(&self) -> Vec<PathBuf> {
        self.store.list_snapshots()
    }
}

// driftwatch-core/src/infrastructure/adapters/dataset.rs

use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::domain::dataset::LabeledSample;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs::{atomic_write, create_new, read_jsonl, to_jsonl};

pub const SNAPSHOT_PREFIX: &str = "retrain_data_";
const SNAPSHOT_ATTEMPTS: usize = 16;

/// Accumulated dataset file plus the directory of immutable snapshots.
#[derive(Debug, Clone)]
pub struct JsonlDatasetStore {
    accumulated: PathBuf,
    snapshots: PathBuf,
}

impl JsonlDatasetStore {
    pub fn new(accumulated: impl Into<PathBuf>, snapshots: impl Into<PathBuf>) -> Self {
        Self {
            accumulated: accumulated.into(),
            snapshots: snapshots.into(),
        }
    }

    pub fn accumulated_path(&self) -> &Path {
        &self.accumulated
    }

    /// The accumulated rows, or an empty dataset on first use.
    pub fn load(&self) -> Result<Vec<LabeledSample>, InfrastructureError> {
        read_jsonl(&self.accumulated)
    }

    pub fn persist(&self, rows: &[LabeledSample]) -> Result<(), InfrastructureError> {
        atomic_write(&self.accumulated, to_jsonl(rows)?)?;
        info!(rows = rows.len(), path = ?self.accumulated, "Accumulated dataset saved");
        Ok(())
    }

    /// Writes `rows` to a fresh `retrain_data_{timestamp}.jsonl`. Never
    /// overwrites: a name collision moves to the next microsecond.
    pub fn write_snapshot(&self, rows: &[LabeledSample]) -> Result<PathBuf, InfrastructureError> {
        let content = to_jsonl(rows)?;
        let mut stamp = Utc::now();

        for _ in 0..SNAPSHOT_ATTEMPTS {
            let name = format!("{}{}.jsonl", SNAPSHOT_PREFIX, stamp.format("%Y%m%d_%H%M%S_%6f"));
            let path = self.snapshots.join(name);
            match create_new(&path, &content) {
                Ok(()) => {
                    info!(rows = rows.len(), path = ?path, "Retraining snapshot written");
                    return Ok(path);
                }
                Err(InfrastructureError::Io(e)) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!(path = ?path, "Snapshot name taken, retrying");
                    stamp += chrono::Duration::microseconds(1);
                }
                Err(e) => return Err(e),
            }
        }
        Err(InfrastructureError::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            "could not find a free snapshot name",
        )))
    }

    /// Snapshot files, oldest first (names sort chronologically).
    pub fn list_snapshots(&self) -> Vec<PathBuf> {
        let mut found: Vec<PathBuf> = WalkDir::new(&self.snapshots)
            .max_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                let name = e.file_name().to_string_lossy();
                name.starts_with(SNAPSHOT_PREFIX) && name.ends_with(".jsonl")
            })
            .map(|e| e.into_path())
            .collect();
        found.sort();
        found
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::record::{FeatureMap, PredictionRecord};
    use anyhow::Result;
    use tempfile::tempdir;

    fn rows(n: usize) -> Vec<LabeledSample> {
        (0..n)
            .map(|i| {
                let mut features = FeatureMap::new();
                features.insert("x".into(), (i as f64).into());
                LabeledSample::from_record(&PredictionRecord::new(features, 0, 0.1))
            })
            .collect()
    }

    #[test]
    fn test_load_bootstraps_empty_dataset() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonlDatasetStore::new(dir.path().join("acc.jsonl"), dir.path().join("snaps"));
        assert!(store.load()?.is_empty());
        assert!(store.list_snapshots().is_empty());
        Ok(())
    }

    #[test]
    fn test_persist_and_reload() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonlDatasetStore::new(dir.path().join("data/acc.jsonl"), dir.path().join("snaps"));
        let data = rows(4);
        store.persist(&data)?;
        assert_eq!(store.load()?, data);
        Ok(())
    }

    #[test]
    fn test_snapshots_never_collide() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonlDatasetStore::new(dir.path().join("acc.jsonl"), dir.path().join("snaps"));

        let paths: Vec<PathBuf> = (0..5).map(|_| store.write_snapshot(&rows(2)).unwrap()).collect();

        let mut unique = paths.clone();
        unique.dedup();
        assert_eq!(unique.len(), 5);
        assert_eq!(store.list_snapshots().len(), 5);
        let name = paths[0].file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("retrain_data_"));
        assert_eq!(name.len(), "retrain_data_20240101_000000_000000.jsonl".len());
        Ok(())
    }
}

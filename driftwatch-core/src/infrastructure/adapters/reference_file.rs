// driftwatch-core/src/infrastructure/adapters/reference_file.rs

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use crate::domain::reference::ReferenceDistribution;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs::atomic_write;

/// Reference distribution persisted as a single JSON document.
#[derive(Debug, Clone)]
pub struct JsonReferenceStore {
    path: PathBuf,
}

impl JsonReferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[instrument(skip(self), fields(path = ?self.path))]
    pub fn load(&self) -> Result<ReferenceDistribution, InfrastructureError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(InfrastructureError::ReferenceMissing(self.path.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        let reference: ReferenceDistribution = serde_json::from_str(&content)?;
        info!(
            generation = %reference.generation,
            features = reference.features.len(),
            "Reference distribution loaded"
        );
        Ok(reference)
    }

    /// Swaps in a new generation. Concurrent readers keep the old file until the rename.
    pub fn replace(&self, reference: &ReferenceDistribution) -> Result<(), InfrastructureError> {
        let json = serde_json::to_string_pretty(reference)?;
        atomic_write(&self.path, json)?;
        info!(generation = %reference.generation, path = ?self.path, "Reference distribution replaced");
        Ok(())
    }
}

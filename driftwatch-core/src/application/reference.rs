// driftwatch-core/src/application/reference.rs

use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{info, instrument};

use crate::domain::error::DomainError;
use crate::domain::record::FeatureMap;
use crate::domain::reference::ReferenceDistribution;
use crate::error::DriftwatchError;
use crate::infrastructure::adapters::JsonReferenceStore;
use crate::infrastructure::error::InfrastructureError;

/// Builds a reference distribution from training rows (JSONL).
///
/// A row is either a flat object of features or a prediction-log record with
/// a `features` object. Columns named in `exclude` (targets, ids) are ignored.
#[instrument(skip(exclude))]
pub fn build_reference(
    training_rows: &Path,
    generation: &str,
    exclude: &[String],
) -> Result<ReferenceDistribution, DriftwatchError> {
    let content = fs::read_to_string(training_rows)?;

    let mut rows: Vec<FeatureMap> = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let corrupted = |reason: String| InfrastructureError::Corrupted {
            path: training_rows.to_path_buf(),
            line: idx + 1,
            reason,
        };
        let value: Value = serde_json::from_str(line).map_err(|e| corrupted(e.to_string()))?;
        let object = match value {
            Value::Object(mut map) => match map.remove("features") {
                Some(Value::Object(features)) => features,
                Some(other) => {
                    map.insert("features".to_string(), other);
                    map
                }
                None => map,
            },
            _ => return Err(corrupted("expected a JSON object".to_string()).into()),
        };
        let row: FeatureMap = object
            .into_iter()
            .filter(|(name, _)| !exclude.contains(name))
            .map(|(name, value)| (name, value.into()))
            .collect();
        rows.push(row);
    }

    let reference = ReferenceDistribution::from_rows(generation, &rows);
    if reference.is_empty() {
        return Err(DomainError::NoData(format!(
            "no numeric feature found in {:?}",
            training_rows
        ))
        .into());
    }
    info!(
        rows = rows.len(),
        features = reference.features.len(),
        "Reference distribution built"
    );
    Ok(reference)
}

/// Builds and atomically installs a new reference generation.
pub fn rebuild_reference(
    store: &JsonReferenceStore,
    training_rows: &Path,
    generation: &str,
    exclude: &[String],
) -> Result<ReferenceDistribution, DriftwatchError> {
    let reference = build_reference(training_rows, generation, exclude)?;
    store.replace(&reference)?;
    Ok(reference)
}

// driftwatch-core/src/domain/dataset.rs
//
// Accumulated retraining dataset: merge rules only, no I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::domain::record::{FeatureMap, PredictionRecord, fingerprint};

/// Threshold used when a label has to be synthesized from the served probability.
pub const SYNTHETIC_LABEL_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelSource {
    GroundTruth,
    /// Approximation: the model's own decision at 0.5. Marked so trainers can
    /// weight or filter these rows.
    Synthesized,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledSample {
    pub timestamp: DateTime<Utc>,
    pub features: FeatureMap,
    pub prediction: u8,
    pub probability: f64,
    pub label: u8,
    pub label_source: LabelSource,
}

impl LabeledSample {
    pub fn from_record(record: &PredictionRecord) -> Self {
        let (label, label_source) = match record.label {
            Some(label) => (label, LabelSource::GroundTruth),
            None => (
                u8::from(record.probability >= SYNTHETIC_LABEL_THRESHOLD),
                LabelSource::Synthesized,
            ),
        };
        Self {
            timestamp: record.timestamp,
            features: record.features.clone(),
            prediction: record.prediction,
            probability: record.probability,
            label,
            label_source,
        }
    }

    pub fn fingerprint(&self) -> String {
        fingerprint(&self.timestamp, &self.features, self.prediction, self.probability)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// Existing rows plus new ones, ordered by timestamp (oldest first).
    pub rows: Vec<LabeledSample>,
    pub added: usize,
    /// Synthesized rows whose ground-truth label arrived in this batch.
    pub relabeled: usize,
}

/// Merges log records into the accumulated rows. A record already present
/// (same fingerprint) is not added twice, including duplicates inside `records`.
///
/// A labeled record matching a `Synthesized` row upgrades that row to its
/// ground-truth label. Ground-truth rows are never overwritten.
pub fn merge(existing: Vec<LabeledSample>, records: &[PredictionRecord]) -> MergeOutcome {
    let mut index: HashMap<String, usize> = existing
        .iter()
        .enumerate()
        .map(|(i, row)| (row.fingerprint(), i))
        .collect();
    let mut rows = existing;
    let before = rows.len();
    let mut relabeled = 0;

    for record in records {
        let key = record.fingerprint();
        match index.get(&key) {
            Some(&i) => {
                let row = &mut rows[i];
                if let Some(label) = record.label
                    && row.label_source == LabelSource::Synthesized
                {
                    row.label = label;
                    row.label_source = LabelSource::GroundTruth;
                    relabeled += 1;
                }
            }
            None => {
                index.insert(key, rows.len());
                rows.push(LabeledSample::from_record(record));
            }
        }
    }
    let added = rows.len() - before;
    rows.sort_by_key(|r| r.timestamp);

    MergeOutcome {
        rows,
        added,
        relabeled,
    }
}

/// Number of rows `merge` would produce, without building them.
pub fn merged_len(existing: &[LabeledSample], records: &[PredictionRecord]) -> usize {
    let mut seen: HashSet<String> = existing.iter().map(LabeledSample::fingerprint).collect();
    let new = records
        .iter()
        .filter(|r| seen.insert(r.fingerprint()))
        .count();
    existing.len() + new
}

/// Keeps the newest `max` rows. Rows must be ordered oldest first.
pub fn cap(rows: &mut Vec<LabeledSample>, max: Option<usize>) {
    if let Some(max) = max
        && rows.len() > max
    {
        rows.drain(..rows.len() - max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::FeatureValue;
    use chrono::Duration;

    fn record(offset_secs: i64, x: f64, probability: f64, label: Option<u8>) -> PredictionRecord {
        let base = DateTime::parse_from_rfc3339("2024-03-01T00:00:00Z")
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_default();
        PredictionRecord {
            timestamp: base + Duration::seconds(offset_secs),
            features: [("x".to_string(), FeatureValue::Number(x))].into_iter().collect(),
            prediction: u8::from(probability >= 0.5),
            probability,
            label,
        }
    }

    #[test]
    fn test_labels_prefer_ground_truth() {
        let truth = LabeledSample::from_record(&record(0, 1.0, 0.9, Some(0)));
        assert_eq!(truth.label, 0);
        assert_eq!(truth.label_source, LabelSource::GroundTruth);

        let synthetic = LabeledSample::from_record(&record(0, 1.0, 0.9, None));
        assert_eq!(synthetic.label, 1);
        assert_eq!(synthetic.label_source, LabelSource::Synthesized);

        let low = LabeledSample::from_record(&record(0, 1.0, 0.2, None));
        assert_eq!(low.label, 0);
    }

    #[test]
    fn test_merge_deduplicates_and_orders() {
        let existing = vec![LabeledSample::from_record(&record(10, 1.0, 0.4, None))];
        let records = vec![
            record(10, 1.0, 0.4, None), // already merged
            record(5, 2.0, 0.6, None),
            record(20, 3.0, 0.7, None),
            record(20, 3.0, 0.7, None), // duplicate inside the batch
        ];

        assert_eq!(merged_len(&existing, &records), 3);
        let outcome = merge(existing, &records);
        assert_eq!(outcome.added, 2);
        assert_eq!(outcome.rows.len(), 3);
        let xs: Vec<f64> = outcome
            .rows
            .iter()
            .filter_map(|r| r.features["x"].as_number())
            .collect();
        assert_eq!(xs, vec![2.0, 1.0, 3.0]);
    }

    #[test]
    fn test_cap_keeps_newest() {
        let mut rows: Vec<LabeledSample> = (0..5)
            .map(|i| LabeledSample::from_record(&record(i, i as f64, 0.5, None)))
            .collect();
        cap(&mut rows, Some(2));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].features["x"].as_number(), Some(3.0));

        cap(&mut rows, None);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_late_ground_truth_replaces_synthesized_label() {
        let existing = vec![
            LabeledSample::from_record(&record(0, 1.0, 0.9, None)),
            LabeledSample::from_record(&record(1, 2.0, 0.9, Some(1))),
        ];
        let records = vec![
            record(0, 1.0, 0.9, Some(0)), // label resolved after the merge
            record(1, 2.0, 0.9, Some(0)), // ground truth is not rewritten
        ];

        let outcome = merge(existing, &records);

        assert_eq!((outcome.added, outcome.relabeled), (0, 1));
        assert_eq!(outcome.rows[0].label, 0);
        assert_eq!(outcome.rows[0].label_source, LabelSource::GroundTruth);
        assert_eq!(outcome.rows[1].label, 1);
    }
}

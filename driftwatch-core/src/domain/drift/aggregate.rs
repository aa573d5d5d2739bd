// driftwatch-core/src/domain/drift/aggregate.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::drift::ks::{Comparison, DriftFeatureReport, KolmogorovSmirnov};
use crate::domain::policy::{DriftSettings, ShortWindowPolicy};
use crate::domain::record::PredictionRecord;
use crate::domain::reference::ReferenceDistribution;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriftSummary {
    pub window_size: usize,
    pub total_features_checked: usize,
    pub drifted_features: usize,
    /// `drifted_features / total_features_checked`, 0 when nothing was checked.
    pub drift_ratio: f64,
    pub details: BTreeMap<String, DriftFeatureReport>,
    /// Shared features with too few current values to test.
    #[serde(default)]
    pub skipped_features: Vec<String>,
    /// Log lines that could not be decoded and were left out of the window.
    #[serde(default)]
    pub malformed_records: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,
}

impl DriftSummary {
    /// Smallest p-value over tested features; 1.0 when none was tested.
    pub fn min_p_value(&self) -> f64 {
        self.details
            .values()
            .map(|r| r.p_value)
            .fold(1.0, f64::min)
    }
}

/// Result of one aggregation. `NoData` means "insufficient evidence, defer";
/// it is a normal outcome, not a failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DriftOutcome {
    NoData { reason: String },
    Ok(DriftSummary),
}

impl DriftOutcome {
    pub fn no_data(reason: impl Into<String>) -> Self {
        DriftOutcome::NoData {
            reason: reason.into(),
        }
    }

    pub fn summary(&self) -> Option<&DriftSummary> {
        match self {
            DriftOutcome::Ok(summary) => Some(summary),
            DriftOutcome::NoData { .. } => None,
        }
    }
}

/// Runs the comparator over every feature shared by the reference and a
/// window of the prediction log.
pub struct DriftAggregator<'a> {
    settings: &'a DriftSettings,
}

impl<'a> DriftAggregator<'a> {
    pub fn new(settings: &'a DriftSettings) -> Self {
        Self { settings }
    }

    /// `window` holds the most recent records, oldest first. `requested` is the
    /// window size the caller asked for; `malformed` counts log lines the
    /// reader had to drop.
    pub fn aggregate(
        &self,
        reference: &ReferenceDistribution,
        window: &[PredictionRecord],
        requested: usize,
        malformed: usize,
    ) -> DriftOutcome {
        if window.is_empty() {
            return DriftOutcome::no_data("prediction log is empty");
        }
        if window.len() < requested && self.settings.short_window == ShortWindowPolicy::NoData {
            return DriftOutcome::no_data(format!(
                "window holds {} records, {} requested",
                window.len(),
                requested
            ));
        }

        let current = numeric_columns(window);
        let comparator = KolmogorovSmirnov::new(self.settings.alpha, self.settings.min_samples);

        let mut details = BTreeMap::new();
        let mut skipped_features = Vec::new();
        for (feature, values) in &current {
            let Some(reference_sample) = reference.sample(feature) else {
                continue;
            };
            match comparator.compare(reference_sample, values) {
                Comparison::Tested(report) => {
                    details.insert(feature.clone(), report);
                }
                Comparison::Skipped { .. } => skipped_features.push(feature.clone()),
            }
        }

        let total = details.len();
        let drifted = details.values().filter(|r| r.drift_detected).count();
        let drift_ratio = if total == 0 {
            0.0
        } else {
            drifted as f64 / total as f64
        };

        let time_range = match (
            window.iter().map(|r| r.timestamp).min(),
            window.iter().map(|r| r.timestamp).max(),
        ) {
            (Some(from), Some(to)) => Some(TimeRange { from, to }),
            _ => None,
        };

        DriftOutcome::Ok(DriftSummary {
            window_size: window.len(),
            total_features_checked: total,
            drifted_features: drifted,
            drift_ratio,
            details,
            skipped_features,
            malformed_records: malformed,
            time_range,
        })
    }
}

/// Numeric values per feature. Extraction is per value: a text or null field
/// never discards the rest of its record.
fn numeric_columns(window: &[PredictionRecord]) -> BTreeMap<String, Vec<f64>> {
    let mut columns: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for record in window {
        for (name, value) in &record.features {
            if let Some(v) = value.as_number() {
                columns.entry(name.clone()).or_default().push(v);
            }
        }
    }
    columns
}

// driftwatch-core/src/domain/reference.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::record::FeatureMap;

/// Finite numeric values observed for one feature.
pub type FeatureSample = Vec<f64>;

/// Per-feature samples captured at training time for one model generation.
/// Never mutated; a promoted model replaces the whole distribution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceDistribution {
    pub generation: String,
    pub created_at: DateTime<Utc>,
    pub features: BTreeMap<String, FeatureSample>,
}

impl ReferenceDistribution {
    /// Builds a reference from training rows. Non-numeric values are dropped
    /// per value, and features left with no values are not monitored.
    pub fn from_rows<'a, I>(generation: &str, rows: I) -> Self
    where
        I: IntoIterator<Item = &'a FeatureMap>,
    {
        let mut features: BTreeMap<String, FeatureSample> = BTreeMap::new();
        for row in rows {
            for (name, value) in row {
                if let Some(v) = value.as_number() {
                    features.entry(name.clone()).or_default().push(v);
                }
            }
        }
        features.retain(|_, values| !values.is_empty());

        Self {
            generation: generation.to_string(),
            created_at: Utc::now(),
            features,
        }
    }

    pub fn sample(&self, feature: &str) -> Option<&[f64]> {
        self.features.get(feature).map(Vec::as_slice)
    }

    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.features.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

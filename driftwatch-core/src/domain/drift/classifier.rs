// driftwatch-core/src/domain/drift/classifier.rs
//
// Population-level drift: if a classifier can tell reference rows from
// current rows better than chance, the joint distribution has moved.
// Secondary signal only; per-feature KS drives the decision path.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::domain::policy::ClassifierSettings;
use crate::domain::record::PredictionRecord;
use crate::domain::reference::ReferenceDistribution;

const TOP_FEATURES: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureWeight {
    pub feature: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassifierDriftReport {
    pub auc: f64,
    pub drift_detected: bool,
    /// Rows drawn from each population.
    pub sample_size: usize,
    pub features: Vec<String>,
    pub top_drift_features: Vec<FeatureWeight>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClassifierOutcome {
    NoData { reason: String },
    Ok(ClassifierDriftReport),
}

pub struct ClassifierDriftTest<'a> {
    settings: &'a ClassifierSettings,
}

impl<'a> ClassifierDriftTest<'a> {
    pub fn new(settings: &'a ClassifierSettings) -> Self {
        Self { settings }
    }

    pub fn evaluate(
        &self,
        reference: &ReferenceDistribution,
        window: &[PredictionRecord],
    ) -> ClassifierOutcome {
        let features: Vec<String> = reference
            .feature_names()
            .filter(|name| window.iter().any(|r| r.features.contains_key(*name)))
            .map(String::from)
            .collect();

        if features.is_empty() {
            return no_data("no numeric feature shared by reference and window");
        }

        let mut reference_rows = reference_rows(reference, &features);
        let mut current_rows = current_rows(window, &features);

        let size = reference_rows
            .len()
            .min(current_rows.len())
            .min(self.settings.max_samples);
        if size < self.settings.min_samples {
            return no_data(&format!(
                "{} complete rows per population, need {}",
                size, self.settings.min_samples
            ));
        }

        let mut rng = StdRng::seed_from_u64(self.settings.seed);
        reference_rows.shuffle(&mut rng);
        current_rows.shuffle(&mut rng);
        reference_rows.truncate(size);
        current_rows.truncate(size);

        let labels: Vec<f64> = std::iter::repeat_n(0.0, size)
            .chain(std::iter::repeat_n(1.0, size))
            .collect();
        let design = expand(standardize(
            reference_rows.into_iter().chain(current_rows).collect(),
        ));

        let model = LogisticModel::fit(&design, &labels, self.settings);
        let scores: Vec<f64> = design.iter().map(|row| model.score(row)).collect();
        let auc = roc_auc(&scores, &labels);

        let mut weights: Vec<FeatureWeight> = features
            .iter()
            .enumerate()
            .map(|(i, name)| FeatureWeight {
                feature: name.clone(),
                weight: model.weights[2 * i].abs() + model.weights[2 * i + 1].abs(),
            })
            .collect();
        weights.sort_by(|a, b| b.weight.partial_cmp(&a.weight).unwrap_or(Ordering::Equal));
        weights.truncate(TOP_FEATURES);

        ClassifierOutcome::Ok(ClassifierDriftReport {
            auc,
            drift_detected: auc > self.settings.auc_threshold,
            sample_size: size,
            features,
            top_drift_features: weights,
        })
    }
}

fn no_data(reason: &str) -> ClassifierOutcome {
    ClassifierOutcome::NoData {
        reason: reason.to_string(),
    }
}

/// Reference samples are stored per feature, so rows are formed by index
/// up to the shortest sample.
fn reference_rows(reference: &ReferenceDistribution, features: &[String]) -> Vec<Vec<f64>> {
    let samples: Vec<&[f64]> = features
        .iter()
        .filter_map(|f| reference.sample(f))
        .collect();
    let len = samples.iter().map(|s| s.len()).min().unwrap_or(0);
    (0..len)
        .map(|i| samples.iter().map(|s| s[i]).collect())
        .collect()
}

/// Records missing any of the features, or holding a non-numeric value, are dropped.
fn current_rows(window: &[PredictionRecord], features: &[String]) -> Vec<Vec<f64>> {
    window
        .iter()
        .filter_map(|record| {
            features
                .iter()
                .map(|f| record.features.get(f).and_then(|v| v.as_number()))
                .collect::<Option<Vec<f64>>>()
        })
        .collect()
}

fn standardize(mut rows: Vec<Vec<f64>>) -> Vec<Vec<f64>> {
    let Some(width) = rows.first().map(Vec::len) else {
        return rows;
    };
    let n = rows.len() as f64;
    for col in 0..width {
        let mean = rows.iter().map(|r| r[col]).sum::<f64>() / n;
        let var = rows.iter().map(|r| (r[col] - mean).powi(2)).sum::<f64>() / n;
        let std = if var.sqrt() > 1e-12 { var.sqrt() } else { 1.0 };
        for row in rows.iter_mut() {
            row[col] = (row[col] - mean) / std;
        }
    }
    rows
}

/// Adds a squared term per feature so scale changes are separable too.
fn expand(rows: Vec<Vec<f64>>) -> Vec<Vec<f64>> {
    rows.into_iter()
        .map(|row| row.iter().flat_map(|&z| [z, z * z]).collect())
        .collect()
}

struct LogisticModel {
    weights: Vec<f64>,
    bias: f64,
}

impl LogisticModel {
    /// Full-batch gradient descent with L2 penalty. No randomness involved.
    fn fit(x: &[Vec<f64>], y: &[f64], settings: &ClassifierSettings) -> Self {
        let width = x.first().map(Vec::len).unwrap_or(0);
        let n = x.len() as f64;
        let mut model = Self {
            weights: vec![0.0; width],
            bias: 0.0,
        };

        for _ in 0..settings.epochs {
            let mut grad_w = vec![0.0; width];
            let mut grad_b = 0.0;
            for (row, &target) in x.iter().zip(y) {
                let err = sigmoid(model.score(row)) - target;
                for (g, v) in grad_w.iter_mut().zip(row) {
                    *g += err * v;
                }
                grad_b += err;
            }
            for (w, g) in model.weights.iter_mut().zip(&grad_w) {
                *w -= settings.learning_rate * (g / n + settings.l2 * *w);
            }
            model.bias -= settings.learning_rate * grad_b / n;
        }
        model
    }

    fn score(&self, row: &[f64]) -> f64 {
        self.bias + self.weights.iter().zip(row).map(|(w, v)| w * v).sum::<f64>()
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Area under the ROC curve through the Mann-Whitney U statistic, ties
/// receiving their average rank. `labels` are 0.0 / 1.0.
pub fn roc_auc(scores: &[f64], labels: &[f64]) -> f64 {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].partial_cmp(&scores[b]).unwrap_or(Ordering::Equal));

    let mut ranks = vec![0.0; scores.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // 1-based ranks i+1 ..= j+1 share their mean.
        let avg = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg;
        }
        i = j + 1;
    }

    let positives = labels.iter().filter(|&&l| l > 0.5).count() as f64;
    let negatives = labels.len() as f64 - positives;
    if positives == 0.0 || negatives == 0.0 {
        return 0.5;
    }
    let rank_sum: f64 = ranks
        .iter()
        .zip(labels)
        .filter(|(_, l)| **l > 0.5)
        .map(|(r, _)| r)
        .sum();
    (rank_sum - positives * (positives + 1.0) / 2.0) / (positives * negatives)
}

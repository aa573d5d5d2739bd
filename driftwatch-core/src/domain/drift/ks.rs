// driftwatch-core/src/domain/drift/ks.rs

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Per-feature result of a two-sample test.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriftFeatureReport {
    pub p_value: f64,
    /// KS statistic: largest gap between the two empirical CDFs.
    pub statistic: f64,
    pub drift_detected: bool,
    pub reference_size: usize,
    pub current_size: usize,
}

/// A feature with too few current values carries no evidence either way,
/// so it is `Skipped` rather than reported as stable.
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    Skipped { current_size: usize, min_samples: usize },
    Tested(DriftFeatureReport),
}

/// Two-sample Kolmogorov-Smirnov test. Distribution-free: only assumes
/// numeric, i.i.d. values within each sample.
#[derive(Debug, Clone, Copy)]
pub struct KolmogorovSmirnov {
    alpha: f64,
    min_samples: usize,
}

impl KolmogorovSmirnov {
    pub fn new(alpha: f64, min_samples: usize) -> Self {
        Self { alpha, min_samples }
    }

    pub fn compare(&self, reference: &[f64], current: &[f64]) -> Comparison {
        let reference = finite_sorted(reference);
        let current = finite_sorted(current);

        if current.len() < self.min_samples || reference.is_empty() {
            return Comparison::Skipped {
                current_size: current.len(),
                min_samples: self.min_samples,
            };
        }

        let statistic = ks_statistic(&reference, &current);
        let p_value = ks_p_value(statistic, reference.len(), current.len());

        Comparison::Tested(DriftFeatureReport {
            p_value,
            statistic,
            drift_detected: p_value < self.alpha,
            reference_size: reference.len(),
            current_size: current.len(),
        })
    }
}

impl Default for KolmogorovSmirnov {
    fn default() -> Self {
        Self::new(0.05, 10)
    }
}

fn finite_sorted(values: &[f64]) -> Vec<f64> {
    let mut out: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    out.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    out
}

/// `sup |F_a(x) - F_b(x)|`, evaluated at every distinct value of the merged
/// sample. Both inputs must be sorted.
pub fn ks_statistic(a: &[f64], b: &[f64]) -> f64 {
    let (n, m) = (a.len() as f64, b.len() as f64);
    let (mut i, mut j) = (0usize, 0usize);
    let mut d: f64 = 0.0;

    while i < a.len() && j < b.len() {
        let x = a[i].min(b[j]);
        // Step past every copy of x in both samples before comparing.
        while i < a.len() && a[i] <= x {
            i += 1;
        }
        while j < b.len() && b[j] <= x {
            j += 1;
        }
        d = d.max((i as f64 / n - j as f64 / m).abs());
    }
    d
}

/// Asymptotic p-value with Stephens' small-sample correction.
pub fn ks_p_value(statistic: f64, n: usize, m: usize) -> f64 {
    if statistic <= 0.0 || n == 0 || m == 0 {
        return 1.0;
    }
    let en = ((n * m) as f64 / (n + m) as f64).sqrt();
    let lambda = (en + 0.12 + 0.11 / en) * statistic;
    kolmogorov_q(lambda)
}

/// Survival function of the Kolmogorov distribution,
/// `Q(λ) = 2 Σ (-1)^(k-1) exp(-2 k² λ²)`. Returns 1.0 when the series has
/// not converged, which only happens for small λ where Q is 1 anyway.
pub fn kolmogorov_q(lambda: f64) -> f64 {
    const EPS_TERM: f64 = 1e-3;
    const EPS_SUM: f64 = 1e-8;

    if lambda <= 0.0 {
        return 1.0;
    }
    let a2 = -2.0 * lambda * lambda;
    let mut sign = 2.0;
    let mut sum = 0.0;
    let mut prev_term: f64 = 0.0;

    for k in 1..=100 {
        let k = f64::from(k);
        let term = sign * (a2 * k * k).exp();
        sum += term;
        if term.abs() <= EPS_TERM * prev_term || term.abs() <= EPS_SUM * sum {
            return sum.clamp(0.0, 1.0);
        }
        sign = -sign;
        prev_term = term.abs();
    }
    1.0
}

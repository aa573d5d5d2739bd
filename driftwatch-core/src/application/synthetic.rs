// driftwatch-core/src/application/synthetic.rs
//
// Drift injection for demos and end-to-end checks of the pipeline.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, instrument};

use crate::domain::error::DomainError;
use crate::domain::record::FeatureValue;
use crate::error::DriftwatchError;
use crate::ports::prediction_log::PredictionLog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftKind {
    /// `v * magnitude`
    Shift,
    /// `v + N(0, |v| * (magnitude - 1))`
    Scale,
    /// `v + N(0, magnitude)`
    Noise,
}

impl fmt::Display for DriftKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DriftKind::Shift => "shift",
            DriftKind::Scale => "scale",
            DriftKind::Noise => "noise",
        })
    }
}

impl FromStr for DriftKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "shift" => Ok(DriftKind::Shift),
            "scale" => Ok(DriftKind::Scale),
            "noise" => Ok(DriftKind::Noise),
            other => Err(format!("unknown drift kind '{other}' (shift, scale, noise)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DriftInjection {
    pub feature: String,
    pub kind: DriftKind,
    pub magnitude: f64,
    /// Number of most recent records to copy.
    pub window: usize,
    pub seed: u64,
}

/// Appends drifted copies of the last `window` records. Existing lines are
/// never rewritten. Returns the number of records appended.
#[instrument(skip(log), fields(feature = %injection.feature, kind = %injection.kind))]
pub fn inject_drift(log: &dyn PredictionLog, injection: &DriftInjection) -> Result<usize, DriftwatchError> {
    let window = log.tail(injection.window)?;
    if window.records.len() < injection.window {
        return Err(DomainError::InsufficientData {
            available: window.records.len(),
            required: injection.window,
        }
        .into());
    }

    let mut rng = StdRng::seed_from_u64(injection.seed);
    let mut appended = 0;
    for mut record in window.records {
        if let Some(v) = record.features.get(&injection.feature).and_then(FeatureValue::as_number) {
            let drifted = match injection.kind {
                DriftKind::Shift => v * injection.magnitude,
                DriftKind::Scale => v + standard_normal(&mut rng) * v.abs() * (injection.magnitude - 1.0),
                DriftKind::Noise => v + standard_normal(&mut rng) * injection.magnitude,
            };
            record.features.insert(injection.feature.clone(), drifted.into());
        }
        record.timestamp = Utc::now();
        record.label = None;
        log.append(&record)?;
        appended += 1;
    }

    info!(appended, magnitude = injection.magnitude, "💉 Synthetic drift injected");
    Ok(appended)
}

/// Box-Muller transform.
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.r#gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

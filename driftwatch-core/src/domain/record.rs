// driftwatch-core/src/domain/record.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A single feature value as received from the serving path.
///
/// Parsing is strict but schema-less: every JSON shape maps to a variant,
/// nothing is ever evaluated. Only `Number` takes part in statistical tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum FeatureValue {
    Number(f64),
    Text(String),
    Null,
    /// Booleans, arrays and objects. Kept so the record round-trips, never compared.
    Unsupported(Value),
}

impl FeatureValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }
}

impl From<Value> for FeatureValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FeatureValue::Null,
            Value::Number(n) => match n.as_f64() {
                Some(v) if v.is_finite() => FeatureValue::Number(v),
                _ => FeatureValue::Unsupported(Value::Number(n)),
            },
            Value::String(s) => FeatureValue::Text(s),
            other => FeatureValue::Unsupported(other),
        }
    }
}

impl From<FeatureValue> for Value {
    fn from(value: FeatureValue) -> Self {
        match value {
            FeatureValue::Number(v) => serde_json::Number::from_f64(v)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FeatureValue::Text(s) => Value::String(s),
            FeatureValue::Null => Value::Null,
            FeatureValue::Unsupported(v) => v,
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        if value.is_finite() {
            FeatureValue::Number(value)
        } else {
            FeatureValue::Null
        }
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        FeatureValue::Text(value.to_string())
    }
}

pub type FeatureMap = BTreeMap<String, FeatureValue>;

/// One served inference. Immutable once appended to the prediction log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub timestamp: DateTime<Utc>,
    pub features: FeatureMap,
    pub prediction: u8,
    pub probability: f64,
    /// Resolved ground truth, when the label arrived after serving.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<u8>,
}

impl PredictionRecord {
    pub fn new(features: FeatureMap, prediction: u8, probability: f64) -> Self {
        Self {
            timestamp: Utc::now(),
            features,
            prediction,
            probability: probability.clamp(0.0, 1.0),
            label: None,
        }
    }

    /// Stable identity used to deduplicate merges into the accumulated dataset.
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.timestamp, &self.features, self.prediction, self.probability)
    }
}

pub(crate) fn fingerprint(
    timestamp: &DateTime<Utc>,
    features: &FeatureMap,
    prediction: u8,
    probability: f64,
) -> String {
    // BTreeMap serialization is key-ordered, so this is deterministic.
    let features = serde_json::to_string(features).unwrap_or_default();
    format!(
        "{}|{}|{}|{}",
        timestamp.to_rfc3339(),
        features,
        prediction,
        probability
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_value_shapes() {
        let raw = r#"{"a": 1.5, "b": "x", "c": null, "d": [1, 2], "e": true, "f": 3}"#;
        let map: FeatureMap = serde_json::from_str(raw).unwrap();

        assert_eq!(map["a"], FeatureValue::Number(1.5));
        assert_eq!(map["b"], FeatureValue::Text("x".into()));
        assert_eq!(map["c"], FeatureValue::Null);
        assert!(matches!(map["d"], FeatureValue::Unsupported(_)));
        assert!(matches!(map["e"], FeatureValue::Unsupported(_)));
        assert_eq!(map["f"].as_number(), Some(3.0));
        assert_eq!(map["b"].as_number(), None);
    }

    #[test]
    fn test_record_roundtrip_keeps_unsupported_values() {
        let raw = r#"{"timestamp":"2024-01-01T00:00:00Z","features":{"x":1.0,"tags":["a"]},"prediction":1,"probability":0.7}"#;
        let record: PredictionRecord = serde_json::from_str(raw).unwrap();
        let back = serde_json::to_string(&record).unwrap();
        let again: PredictionRecord = serde_json::from_str(&back).unwrap();
        assert_eq!(record, again);
        assert_eq!(record.label, None);
    }

    #[test]
    fn test_fingerprint_is_order_independent() {
        let mut a = FeatureMap::new();
        a.insert("x".into(), 1.0.into());
        a.insert("y".into(), "z".into());
        let mut b = FeatureMap::new();
        b.insert("y".into(), "z".into());
        b.insert("x".into(), 1.0.into());

        let mut r1 = PredictionRecord::new(a, 1, 0.9);
        let mut r2 = PredictionRecord::new(b, 1, 0.9);
        r2.timestamp = r1.timestamp;
        assert_eq!(r1.fingerprint(), r2.fingerprint());

        r1.probability = 0.8;
        assert_ne!(r1.fingerprint(), r2.fingerprint());
    }
}

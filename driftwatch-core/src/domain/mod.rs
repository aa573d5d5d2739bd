// driftwatch-core/src/domain/mod.rs

pub mod alerting;
pub mod dataset;
pub mod drift;
pub mod error;
pub mod policy;
pub mod record;
pub mod reference;
pub mod retraining;

// Re-exports for shorter imports elsewhere
pub use error::DomainError;
pub use policy::DriftPolicy;
pub use record::{FeatureMap, FeatureValue, PredictionRecord};
pub use reference::ReferenceDistribution;

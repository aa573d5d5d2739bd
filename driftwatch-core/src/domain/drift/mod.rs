// driftwatch-core/src/domain/drift/mod.rs

pub mod aggregate;
pub mod classifier;
pub mod ks;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregate::{DriftAggregator, DriftOutcome, DriftSummary, TimeRange};
pub use classifier::{ClassifierDriftReport, ClassifierDriftTest, ClassifierOutcome};
pub use ks::{Comparison, DriftFeatureReport, KolmogorovSmirnov};

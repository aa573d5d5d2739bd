// driftwatch-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

/// Expected pipeline conditions. Callers fold these into a `no_data` outcome
/// or a `retraining_skipped` action; none of them is fatal.
#[derive(Error, Debug, Diagnostic, PartialEq)]
pub enum DomainError {
    #[error("No data: {0}")]
    #[diagnostic(
        code(driftwatch::domain::no_data),
        help("Wait for more predictions to be logged before checking drift.")
    )]
    NoData(String),

    #[error("insufficient labeled samples: {available} < {required}")]
    #[diagnostic(code(driftwatch::domain::insufficient_labels))]
    InsufficientLabels { available: usize, required: usize },

    #[error("insufficient labeled samples for window: {available} < {required}")]
    #[diagnostic(code(driftwatch::domain::insufficient_data))]
    InsufficientData { available: usize, required: usize },

    #[error("Malformed record at line {line}: {reason}")]
    #[diagnostic(
        code(driftwatch::domain::malformed_record),
        help("The line is skipped; the rest of the window is still aggregated.")
    )]
    MalformedRecord { line: usize, reason: String },

    #[error("retraining already in progress")]
    #[diagnostic(code(driftwatch::domain::retraining_in_flight))]
    RetrainingInFlight,
}

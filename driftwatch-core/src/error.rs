// driftwatch-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::trainer::TrainingJobError;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DriftwatchError {
    // --- DOMAIN (expected pipeline conditions) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Domain(#[from] DomainError),

    // --- INFRASTRUCTURE (IO, parsing, config) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Infrastructure(#[from] InfrastructureError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Training(#[from] TrainingJobError),

    // --- GENERIC / APPLICATION ---
    #[error("Internal Error: {0}")]
    InternalError(String),
}

// Shortcuts so `?` works on raw io / serde calls.
impl From<std::io::Error> for DriftwatchError {
    fn from(err: std::io::Error) -> Self {
        DriftwatchError::Infrastructure(InfrastructureError::Io(err))
    }
}

impl From<serde_json::Error> for DriftwatchError {
    fn from(err: serde_json::Error) -> Self {
        DriftwatchError::Infrastructure(InfrastructureError::Json(err))
    }
}

impl From<tokio::task::JoinError> for DriftwatchError {
    fn from(err: tokio::task::JoinError) -> Self {
        DriftwatchError::InternalError(format!("worker task failed: {err}"))
    }
}

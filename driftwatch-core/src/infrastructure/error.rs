// driftwatch-core/src/infrastructure/error.rs

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(driftwatch::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    // --- JSON / JSONL ---
    #[error("JSON Error: {0}")]
    #[diagnostic(code(driftwatch::infra::json))]
    Json(#[from] serde_json::Error),

    #[error("Corrupted store '{path}' at line {line}: {reason}")]
    #[diagnostic(
        code(driftwatch::infra::corrupted),
        help("This file is written by driftwatch only; restore it from a snapshot.")
    )]
    Corrupted {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    // --- CONFIG / YAML ---
    #[error("YAML Parsing Error: {0}")]
    #[diagnostic(
        code(driftwatch::infra::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(code(driftwatch::infra::config_invalid))]
    InvalidConfig(String),

    #[error("Configuration not found at '{0}'")]
    #[diagnostic(code(driftwatch::infra::config_missing))]
    ConfigNotFound(String),

    // --- REFERENCE ---
    #[error("Reference distribution not found at {0:?}")]
    #[diagnostic(
        code(driftwatch::infra::reference_missing),
        help("Run `driftwatch reference build --from <training-data.jsonl>` first.")
    )]
    ReferenceMissing(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_missing_hint_matches_cli() {
        let err = InfrastructureError::ReferenceMissing(PathBuf::from("reference_stats.json"));
        let help = err.help().map(|h| h.to_string()).unwrap_or_default();
        assert!(help.contains("driftwatch reference build --from "), "help: {help}");
    }
}

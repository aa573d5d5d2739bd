// driftwatch-core/src/infrastructure/config/policy.rs

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::domain::policy::DriftPolicy;
use crate::infrastructure::error::InfrastructureError;

pub const CONFIG_FILENAMES: [&str; 2] = ["driftwatch.yaml", "driftwatch.yml"];

// --- LOADER ---

/// Loads `driftwatch.yaml` from `project_dir`, applies environment overrides,
/// validates ranges and resolves storage paths against the project directory.
///
/// A project without a config file runs on defaults.
#[instrument(skip(project_dir))]
pub fn load_policy(project_dir: &Path) -> Result<DriftPolicy, InfrastructureError> {
    // 1. Base YAML (or defaults)
    let mut policy = match find_config(project_dir) {
        Some(path) => {
            info!(path = ?path, "Loading drift policy");
            let content = fs::read_to_string(&path)?;
            serde_yaml::from_str::<DriftPolicy>(&content)?
        }
        None => {
            info!(dir = ?project_dir, "No driftwatch.yaml found, using default policy");
            DriftPolicy::default()
        }
    };

    // 2. Layering: DRIFTWATCH_* variables win over the file
    apply_env_overrides(&mut policy, |key| std::env::var(key).ok())?;

    // 3. Fail fast on out-of-range thresholds
    policy
        .validate()
        .map_err(|e| InfrastructureError::InvalidConfig(e.to_string()))?;

    policy.paths.resolve(project_dir);
    Ok(policy)
}

/// Same as `load_policy`, but a missing file is an error.
pub fn load_policy_strict(project_dir: &Path) -> Result<DriftPolicy, InfrastructureError> {
    if find_config(project_dir).is_none() {
        return Err(InfrastructureError::ConfigNotFound(format!(
            "No configuration file found in {:?}. Checked: {:?}",
            project_dir, CONFIG_FILENAMES
        )));
    }
    load_policy(project_dir)
}

fn find_config(root: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| root.join(name))
        .find(|p| p.exists())
}

fn apply_env_overrides<F>(policy: &mut DriftPolicy, lookup: F) -> Result<(), InfrastructureError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("DRIFTWATCH_WINDOW_SIZE") {
        let window = parse_count("DRIFTWATCH_WINDOW_SIZE", &val)?;
        info!(old = policy.drift.window_size, new = window, "Overriding drift window via ENV");
        policy.drift.window_size = window;
    }
    if let Some(val) = lookup("DRIFTWATCH_PREDICTION_LOG") {
        info!(old = ?policy.paths.prediction_log, new = ?val, "Overriding prediction log via ENV");
        policy.paths.prediction_log = PathBuf::from(val);
    }
    if let Some(val) = lookup("DRIFTWATCH_MIN_LABELED_SAMPLES") {
        let floor = parse_count("DRIFTWATCH_MIN_LABELED_SAMPLES", &val)?;
        if floor < policy.retraining.window_size {
            warn!(
                floor,
                window = policy.retraining.window_size,
                "Label floor below the retraining window; the window check still applies"
            );
        }
        policy.retraining.min_labeled_samples = floor;
    }
    Ok(())
}

fn parse_count(key: &str, raw: &str) -> Result<usize, InfrastructureError> {
    raw.trim()
        .parse()
        .map_err(|_| InfrastructureError::InvalidConfig(format!("{key} must be a positive integer, got '{raw}'")))
}

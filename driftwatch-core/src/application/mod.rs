// driftwatch-core/src/application/mod.rs

pub mod accumulator;
pub mod monitor;
pub mod reference;
pub mod serving;
pub mod status;
pub mod synthetic;
pub mod trigger;

// --- RE-EXPORTS (FACADE PATTERN) ---
// Lets the CLI write `use driftwatch_core::application::{DriftMonitor, inject_drift};`

pub use accumulator::{RetrainingDataAccumulator, StagedRetraining};
pub use monitor::{DriftCheckReport, DriftMonitor};
pub use reference::{build_reference, rebuild_reference};
pub use serving::PredictionLogger;
pub use status::{RetrainingStatus, retraining_status};
pub use synthetic::{DriftInjection, DriftKind, inject_drift};
pub use trigger::RetrainingJobTrigger;

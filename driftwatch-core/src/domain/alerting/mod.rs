// driftwatch-core/src/domain/alerting/mod.rs

pub mod alert;
pub mod severity;

pub use alert::{Alert, AlertReport, AlertStatus, generate, generate_at};
pub use severity::{Severity, classify};

// driftwatch-core/src/ports/mod.rs

// Contracts the application layer depends on. Adapters live in infrastructure.

pub mod prediction_log;
pub mod run_registry;
pub mod trainer;

pub use prediction_log::{LogWindow, PredictionLog};
pub use run_registry::RunRegistry;
pub use trainer::{Trainer, TrainingJobError, TrainingReport};

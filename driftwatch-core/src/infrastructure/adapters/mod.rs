// driftwatch-core/src/infrastructure/adapters/mod.rs

pub mod command_trainer;
pub mod dataset;
pub mod jsonl_log;
pub mod reference_file;
pub mod run_registry;

pub use command_trainer::CommandTrainer;
pub use dataset::JsonlDatasetStore;
pub use jsonl_log::JsonlPredictionLog;
pub use reference_file::JsonReferenceStore;
pub use run_registry::JsonlRunRegistry;

// driftwatch-core/src/lib.rs

// 1. Documentation
#![allow(missing_docs)]

// 2. Memory safety
#![deny(unsafe_code)]
// 3. Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// 4. Performance
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Ports (interfaces / traits)
// Prediction log, trainer, run registry.
pub mod ports;

// 2. Domain (core logic)
// Statistical tests, severity, alerts, retraining decisions.
// Depends on nothing else (no infra, no app).
pub mod domain;

// 3. Infrastructure (adapters)
// JSONL stores, reference file, command trainer, YAML config.
// Depends on Domain and Ports.
pub mod infrastructure;

// 4. Application (use cases)
// Drift monitor, accumulator, job trigger, serving hook.
pub mod application;

// --- GLOBAL ERROR HANDLING ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
pub use error::DriftwatchError;

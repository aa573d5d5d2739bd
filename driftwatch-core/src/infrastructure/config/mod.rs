// driftwatch-core/src/infrastructure/config/mod.rs

pub mod policy;

pub use policy::{CONFIG_FILENAMES, load_policy, load_policy_strict};

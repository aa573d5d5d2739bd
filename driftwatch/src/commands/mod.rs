// driftwatch/src/commands/mod.rs

pub mod check;
pub mod inject_drift;
pub mod log;
pub mod reference;
pub mod retrain;
pub mod status;
pub mod watch;

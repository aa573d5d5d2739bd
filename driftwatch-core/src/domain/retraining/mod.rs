// driftwatch-core/src/domain/retraining/mod.rs

pub mod decision;
pub mod job;
pub mod promotion;

pub use decision::{ActionReport, Decision, RetrainingAction, check_readiness, decide};
pub use job::{
    JobOutcome, Metrics, RETRAINING_TAG, RetrainingJob, TRIGGER_DRIFT, TRIGGER_MANUAL, TRIGGER_TAG,
};
pub use promotion::{PromotionDecision, PromotionPolicy, Verdict};

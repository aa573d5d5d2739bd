// driftwatch-core/src/domain/retraining/promotion.rs
//
// Champion/challenger check run after a successful retraining: the candidate
// replaces production only if it beats it on enough shared metrics.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::retraining::job::Metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Promote,
    Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionDecision {
    pub decision: Verdict,
    /// Shared metrics where the candidate scored strictly higher.
    pub wins: usize,
    pub compared: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PromotionPolicy {
    /// All metrics are "higher is better" (roc_auc, pr_auc, f1...).
    #[validate(range(min = 1))]
    pub min_wins: usize,
}

impl Default for PromotionPolicy {
    fn default() -> Self {
        Self { min_wins: 2 }
    }
}

impl PromotionPolicy {
    pub fn evaluate(&self, production: Option<&Metrics>, candidate: &Metrics) -> PromotionDecision {
        let Some(production) = production else {
            // Cold start: nothing to beat.
            return PromotionDecision {
                decision: Verdict::Promote,
                wins: 0,
                compared: 0,
            };
        };

        let shared: Vec<(f64, f64)> = candidate
            .iter()
            .filter_map(|(name, new)| production.get(name).map(|old| (*old, *new)))
            .collect();
        let wins = shared.iter().filter(|(old, new)| new > old).count();
        let compared = shared.len();

        // Fewer shared metrics than `min_wins` can never promote.
        let decision = if wins >= self.min_wins {
            Verdict::Promote
        } else {
            Verdict::Reject
        };

        PromotionDecision {
            decision,
            wins,
            compared,
        }
    }
}

//! Display-only plan health score.

use crate::plan::Plan;
use crate::policy::{evaluate_plan_policy, PolicyEvaluator, PolicyMode};
use std::collections::BTreeSet;

const UNSAFE_PENALTY: f64 = 15.0;

/// Score in `[0, 100]` from duration, tag spread, safety and advisory policy risk.
pub fn estimate_health(plan: &Plan, policy: &dyn PolicyEvaluator) -> f64 {
    let total_minutes = plan.total_expected_minutes() as f64;
    let distinct_tags: BTreeSet<&str> = plan
        .actions
        .iter()
        .flat_map(|a| a.tags.iter().map(String::as_str))
        .collect();
    let risk = evaluate_plan_policy(policy, plan, PolicyMode::Advisory).risk_score;

    let mut score = 100.0;
    score -= (total_minutes / 10.0).min(40.0);
    score -= (distinct_tags.len() as f64 * 2.0).min(20.0);
    if !plan.is_safe {
        score -= UNSAFE_PENALTY;
    }
    score -= (risk * 10.0).min(25.0);
    score.clamp(0.0, 100.0)
}

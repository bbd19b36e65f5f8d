//! Quality router: scores a plan and recommends a fast, safe or balanced path.

use crate::forecast::{mean, DependencyHealth, DependencyInsight, ReadinessProjector};
use crate::plan::Plan;
use crate::policy::{evaluate_plan_policy, PolicyEvaluator, PolicyMode};
use crate::simulation::SimulationEngine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Fast,
    Safe,
    Balanced,
}

impl Recommendation {
    pub fn as_str(self) -> &'static str {
        match self {
            Recommendation::Fast => "fast",
            Recommendation::Safe => "safe",
            Recommendation::Balanced => "balanced",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteDecision {
    pub plan_id: String,
    pub recommendation: Recommendation,
    pub rationale: Vec<String>,
    pub score: f64,
}

fn health_penalty(health: DependencyHealth) -> f64 {
    match health {
        DependencyHealth::Healthy => 0.0,
        DependencyHealth::Fragile => 10.0,
        DependencyHealth::Brittle => 20.0,
    }
}

/// 100 when the simulated timeline fits the SLA, proportionally less otherwise.
pub fn sla_score(sla_minutes: u32, estimated_minutes: u64) -> f64 {
    if estimated_minutes == 0 {
        return 100.0;
    }
    if sla_minutes == 0 {
        return 0.0;
    }
    (100.0 * f64::from(sla_minutes) / estimated_minutes as f64).clamp(0.0, 100.0)
}

pub fn recommend(violations: usize, sla_score: f64) -> Recommendation {
    if violations > 1 || sla_score < 50.0 {
        Recommendation::Safe
    } else if sla_score < 70.0 {
        Recommendation::Balanced
    } else {
        Recommendation::Fast
    }
}

pub struct QualityRouter {
    policy: Arc<dyn PolicyEvaluator>,
    insight: Arc<dyn DependencyInsight>,
    projector: Arc<dyn ReadinessProjector>,
    simulation: SimulationEngine,
}

impl QualityRouter {
    pub fn new(
        policy: Arc<dyn PolicyEvaluator>,
        insight: Arc<dyn DependencyInsight>,
        projector: Arc<dyn ReadinessProjector>,
    ) -> Self {
        let simulation = SimulationEngine::new(projector.clone(), policy.clone());
        Self {
            policy,
            insight,
            projector,
            simulation,
        }
    }

    pub fn route_plan(&self, plan: &Plan) -> RouteDecision {
        let policy = evaluate_plan_policy(self.policy.as_ref(), plan, PolicyMode::Advisory);
        let violations = policy.violation_count;
        let health = self.insight.assess(plan);
        let simulated = self.simulation.simulate_plan(plan);
        let sla = sla_score(plan.sla_minutes, simulated.estimated_minutes);
        let readiness_mean = mean(&self.projector.project(plan));

        let recommendation = recommend(violations, sla);
        let score =
            sla + readiness_mean - violations as f64 * 5.0 - health_penalty(health);

        let mut rationale = vec![
            format!(
                "SLA score {:.1} ({}m simulated against {}m SLA)",
                sla, simulated.estimated_minutes, plan.sla_minutes
            ),
            format!("{} policy violation(s)", violations),
            format!("dependency health {}", health.as_str()),
            format!("mean projected readiness {:.1}", readiness_mean),
        ];
        rationale.extend(simulated.critical_warnings);

        debug!(
            plan_id = %plan.plan_id,
            recommendation = recommendation.as_str(),
            score,
            "plan routed"
        );
        RouteDecision {
            plan_id: plan.plan_id.clone(),
            recommendation,
            rationale,
            score,
        }
    }

    /// Decisions for every plan, best score first.
    pub fn compare_plans(&self, plans: &[Plan]) -> Vec<RouteDecision> {
        let mut decisions: Vec<RouteDecision> = plans.iter().map(|p| self.route_plan(p)).collect();
        decisions.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.plan_id.cmp(&b.plan_id))
        });
        decisions
    }
}

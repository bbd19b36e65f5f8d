//! Side-effect-free run projection and strategy comparison.

use crate::forecast::ReadinessProjector;
use crate::plan::Plan;
use crate::policy::PolicyEvaluator;
use crate::strategy::{build_execution_strategy, Strategy};
use crate::types::ActionId;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SimulatedStatus {
    Queued,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationStep {
    pub action_id: ActionId,
    pub region: String,
    pub start_minute: u64,
    pub end_minute: u64,
    pub status: SimulatedStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationResult {
    pub plan_id: String,
    pub estimated_minutes: u64,
    pub readiness_after_run: f64,
    pub steps: Vec<SimulationStep>,
    pub critical_warnings: Vec<String>,
}

/// One stage on a strategy's projected timeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineEntry {
    pub stage: usize,
    pub start_minute: u64,
    pub end_minute: u64,
    pub action_ids: Vec<ActionId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategyTrace {
    pub strategy: Strategy,
    pub timeline: Vec<TimelineEntry>,
    pub estimated_minutes: u64,
    pub readiness_after_run: f64,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategyComparison {
    pub plan_id: String,
    pub traces: Vec<StrategyTrace>,
    pub winner: Strategy,
}

/// Runs plans forward on paper. Never touches an adapter or store.
#[derive(Clone)]
pub struct SimulationEngine {
    projector: Arc<dyn ReadinessProjector>,
    policy: Arc<dyn PolicyEvaluator>,
}

impl SimulationEngine {
    pub fn new(projector: Arc<dyn ReadinessProjector>, policy: Arc<dyn PolicyEvaluator>) -> Self {
        Self { projector, policy }
    }

    /// Walks actions in plan order (not dependency order).
    pub fn simulate_plan(&self, plan: &Plan) -> SimulationResult {
        let mut elapsed = 0u64;
        let mut steps = Vec::with_capacity(plan.actions.len());
        let mut critical_warnings = Vec::new();
        for action in &plan.actions {
            let start = elapsed;
            elapsed += u64::from(action.expected_duration_minutes);
            let status = if action.expected_duration_minutes > plan.sla_minutes {
                critical_warnings.push(format!(
                    "{} expected {}m exceeds SLA of {}m",
                    action.id, action.expected_duration_minutes, plan.sla_minutes
                ));
                SimulatedStatus::Failed
            } else {
                SimulatedStatus::Queued
            };
            steps.push(SimulationStep {
                action_id: action.id.clone(),
                region: action.region.clone(),
                start_minute: start,
                end_minute: elapsed,
                status,
            });
        }
        let readiness_after_run = self
            .projector
            .project(plan)
            .last()
            .copied()
            .unwrap_or(0.0);
        SimulationResult {
            plan_id: plan.plan_id.clone(),
            estimated_minutes: elapsed,
            readiness_after_run,
            steps,
            critical_warnings,
        }
    }

    pub fn trace_strategy(&self, plan: &Plan, strategy: Strategy) -> StrategyTrace {
        let execution = build_execution_strategy(plan, strategy, self.policy.as_ref());
        let simulated = self.simulate_plan(&execution.plan);
        let mut cursor = 0u64;
        let timeline = execution
            .stages
            .iter()
            .map(|stage| {
                let start = cursor;
                cursor += u64::from(stage.expected_minutes);
                TimelineEntry {
                    stage: stage.index,
                    start_minute: start,
                    end_minute: cursor,
                    action_ids: stage.action_ids.clone(),
                }
            })
            .collect();
        StrategyTrace {
            strategy,
            timeline,
            estimated_minutes: execution.estimated_minutes,
            readiness_after_run: simulated.readiness_after_run,
            warnings: simulated.critical_warnings,
        }
    }

    /// Traces every strategy concurrently and picks the shortest timeline.
    pub async fn compare_simulation_strategies(&self, plan: &Plan) -> StrategyComparison {
        let traces: Vec<StrategyTrace> = join_all(
            Strategy::ALL
                .into_iter()
                .map(|strategy| async move { self.trace_strategy(plan, strategy) }),
        )
        .await;
        let winner = pick_winner(&traces);
        StrategyComparison {
            plan_id: plan.plan_id.clone(),
            traces,
            winner,
        }
    }
}

/// Fewest timeline entries wins; ties go to the lower estimate, then to
/// declaration order.
fn pick_winner(traces: &[StrategyTrace]) -> Strategy {
    traces
        .iter()
        .enumerate()
        .min_by_key(|(index, trace)| (trace.timeline.len(), trace.estimated_minutes, *index))
        .map(|(_, trace)| trace.strategy)
        .unwrap_or_default()
}

//! Forecast collaborators: readiness projection and dependency health.

use crate::plan::Plan;
use crate::resolver::{resolve_execution_order, ExecutionOrder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DependencyHealth {
    Healthy,
    Fragile,
    Brittle,
}

impl DependencyHealth {
    pub fn as_str(self) -> &'static str {
        match self {
            DependencyHealth::Healthy => "healthy",
            DependencyHealth::Fragile => "fragile",
            DependencyHealth::Brittle => "brittle",
        }
    }
}

/// Produces a readiness time series (0..=100) for a plan.
pub trait ReadinessProjector: Send + Sync {
    fn project(&self, plan: &Plan) -> Vec<f64>;
}

/// Labels the plan's dependency graph.
pub trait DependencyInsight: Send + Sync {
    fn assess(&self, plan: &Plan) -> DependencyHealth;
}

/// One point per action: share of actions completed, discounted by
/// `sla / elapsed` once the cumulative duration passes the SLA.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlaReadinessProjector;

impl ReadinessProjector for SlaReadinessProjector {
    fn project(&self, plan: &Plan) -> Vec<f64> {
        let total = plan.actions.len();
        let sla = f64::from(plan.sla_minutes);
        let mut elapsed = 0f64;
        plan.actions
            .iter()
            .enumerate()
            .map(|(index, action)| {
                elapsed += f64::from(action.expected_duration_minutes);
                let share = 100.0 * (index + 1) as f64 / total as f64;
                if elapsed > sla && elapsed > 0.0 {
                    share * (sla / elapsed)
                } else {
                    share
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GraphDependencyInsight {
    pub fan_in_threshold: usize,
    pub depth_threshold: usize,
}

impl Default for GraphDependencyInsight {
    fn default() -> Self {
        Self {
            fan_in_threshold: 3,
            depth_threshold: 3,
        }
    }
}

impl DependencyInsight for GraphDependencyInsight {
    fn assess(&self, plan: &Plan) -> DependencyHealth {
        let ordered = match resolve_execution_order(&plan.actions) {
            ExecutionOrder::Ordered(actions) => actions,
            ExecutionOrder::Unresolved { .. } => return DependencyHealth::Brittle,
        };
        if plan
            .actions
            .iter()
            .any(|a| a.dependencies.len() >= self.fan_in_threshold)
        {
            return DependencyHealth::Fragile;
        }
        // Longest chain, counted in edges, over the topological order.
        let mut depth: HashMap<&str, usize> = HashMap::new();
        for action in &ordered {
            let d = action
                .dependencies
                .iter()
                .filter_map(|dep| depth.get(dep.as_str()))
                .map(|d| d + 1)
                .max()
                .unwrap_or(0);
            depth.insert(action.id.as_str(), d);
        }
        if depth.values().any(|d| *d > self.depth_threshold) {
            DependencyHealth::Fragile
        } else {
            DependencyHealth::Healthy
        }
    }
}

pub fn mean(points: &[f64]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    points.iter().sum::<f64>() / points.len() as f64
}

//! Strategy planner: named reorderings of a plan grouped into concurrency stages.
//!
//! Strategies are advisory. They feed estimation, routing and simulation; the
//! scheduler dispatches in dependency order unless a caller hands it a
//! reordered plan.

use crate::plan::{Action, Plan};
use crate::policy::{evaluate_plan_policy, PolicyEvaluator, PolicyMode};
use crate::resolver::resolve_execution_order_or_fallback;
use crate::types::ActionId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

const DEPENDENCY_WEIGHT_MINUTES: u32 = 7;
const MAX_STAGE_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    DependencyFirst,
    CriticalFirst,
    FastestFirst,
    #[default]
    Balanced,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::DependencyFirst,
        Strategy::CriticalFirst,
        Strategy::FastestFirst,
        Strategy::Balanced,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::DependencyFirst => "dependency-first",
            Strategy::CriticalFirst => "critical-first",
            Strategy::FastestFirst => "fastest-first",
            Strategy::Balanced => "balanced",
        }
    }

    /// Reorder actions for this strategy. Sorts are stable.
    pub fn order(self, actions: &[Action]) -> Vec<Action> {
        let mut ordered = actions.to_vec();
        match self {
            Strategy::DependencyFirst => return resolve_execution_order_or_fallback(actions),
            Strategy::CriticalFirst => ordered.sort_by_key(|a| {
                u64::from(a.expected_duration_minutes)
                    + a.dependencies.len() as u64 * u64::from(DEPENDENCY_WEIGHT_MINUTES)
            }),
            Strategy::FastestFirst => ordered.sort_by_key(|a| a.expected_duration_minutes),
            Strategy::Balanced => {
                ordered.sort_by(|a, b| b.tags.len().cmp(&a.tags.len()));
            }
        }
        ordered
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "Unknown strategy: {} (expected one of dependency-first, critical-first, fastest-first, balanced)",
                    s
                )
            })
    }
}

/// A group of actions that may run side by side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Stage {
    pub index: usize,
    /// `incoming edges + dependency count` shared by every action in the stage.
    pub weight: usize,
    pub action_ids: Vec<ActionId>,
    /// Longest action in the stage.
    pub expected_minutes: u32,
    pub concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionStrategy {
    pub plan: Plan,
    pub stages: Vec<Stage>,
    pub estimated_minutes: u64,
    pub strategy: Strategy,
    pub policy_risk: f64,
}

/// Edges `dependency -> action` between actions of the same plan.
#[derive(Debug, Clone, Default)]
pub struct TopologySnapshot {
    pub edges: Vec<(ActionId, ActionId)>,
}

impl TopologySnapshot {
    pub fn capture(actions: &[Action]) -> Self {
        let known: HashSet<&str> = actions.iter().map(|a| a.id.as_str()).collect();
        let edges = actions
            .iter()
            .flat_map(|action| {
                action
                    .dependencies
                    .iter()
                    .filter(|dep| known.contains(dep.as_str()))
                    .map(move |dep| (dep.clone(), action.id.clone()))
            })
            .collect();
        Self { edges }
    }

    pub fn incoming_counts(&self) -> HashMap<&str, usize> {
        let mut counts = HashMap::new();
        for (_, to) in &self.edges {
            *counts.entry(to.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

pub fn build_stages(actions: &[Action]) -> Vec<Stage> {
    let snapshot = TopologySnapshot::capture(actions);
    let incoming = snapshot.incoming_counts();

    let mut buckets: BTreeMap<usize, Vec<&Action>> = BTreeMap::new();
    for action in actions {
        let weight =
            incoming.get(action.id.as_str()).copied().unwrap_or(0) + action.dependencies.len();
        buckets.entry(weight).or_default().push(action);
    }

    buckets
        .into_iter()
        .enumerate()
        .map(|(index, (weight, members))| {
            let distinct_tags: BTreeSet<&str> = members
                .iter()
                .flat_map(|a| a.tags.iter().map(String::as_str))
                .collect();
            Stage {
                index,
                weight,
                action_ids: members.iter().map(|a| a.id.clone()).collect(),
                expected_minutes: members
                    .iter()
                    .map(|a| a.expected_duration_minutes)
                    .max()
                    .unwrap_or(0),
                concurrency: distinct_tags.len().clamp(1, MAX_STAGE_CONCURRENCY),
            }
        })
        .collect()
}

pub fn build_execution_strategy(
    plan: &Plan,
    strategy: Strategy,
    policy: &dyn PolicyEvaluator,
) -> ExecutionStrategy {
    let ordered = strategy.order(&plan.actions);
    let stages = build_stages(&ordered);
    let estimated_minutes = stages.iter().map(|s| u64::from(s.expected_minutes)).sum();
    let policy_risk = evaluate_plan_policy(policy, plan, PolicyMode::Advisory).risk_score;
    ExecutionStrategy {
        plan: plan.with_actions(ordered),
        stages,
        estimated_minutes,
        strategy,
        policy_risk,
    }
}

//! Dependency resolution: Kahn's algorithm over action dependencies.
//!
//! Malformed input (cycles, dependencies on ids outside the plan) never panics.
//! The result says whether a safe order exists; callers choose between failing
//! fast and degrading to plan order via [`ExecutionOrder::into_actions`].

use crate::plan::Action;
use crate::types::ActionId;
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOrder {
    /// Every action appears after all of its dependencies.
    Ordered(Vec<Action>),
    /// No complete order exists. `actions` is the input, unmodified.
    Unresolved {
        actions: Vec<Action>,
        /// Ids that never reached in-degree zero.
        blocked: Vec<ActionId>,
        /// `(action, missing dependency)` pairs.
        dangling: Vec<(ActionId, ActionId)>,
    },
}

impl ExecutionOrder {
    pub fn is_ordered(&self) -> bool {
        matches!(self, ExecutionOrder::Ordered(_))
    }

    pub fn actions(&self) -> &[Action] {
        match self {
            ExecutionOrder::Ordered(actions) => actions,
            ExecutionOrder::Unresolved { actions, .. } => actions,
        }
    }

    /// Ordered list, or the original list when no order exists.
    pub fn into_actions(self) -> Vec<Action> {
        match self {
            ExecutionOrder::Ordered(actions) => actions,
            ExecutionOrder::Unresolved { actions, .. } => actions,
        }
    }
}

pub fn resolve_execution_order(actions: &[Action]) -> ExecutionOrder {
    let known: HashSet<&str> = actions.iter().map(|a| a.id.as_str()).collect();
    let mut in_degree: Vec<usize> = Vec::with_capacity(actions.len());
    let mut dependents: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut dangling = Vec::new();

    for (index, action) in actions.iter().enumerate() {
        // Missing dependencies still count toward in-degree so the action is
        // never released.
        in_degree.push(action.dependencies.len());
        for dep in &action.dependencies {
            if known.contains(dep.as_str()) {
                dependents.entry(dep.as_str()).or_default().push(index);
            } else {
                dangling.push((action.id.clone(), dep.clone()));
            }
        }
    }

    let mut ready: VecDeque<usize> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, deg)| **deg == 0)
        .map(|(index, _)| index)
        .collect();

    let mut ordered = Vec::with_capacity(actions.len());
    let mut placed = vec![false; actions.len()];
    while let Some(index) = ready.pop_front() {
        if placed[index] {
            continue;
        }
        placed[index] = true;
        let action = &actions[index];
        ordered.push(action.clone());
        if let Some(children) = dependents.get(action.id.as_str()) {
            for &child in children {
                in_degree[child] = in_degree[child].saturating_sub(1);
                if in_degree[child] == 0 {
                    ready.push_back(child);
                }
            }
        }
    }

    if ordered.len() == actions.len() {
        return ExecutionOrder::Ordered(ordered);
    }

    let blocked = actions
        .iter()
        .zip(placed.iter())
        .filter(|(_, placed)| !**placed)
        .map(|(action, _)| action.id.clone())
        .collect();
    ExecutionOrder::Unresolved {
        actions: actions.to_vec(),
        blocked,
        dangling,
    }
}

/// Ordered actions, falling back to the input order when unresolved.
pub fn resolve_execution_order_or_fallback(actions: &[Action]) -> Vec<Action> {
    resolve_execution_order(actions).into_actions()
}

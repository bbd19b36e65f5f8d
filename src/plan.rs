//! Recovery plan data model: actions, plans, and plan file loading.

use crate::error::OrchestratorError;
use crate::types::{ActionId, PlanId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;

/// How much human involvement a plan expects.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PlanMode {
    #[default]
    Manual,
    SemiAutomated,
    Automated,
}

/// One remediation step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Action {
    pub id: ActionId,
    pub region: String,
    #[serde(default)]
    pub service_code: String,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub dependencies: Vec<ActionId>,
    pub expected_duration_minutes: u32,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Action {
    pub fn new(id: impl Into<String>, region: impl Into<String>, minutes: u32) -> Self {
        Self {
            id: id.into(),
            region: region.into(),
            service_code: String::new(),
            command: String::new(),
            dependencies: Vec::new(),
            expected_duration_minutes: minutes,
            tags: Vec::new(),
        }
    }

    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_command(
        mut self,
        service_code: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        self.service_code = service_code.into();
        self.command = command.into();
        self
    }
}

/// The unit of work submitted to the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Plan {
    pub plan_id: PlanId,
    #[serde(default)]
    pub actions: Vec<Action>,
    pub sla_minutes: u32,
    #[serde(default)]
    pub mode: PlanMode,
    #[serde(default = "default_true")]
    pub is_safe: bool,
}

fn default_true() -> bool {
    true
}

impl Plan {
    pub fn new(plan_id: impl Into<String>, sla_minutes: u32, actions: Vec<Action>) -> Self {
        Self {
            plan_id: plan_id.into(),
            actions,
            sla_minutes,
            mode: PlanMode::default(),
            is_safe: true,
        }
    }

    /// Structural checks. Cycles and dangling dependencies are left to the resolver.
    pub fn validate(&self) -> Result<(), OrchestratorError> {
        if self.plan_id.trim().is_empty() {
            return Err(OrchestratorError::InvalidPlan(
                "Plan id cannot be empty".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for action in &self.actions {
            if action.id.trim().is_empty() {
                return Err(OrchestratorError::InvalidPlan(format!(
                    "Plan {} contains an action with an empty id",
                    self.plan_id
                )));
            }
            if action.region.trim().is_empty() {
                return Err(OrchestratorError::InvalidPlan(format!(
                    "Action {} has no region",
                    action.id
                )));
            }
            if !seen.insert(action.id.as_str()) {
                return Err(OrchestratorError::InvalidPlan(format!(
                    "Duplicate action id: {}",
                    action.id
                )));
            }
        }
        Ok(())
    }

    pub fn regions(&self) -> BTreeSet<&str> {
        self.actions.iter().map(|a| a.region.as_str()).collect()
    }

    pub fn total_expected_minutes(&self) -> u64 {
        self.actions
            .iter()
            .map(|a| u64::from(a.expected_duration_minutes))
            .sum()
    }

    /// Same plan with its actions replaced by `actions` (used for strategy reorders).
    pub fn with_actions(&self, actions: Vec<Action>) -> Self {
        Self {
            actions,
            ..self.clone()
        }
    }

    /// Load a plan from a `.toml` or `.json` file.
    pub fn from_path(path: &Path) -> Result<Self, OrchestratorError> {
        let load_err = |message: String| OrchestratorError::PlanLoad {
            path: path.display().to_string(),
            message,
        };
        let raw = std::fs::read_to_string(path).map_err(|e| load_err(e.to_string()))?;
        let plan: Plan = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&raw).map_err(|e| load_err(e.to_string()))?,
            Some("toml") => toml::from_str(&raw).map_err(|e| load_err(e.to_string()))?,
            other => {
                return Err(load_err(format!(
                    "unsupported plan extension {:?} (expected .toml or .json)",
                    other.unwrap_or("")
                )))
            }
        };
        plan.validate()?;
        Ok(plan)
    }
}

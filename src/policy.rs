//! Policy gate: summarises an external evaluator's verdicts per run mode.
//!
//! Rule evaluation belongs to the [`PolicyEvaluator`] collaborator; this module
//! only aggregates check results and decides whether a plan may start.

use crate::plan::Plan;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a policy verdict affects execution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PolicyMode {
    /// Observe only; the gate always passes.
    Readonly,
    /// Verdict is reported but never blocks a run.
    #[default]
    Advisory,
    /// A denied verdict blocks the run from starting.
    Enforce,
}

impl PolicyMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PolicyMode::Readonly => "readonly",
            PolicyMode::Advisory => "advisory",
            PolicyMode::Enforce => "enforce",
        }
    }
}

impl fmt::Display for PolicyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "readonly" => Ok(PolicyMode::Readonly),
            "advisory" => Ok(PolicyMode::Advisory),
            "enforce" => Ok(PolicyMode::Enforce),
            other => Err(format!(
                "Invalid policy mode: {} (must be 'readonly', 'advisory', or 'enforce')",
                other
            )),
        }
    }
}

/// One rule check as reported by the evaluator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckResult {
    pub name: String,
    pub allowed: bool,
    #[serde(default)]
    pub violations: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    /// Contribution of this check to the plan's risk score.
    #[serde(default)]
    pub risk: f64,
}

impl CheckResult {
    pub fn pass(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            allowed: true,
            violations: Vec::new(),
            recommendations: Vec::new(),
            risk: 0.0,
        }
    }

    pub fn deny(name: impl Into<String>, violations: Vec<String>, risk: f64) -> Self {
        Self {
            name: name.into(),
            allowed: false,
            violations,
            recommendations: Vec::new(),
            risk,
        }
    }
}

/// External rule evaluator.
pub trait PolicyEvaluator: Send + Sync {
    fn evaluate_plan_policies(&self, plan: &Plan, mode: PolicyMode) -> Vec<CheckResult>;
}

/// Allows everything with zero risk.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissivePolicyEvaluator;

impl PolicyEvaluator for PermissivePolicyEvaluator {
    fn evaluate_plan_policies(&self, _plan: &Plan, _mode: PolicyMode) -> Vec<CheckResult> {
        vec![CheckResult::pass("permissive")]
    }
}

/// Returns a fixed set of checks regardless of plan.
#[derive(Debug, Clone, Default)]
pub struct StaticPolicyEvaluator {
    checks: Vec<CheckResult>,
}

impl StaticPolicyEvaluator {
    pub fn new(checks: Vec<CheckResult>) -> Self {
        Self { checks }
    }
}

impl PolicyEvaluator for StaticPolicyEvaluator {
    fn evaluate_plan_policies(&self, _plan: &Plan, _mode: PolicyMode) -> Vec<CheckResult> {
        self.checks.clone()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicySummary {
    pub allowed: bool,
    pub check_count: usize,
    pub violation_count: usize,
    pub risk_score: f64,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
}

pub fn evaluate_plan_policy(
    evaluator: &dyn PolicyEvaluator,
    plan: &Plan,
    mode: PolicyMode,
) -> PolicySummary {
    let checks = evaluator.evaluate_plan_policies(plan, mode);
    let allowed = checks.iter().all(|c| c.allowed);
    let violation_count = checks.iter().map(|c| c.violations.len()).sum();
    let risk_score = checks.iter().map(|c| c.risk).sum();
    let warnings = checks
        .iter()
        .flat_map(|c| c.violations.iter().map(move |v| format!("{}: {}", c.name, v)))
        .collect();
    let mut recommendations: Vec<String> = Vec::new();
    for rec in checks.iter().flat_map(|c| c.recommendations.iter()) {
        if !recommendations.contains(rec) {
            recommendations.push(rec.clone());
        }
    }
    PolicySummary {
        allowed,
        check_count: checks.len(),
        violation_count,
        risk_score,
        warnings,
        recommendations,
    }
}

pub fn policy_gate(evaluator: &dyn PolicyEvaluator, plan: &Plan, mode: PolicyMode) -> bool {
    match mode {
        PolicyMode::Readonly => true,
        PolicyMode::Advisory | PolicyMode::Enforce => {
            evaluate_plan_policy(evaluator, plan, mode).allowed
        }
    }
}

//! Run and event records produced by the scheduler.

use crate::plan::Action;
use crate::types::{ActionId, PlanId, RunId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl RunState {
    pub fn as_str(self) -> &'static str {
        match self {
            RunState::Pending => "pending",
            RunState::Running => "running",
            RunState::Completed => "completed",
            RunState::Failed => "failed",
            RunState::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunState::Completed | RunState::Failed | RunState::Cancelled
        )
    }
}

/// One execution attempt of a plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuntimeRun {
    pub run_id: RunId,
    pub plan_id: PlanId,
    pub state: RunState,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub active_action_ids: Vec<ActionId>,
    pub completed_actions: Vec<Action>,
    pub failed_actions: Vec<Action>,
}

impl RuntimeRun {
    pub fn new(run_id: RunId, plan_id: PlanId) -> Self {
        Self {
            run_id,
            plan_id,
            state: RunState::Pending,
            started_at: Utc::now(),
            finished_at: None,
            active_action_ids: Vec::new(),
            completed_actions: Vec::new(),
            failed_actions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Queued,
    Completed,
    Failed,
    Cancelled,
    /// Run-level informational event carrying the forecast readiness.
    Info,
}

impl EventStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EventStatus::Queued => "queued",
            EventStatus::Completed => "completed",
            EventStatus::Failed => "failed",
            EventStatus::Cancelled => "cancelled",
            EventStatus::Info => "info",
        }
    }
}

/// Append-only record of an action state transition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandEvent {
    pub plan_id: PlanId,
    /// Empty for run-level [`EventStatus::Info`] events.
    pub action_id: ActionId,
    pub run_id: RunId,
    pub status: EventStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readiness: Option<f64>,
    pub emitted_at: DateTime<Utc>,
}

impl CommandEvent {
    pub fn for_action(
        run: &RuntimeRun,
        action_id: &str,
        status: EventStatus,
        message: Option<String>,
    ) -> Self {
        Self {
            plan_id: run.plan_id.clone(),
            action_id: action_id.to_string(),
            run_id: run.run_id.clone(),
            status,
            message,
            readiness: None,
            emitted_at: Utc::now(),
        }
    }

    pub fn summary(run: &RuntimeRun, readiness: f64, message: String) -> Self {
        Self {
            plan_id: run.plan_id.clone(),
            action_id: String::new(),
            run_id: run.run_id.clone(),
            status: EventStatus::Info,
            message: Some(message),
            readiness: Some(readiness),
            emitted_at: Utc::now(),
        }
    }

    pub fn is_summary(&self) -> bool {
        self.status == EventStatus::Info
    }
}

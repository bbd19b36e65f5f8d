//! Action Adapter
//!
//! Port for the side-effecting system that actually carries out remediation
//! commands, plus a simulated implementation used by the binary and tests.

use crate::error::AdapterError;
use crate::plan::Action;
use crate::types::CommandId;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispatchReceipt {
    pub command_id: CommandId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DryRunReceipt {
    pub command_id: CommandId,
    pub eta_minutes: u32,
}

/// Side-effecting executor for plan actions.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Start the action's command.
    async fn dispatch(&self, action: &Action) -> Result<DispatchReceipt, AdapterError>;

    /// Whether [`Adapter::dry_run`] is implemented.
    fn supports_dry_run(&self) -> bool {
        false
    }

    /// Validate the command without side effects.
    async fn dry_run(&self, _action: &Action) -> Result<DryRunReceipt, AdapterError> {
        Err(AdapterError::Unsupported("dry-run".to_string()))
    }

    /// Ask the target system to stop a dispatched command.
    async fn stop(&self, command_id: &str) -> Result<bool, AdapterError>;
}

/// Adapter that records commands instead of executing them.
///
/// Actions listed via [`SimulatedAdapter::fail_action`] fail on every dispatch;
/// [`SimulatedAdapter::fail_first`] makes an action fail a fixed number of
/// times before succeeding.
#[derive(Debug, Default)]
pub struct SimulatedAdapter {
    next_id: AtomicU64,
    always_fail: Mutex<HashSet<String>>,
    transient: Mutex<Vec<(String, usize)>>,
    dispatched: Mutex<Vec<String>>,
    stopped: Mutex<Vec<CommandId>>,
}

impl SimulatedAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_action(self, action_id: impl Into<String>) -> Self {
        self.always_fail.lock().insert(action_id.into());
        self
    }

    pub fn fail_first(self, action_id: impl Into<String>, times: usize) -> Self {
        self.transient.lock().push((action_id.into(), times));
        self
    }

    /// Action ids in dispatch order, one entry per call.
    pub fn dispatched(&self) -> Vec<String> {
        self.dispatched.lock().clone()
    }

    pub fn stopped(&self) -> Vec<CommandId> {
        self.stopped.lock().clone()
    }

    fn next_command_id(&self) -> CommandId {
        let seq = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        format!("cmd-{seq:06}")
    }

    fn should_fail(&self, action_id: &str) -> bool {
        if self.always_fail.lock().contains(action_id) {
            return true;
        }
        let mut transient = self.transient.lock();
        if let Some(entry) = transient.iter_mut().find(|(id, _)| id == action_id) {
            if entry.1 > 0 {
                entry.1 -= 1;
                return true;
            }
        }
        false
    }
}

#[async_trait]
impl Adapter for SimulatedAdapter {
    async fn dispatch(&self, action: &Action) -> Result<DispatchReceipt, AdapterError> {
        self.dispatched.lock().push(action.id.clone());
        if self.should_fail(&action.id) {
            return Err(AdapterError::DispatchFailed(format!(
                "simulated failure for {}",
                action.id
            )));
        }
        let command_id = self.next_command_id();
        info!(
            action_id = %action.id,
            region = %action.region,
            service_code = %action.service_code,
            command_id = %command_id,
            "dispatched simulated command"
        );
        Ok(DispatchReceipt { command_id })
    }

    fn supports_dry_run(&self) -> bool {
        true
    }

    async fn dry_run(&self, action: &Action) -> Result<DryRunReceipt, AdapterError> {
        let command_id = self.next_command_id();
        debug!(action_id = %action.id, command_id = %command_id, "simulated dry run");
        Ok(DryRunReceipt {
            command_id,
            eta_minutes: action.expected_duration_minutes,
        })
    }

    async fn stop(&self, command_id: &str) -> Result<bool, AdapterError> {
        self.stopped.lock().push(command_id.to_string());
        Ok(true)
    }
}

//! Retrying dispatcher: drives one action through an adapter with bounded retries.

use crate::adapter::Adapter;
use crate::error::AdapterError;
use crate::plan::Action;
use crate::types::CommandId;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Outcome of a single dispatch attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttemptResult {
    /// 1-based attempt number.
    pub attempt: usize,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_id: Option<CommandId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AttemptResult {
    fn success(attempt: usize, command_id: CommandId, eta_minutes: Option<u32>) -> Self {
        Self {
            attempt,
            ok: true,
            command_id: Some(command_id),
            eta_minutes,
            error: None,
        }
    }

    fn failure(attempt: usize, error: &AdapterError) -> Self {
        Self {
            attempt,
            ok: false,
            command_id: None,
            eta_minutes: None,
            error: Some(error.to_string()),
        }
    }
}

/// Calls `dispatch_fn` up to `max_retries + 1` times, stopping at the first ok
/// attempt. Returns the full attempt history.
pub async fn execute_with_retries<F, Fut>(
    action: &Action,
    mut dispatch_fn: F,
    max_retries: usize,
) -> Vec<AttemptResult>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = AttemptResult>,
{
    let mut attempts = Vec::with_capacity(max_retries + 1);
    for attempt in 1..=max_retries + 1 {
        let result = dispatch_fn(attempt).await;
        let ok = result.ok;
        if !ok {
            debug!(
                action_id = %action.id,
                attempt,
                error = result.error.as_deref().unwrap_or(""),
                "dispatch attempt failed"
            );
        }
        attempts.push(result);
        if ok {
            break;
        }
    }
    attempts
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchContext {
    pub dry_run: bool,
}

/// Dispatcher with the retry delay and dry-run switch applied to every action.
#[derive(Debug, Clone, Default)]
pub struct RetryingDispatcher {
    context: DispatchContext,
    retry_delay: Duration,
}

impl RetryingDispatcher {
    pub fn new(context: DispatchContext, retry_delay: Duration) -> Self {
        Self {
            context,
            retry_delay,
        }
    }

    /// Whether `adapter` is driven through dry-run rather than real dispatch.
    pub fn uses_dry_run(&self, adapter: &dyn Adapter) -> bool {
        self.context.dry_run && adapter.supports_dry_run()
    }

    pub async fn dispatch(
        &self,
        adapter: &dyn Adapter,
        action: &Action,
        max_retries: usize,
    ) -> Vec<AttemptResult> {
        let use_dry_run = self.uses_dry_run(adapter);
        let delay = self.retry_delay;
        let attempts = execute_with_retries(
            action,
            |attempt| async move {
                if attempt > 1 && !delay.is_zero() {
                    sleep(delay).await;
                }
                if use_dry_run {
                    // Dry-run responses count as ok whatever they contain.
                    match adapter.dry_run(action).await {
                        Ok(receipt) => AttemptResult::success(
                            attempt,
                            receipt.command_id,
                            Some(receipt.eta_minutes),
                        ),
                        Err(err) => AttemptResult {
                            attempt,
                            ok: true,
                            command_id: None,
                            eta_minutes: None,
                            error: Some(err.to_string()),
                        },
                    }
                } else {
                    match adapter.dispatch(action).await {
                        Ok(receipt) => AttemptResult::success(attempt, receipt.command_id, None),
                        Err(err) => AttemptResult::failure(attempt, &err),
                    }
                }
            },
            max_retries,
        )
        .await;

        if attempts.last().map(|a| !a.ok).unwrap_or(true) {
            warn!(
                action_id = %action.id,
                region = %action.region,
                attempts = attempts.len(),
                "dispatch failed after all attempts"
            );
        } else if attempts.len() > 1 {
            debug!(
                action_id = %action.id,
                attempts = attempts.len(),
                "dispatch succeeded after retry"
            );
        }
        attempts
    }
}

//! Region-bounded scheduler.
//!
//! Turns a validated plan into a run: policy gate, dependency ordering, one
//! dispatch at a time under a per-region cap, then a final persist and a
//! forecast summary event. Runs can be cancelled cooperatively through
//! [`Orchestrator::abort`].

mod control;
mod health;
mod slots;

pub use health::estimate_health;
pub use slots::RegionSlots;

use crate::adapter::Adapter;
use crate::config::OrchestratorConfig;
use crate::dispatch::{DispatchContext, RetryingDispatcher};
use crate::error::OrchestratorError;
use crate::forecast::{ReadinessProjector, SlaReadinessProjector};
use crate::plan::{Action, Plan};
use crate::policy::{evaluate_plan_policy, PermissivePolicyEvaluator, PolicyEvaluator, PolicyMode};
use crate::resolver::{resolve_execution_order, ExecutionOrder};
use crate::run::{CommandEvent, EventStatus, RunState, RuntimeRun};
use crate::simulation::SimulationEngine;
use crate::store::RunStore;
use crate::strategy::{build_execution_strategy, Strategy};
use crate::types::{new_run_id, RunId};
use chrono::Utc;
use control::RunControl;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Failure message for actions whose expected duration exceeds the run limit.
pub const DURATION_OVER_LIMIT: &str = "Expected duration over limit";

const ABORTED_BEFORE_DISPATCH: &str = "Run aborted before dispatch";

/// Forecast attached to every finished run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastSummary {
    pub readiness: f64,
    pub estimated_minutes: u64,
    pub strategy: Strategy,
    pub critical_warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartOutcome {
    pub run: RuntimeRun,
    /// Every event published for the run, summary last.
    pub events: Vec<CommandEvent>,
    /// Highest concurrent active count observed per region.
    pub region_peaks: BTreeMap<String, usize>,
    pub forecast: ForecastSummary,
}

/// Assembles an [`Orchestrator`]. The adapter and store are required.
#[derive(Default)]
pub struct OrchestratorBuilder {
    config: Option<OrchestratorConfig>,
    adapter: Option<Arc<dyn Adapter>>,
    store: Option<Arc<dyn RunStore>>,
    policy: Option<Arc<dyn PolicyEvaluator>>,
    projector: Option<Arc<dyn ReadinessProjector>>,
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_adapter(mut self, adapter: Arc<dyn Adapter>) -> Self {
        self.adapter = Some(adapter);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn RunStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_policy(mut self, policy: Arc<dyn PolicyEvaluator>) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn with_projector(mut self, projector: Arc<dyn ReadinessProjector>) -> Self {
        self.projector = Some(projector);
        self
    }

    pub fn build(self) -> Result<Orchestrator, OrchestratorError> {
        let adapter = self.adapter.ok_or(OrchestratorError::NotInitialized)?;
        let store = self.store.ok_or(OrchestratorError::NotInitialized)?;
        let config = self.config.unwrap_or_default();
        config.validate().map_err(OrchestratorError::ConfigError)?;

        let policy = self
            .policy
            .unwrap_or_else(|| Arc::new(PermissivePolicyEvaluator));
        let projector = self
            .projector
            .unwrap_or_else(|| Arc::new(SlaReadinessProjector));
        let dispatcher = RetryingDispatcher::new(
            DispatchContext {
                dry_run: config.dry_run,
            },
            config.retry_policy.delay(),
        );

        Ok(Orchestrator {
            simulation: SimulationEngine::new(projector, Arc::clone(&policy)),
            config,
            adapter,
            store,
            policy,
            dispatcher,
            live: Mutex::new(HashMap::new()),
        })
    }
}

/// Executes plans against an adapter and records runs in a store.
///
/// Share as `Arc<Orchestrator>` to abort from another task while `start` runs.
pub struct Orchestrator {
    config: OrchestratorConfig,
    adapter: Arc<dyn Adapter>,
    store: Arc<dyn RunStore>,
    policy: Arc<dyn PolicyEvaluator>,
    simulation: SimulationEngine,
    dispatcher: RetryingDispatcher,
    live: Mutex<HashMap<RunId, Arc<RunControl>>>,
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Run a plan to completion.
    ///
    /// Fails without persisting anything when the policy gate denies the plan
    /// in enforce mode or the plan is structurally invalid. Per-action
    /// failures never abort the run.
    pub async fn start(&self, plan: &Plan) -> Result<StartOutcome, OrchestratorError> {
        let policy = evaluate_plan_policy(self.policy.as_ref(), plan, self.config.policy_mode);
        if !policy.allowed {
            if self.config.policy_mode == PolicyMode::Enforce {
                warn!(
                    plan_id = %plan.plan_id,
                    violations = policy.violation_count,
                    "plan denied by policy"
                );
                return Err(OrchestratorError::PolicyDenied(policy.violation_count));
            }
            for warning in &policy.warnings {
                info!(plan_id = %plan.plan_id, mode = %self.config.policy_mode, %warning, "policy violation");
            }
        }
        plan.validate()?;

        let mut run = RuntimeRun::new(new_run_id(), plan.plan_id.clone());
        run.state = RunState::Running;
        let run_id = run.run_id.clone();

        // Registered before the first persist so an abort never sees a
        // running run without its control.
        let control = Arc::new(RunControl::default());
        self.live.lock().insert(run_id.clone(), Arc::clone(&control));
        if let Err(err) = self.store.upsert_run(&run).await {
            self.live.lock().remove(&run_id);
            return Err(err.into());
        }
        info!(
            plan_id = %plan.plan_id,
            run_id = %run_id,
            actions = plan.actions.len(),
            "run started"
        );

        let outcome = self.drive(plan, run, &control).await;
        self.live.lock().remove(&run_id);
        outcome
    }

    async fn drive(
        &self,
        plan: &Plan,
        mut run: RuntimeRun,
        control: &RunControl,
    ) -> Result<StartOutcome, OrchestratorError> {
        let mut queue = self.execution_queue(plan);
        let mut slots = RegionSlots::new(self.config.parallelism);
        let mut events = Vec::with_capacity(plan.actions.len() * 2 + 1);
        let retries = self.config.retry_policy.retries();
        let dry_run = self.dispatcher.uses_dry_run(self.adapter.as_ref());

        while let Some(action) = queue.pop_front() {
            if control.is_cancelled() {
                events.push(CommandEvent::for_action(
                    &run,
                    &action.id,
                    EventStatus::Cancelled,
                    Some(ABORTED_BEFORE_DISPATCH.to_string()),
                ));
                continue;
            }
            if !slots.try_acquire(&action.region) {
                queue.push_back(action);
                continue;
            }

            run.active_action_ids.push(action.id.clone());
            events.push(CommandEvent::for_action(
                &run,
                &action.id,
                EventStatus::Queued,
                None,
            ));
            debug!(
                run_id = %run.run_id,
                action_id = %action.id,
                region = %action.region,
                "dispatching action"
            );

            let attempts = self
                .dispatcher
                .dispatch(self.adapter.as_ref(), &action, retries)
                .await;
            slots.release(&action.region);

            let last = attempts.last();
            if !dry_run {
                if let Some(command_id) = last.filter(|a| a.ok).and_then(|a| a.command_id.clone()) {
                    if control.record_command(command_id.clone()) {
                        self.stop_command(&command_id).await;
                    }
                }
            }

            let failure = if action.expected_duration_minutes > self.config.max_runtime_minutes {
                Some(DURATION_OVER_LIMIT.to_string())
            } else {
                match last {
                    Some(attempt) if attempt.ok => None,
                    Some(attempt) => Some(
                        attempt
                            .error
                            .clone()
                            .unwrap_or_else(|| "dispatch failed".to_string()),
                    ),
                    None => Some("dispatch produced no attempts".to_string()),
                }
            };

            run.active_action_ids.retain(|id| id != &action.id);
            match failure {
                None => {
                    events.push(CommandEvent::for_action(
                        &run,
                        &action.id,
                        EventStatus::Completed,
                        Some(format!("completed after {} attempt(s)", attempts.len())),
                    ));
                    run.completed_actions.push(action);
                }
                Some(message) => {
                    warn!(
                        run_id = %run.run_id,
                        action_id = %action.id,
                        attempts = attempts.len(),
                        error = %message,
                        "action failed"
                    );
                    events.push(CommandEvent::for_action(
                        &run,
                        &action.id,
                        EventStatus::Failed,
                        Some(message),
                    ));
                    run.failed_actions.push(action);
                }
            }
        }

        run.state = if control.finalize() {
            RunState::Cancelled
        } else if !run.failed_actions.is_empty() {
            RunState::Failed
        } else {
            RunState::Completed
        };
        run.finished_at = Some(Utc::now());

        let run = self.store.upsert_run(&run).await?;
        for event in &events {
            self.store.publish_event(event).await?;
        }

        let forecast = self.forecast(plan);
        let summary = CommandEvent::summary(
            &run,
            forecast.readiness,
            format!(
                "run {}: {} completed, {} failed, forecast readiness {:.1}",
                run.state.as_str(),
                run.completed_actions.len(),
                run.failed_actions.len(),
                forecast.readiness
            ),
        );
        self.store.publish_event(&summary).await?;
        events.push(summary);

        info!(
            plan_id = %run.plan_id,
            run_id = %run.run_id,
            state = run.state.as_str(),
            completed = run.completed_actions.len(),
            failed = run.failed_actions.len(),
            "run finished"
        );

        Ok(StartOutcome {
            run,
            events,
            region_peaks: slots.into_peaks(),
            forecast,
        })
    }

    /// Dependency order, with duration-first randomized tie-breaking when
    /// several regions compete for slots. Unresolvable plans keep plan order.
    fn execution_queue(&self, plan: &Plan) -> VecDeque<Action> {
        let ordered = match resolve_execution_order(&plan.actions) {
            ExecutionOrder::Ordered(actions) => actions,
            ExecutionOrder::Unresolved {
                actions,
                blocked,
                dangling,
            } => {
                warn!(
                    plan_id = %plan.plan_id,
                    blocked = ?blocked,
                    dangling = ?dangling,
                    "dependencies unresolved, falling back to plan order"
                );
                return actions.into();
            }
        };

        if self.config.parallelism > 1 && plan.regions().len() > 1 {
            let mut rng = match self.config.shuffle_seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            return shuffle_across_regions(ordered, &mut rng).into();
        }
        ordered.into()
    }

    fn forecast(&self, plan: &Plan) -> ForecastSummary {
        let simulated = self.simulation.simulate_plan(plan);
        let strategy = Strategy::default();
        let execution = build_execution_strategy(plan, strategy, self.policy.as_ref());
        ForecastSummary {
            readiness: simulated.readiness_after_run,
            estimated_minutes: execution.estimated_minutes,
            strategy,
            critical_warnings: simulated.critical_warnings,
        }
    }

    /// Cancel a run.
    ///
    /// Returns `Ok(false)` when the run is already terminal or a cancellation
    /// is already pending. A run driven by this orchestrator is finalized by
    /// its own loop once the in-flight dispatch returns; any other
    /// non-terminal run is marked cancelled directly.
    pub async fn abort(&self, run_id: &str) -> Result<bool, OrchestratorError> {
        let Some(mut run) = self.store.get_run(run_id).await? else {
            return Err(OrchestratorError::RunNotFound(run_id.to_string()));
        };
        if run.state.is_terminal() {
            debug!(run_id, state = run.state.as_str(), "abort ignored for finished run");
            return Ok(false);
        }

        let control = self.live.lock().get(run_id).cloned();
        match control {
            Some(control) => {
                let Some(commands) = control.request_cancel() else {
                    return Ok(false);
                };
                info!(run_id, dispatched = commands.len(), "cancellation requested");
                for command_id in &commands {
                    self.stop_command(command_id).await;
                }
            }
            None => {
                run.state = RunState::Cancelled;
                run.finished_at = Some(Utc::now());
                run.active_action_ids.clear();
                self.store.upsert_run(&run).await?;
                info!(run_id, "run marked cancelled");
            }
        }
        Ok(true)
    }

    async fn stop_command(&self, command_id: &str) {
        match self.adapter.stop(command_id).await {
            Ok(stopped) => debug!(command_id, stopped, "stop requested"),
            Err(err) => warn!(command_id, error = %err, "failed to stop command"),
        }
    }

    pub fn estimate_health(&self, plan: &Plan) -> f64 {
        estimate_health(plan, self.policy.as_ref())
    }

    /// Runs recorded for a plan, newest first.
    pub async fn runs(&self, plan_id: &str) -> Result<Vec<RuntimeRun>, OrchestratorError> {
        Ok(self.store.list_runs(plan_id).await?)
    }

    /// Latest `limit` events for a plan, oldest first.
    pub async fn events(
        &self,
        plan_id: &str,
        limit: usize,
    ) -> Result<Vec<CommandEvent>, OrchestratorError> {
        Ok(self.store.get_events(plan_id, limit).await?)
    }
}

/// Sort by dependency depth, then duration, then a random key. Keeps every
/// action behind its dependencies.
fn shuffle_across_regions<R: Rng>(ordered: Vec<Action>, rng: &mut R) -> Vec<Action> {
    let mut depth: HashMap<String, usize> = HashMap::with_capacity(ordered.len());
    for action in &ordered {
        let level = action
            .dependencies
            .iter()
            .filter_map(|dep| depth.get(dep))
            .map(|level| level + 1)
            .max()
            .unwrap_or(0);
        depth.insert(action.id.clone(), level);
    }

    let mut keyed: Vec<(usize, u32, u64, Action)> = ordered
        .into_iter()
        .map(|action| {
            let level = depth.get(&action.id).copied().unwrap_or(0);
            (level, action.expected_duration_minutes, rng.gen(), action)
        })
        .collect();
    keyed.sort_by_key(|(level, minutes, key, _)| (*level, *minutes, *key));
    keyed.into_iter().map(|(_, _, _, action)| action).collect()
}

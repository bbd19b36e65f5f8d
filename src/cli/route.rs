//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::adapter::SimulatedAdapter;
use crate::cli::output::to_json;
use crate::cli::parse::{Commands, OutputFormat};
use crate::cli::presentation::{
    format_comparison_text, format_events_text, format_health_text, format_route_text,
    format_run_outcome_text, format_runs_text, format_simulation_text,
};
use crate::cli::command_name;
use crate::config::{ConfigLoader, MendConfig};
use crate::error::{OrchestratorError, StorageError};
use crate::forecast::{GraphDependencyInsight, SlaReadinessProjector};
use crate::orchestrator::{estimate_health, Orchestrator};
use crate::plan::Plan;
use crate::policy::{PermissivePolicyEvaluator, PolicyEvaluator};
use crate::router::QualityRouter;
use crate::simulation::SimulationEngine;
use crate::store::{RunStore, SledRunStore};
use parking_lot::Mutex;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Runtime;
use tracing::info;

/// Runtime context for CLI execution: workspace, loaded config and the async runtime.
pub struct RunContext {
    workspace_root: PathBuf,
    config: MendConfig,
    policy: Arc<dyn PolicyEvaluator>,
    runtime: Runtime,
    store: Mutex<Option<Arc<SledRunStore>>>,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, OrchestratorError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            OrchestratorError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| OrchestratorError::ConfigError(format!("Failed to start runtime: {}", e)))?;

        Ok(Self {
            workspace_root,
            config,
            policy: Arc::new(PermissivePolicyEvaluator),
            runtime,
            store: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &MendConfig {
        &self.config
    }

    /// Store path, resolved against the workspace root when relative.
    pub fn store_path(&self) -> PathBuf {
        let path = &self.config.storage.store_path;
        if path.is_absolute() {
            path.clone()
        } else {
            self.workspace_root.join(path)
        }
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, OrchestratorError> {
        let started = Instant::now();
        let result = self.execute_inner(command);
        info!(
            command = command_name(command),
            ok = result.is_ok(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "command finished"
        );
        result
    }

    /// Opened on first use; plan-only commands never create the store.
    fn store(&self) -> Result<Arc<SledRunStore>, OrchestratorError> {
        let mut slot = self.store.lock();
        if let Some(store) = slot.as_ref() {
            return Ok(Arc::clone(store));
        }
        let store_path = self.store_path();
        std::fs::create_dir_all(&store_path).map_err(StorageError::IoError)?;
        let store = Arc::new(SledRunStore::open(&store_path)?);
        *slot = Some(Arc::clone(&store));
        Ok(store)
    }

    fn simulation(&self) -> SimulationEngine {
        SimulationEngine::new(Arc::new(SlaReadinessProjector), Arc::clone(&self.policy))
    }

    fn execute_inner(&self, command: &Commands) -> Result<String, OrchestratorError> {
        match command {
            Commands::Simulate { plan, format } => {
                let plan = load_plan(plan)?;
                let result = self.simulation().simulate_plan(&plan);
                if *format == OutputFormat::Json {
                    to_json(&result)
                } else {
                    Ok(format_simulation_text(&result))
                }
            }
            Commands::Compare {
                plan,
                strategy,
                format,
            } => {
                let plan = load_plan(plan)?;
                let comparison = self
                    .runtime
                    .block_on(self.simulation().compare_simulation_strategies(&plan));
                if *format == OutputFormat::Json {
                    to_json(&comparison)
                } else {
                    Ok(format_comparison_text(&comparison, *strategy))
                }
            }
            Commands::Route { plans, format } => {
                let plans = plans
                    .iter()
                    .map(|p| load_plan(p))
                    .collect::<Result<Vec<_>, _>>()?;
                let router = QualityRouter::new(
                    Arc::clone(&self.policy),
                    Arc::new(GraphDependencyInsight::default()),
                    Arc::new(SlaReadinessProjector),
                );
                let decisions = router.compare_plans(&plans);
                if *format == OutputFormat::Json {
                    to_json(&decisions)
                } else {
                    Ok(format_route_text(&decisions))
                }
            }
            Commands::Health { plan, format } => {
                let plan = load_plan(plan)?;
                let score = estimate_health(&plan, self.policy.as_ref());
                if *format == OutputFormat::Json {
                    to_json(&json!({ "plan_id": plan.plan_id, "health": score }))
                } else {
                    Ok(format_health_text(&plan.plan_id, score))
                }
            }
            Commands::Run {
                plan,
                dry_run,
                policy_mode,
                seed,
                fail,
                format,
            } => {
                let plan = load_plan(plan)?;
                let mut config = self.config.orchestrator.clone();
                config.dry_run |= *dry_run;
                if let Some(mode) = policy_mode {
                    config.policy_mode = *mode;
                }
                if seed.is_some() {
                    config.shuffle_seed = *seed;
                }
                let adapter = fail
                    .iter()
                    .fold(SimulatedAdapter::new(), |adapter, id| adapter.fail_action(id.clone()));

                let store = self.store()?;
                let orchestrator = Orchestrator::builder()
                    .with_config(config)
                    .with_adapter(Arc::new(adapter))
                    .with_store(store.clone())
                    .with_policy(Arc::clone(&self.policy))
                    .build()?;
                let outcome = self.runtime.block_on(orchestrator.start(&plan));
                store.flush()?;
                let outcome = outcome?;
                if *format == OutputFormat::Json {
                    to_json(&outcome)
                } else {
                    Ok(format_run_outcome_text(&outcome))
                }
            }
            Commands::Runs { plan_id, format } => {
                let store = self.store()?;
                let runs = self.runtime.block_on(store.list_runs(plan_id))?;
                if *format == OutputFormat::Json {
                    to_json(&runs)
                } else {
                    Ok(format_runs_text(&runs))
                }
            }
            Commands::Events {
                plan_id,
                limit,
                format,
            } => {
                let store = self.store()?;
                let events = self.runtime.block_on(store.get_events(plan_id, *limit))?;
                if *format == OutputFormat::Json {
                    to_json(&events)
                } else {
                    Ok(format_events_text(&events))
                }
            }
            Commands::Abort { run_id } => {
                let store = self.store()?;
                let orchestrator = Orchestrator::builder()
                    .with_config(self.config.orchestrator.clone())
                    .with_adapter(Arc::new(SimulatedAdapter::new()))
                    .with_store(store.clone())
                    .build()?;
                let cancelled = self.runtime.block_on(orchestrator.abort(run_id))?;
                store.flush()?;
                Ok(if cancelled {
                    format!("Run {} cancelled", run_id)
                } else {
                    format!("Run {} already finished; nothing to cancel", run_id)
                })
            }
        }
    }
}

fn load_plan(path: &Path) -> Result<Plan, OrchestratorError> {
    Plan::from_path(path)
}

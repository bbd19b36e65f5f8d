//! End-to-end scheduler runs against the sled-backed store

use mend::adapter::SimulatedAdapter;
use mend::config::OrchestratorConfig;
use mend::plan::{Action, Plan};
use mend::policy::{CheckResult, PolicyMode, StaticPolicyEvaluator};
use mend::run::{EventStatus, RunState};
use mend::store::{RunStore, SledRunStore};
use mend::{Orchestrator, OrchestratorError};
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;

use crate::integration::test_utils::{failover_plan, ids};

fn seeded_config() -> OrchestratorConfig {
    OrchestratorConfig {
        shuffle_seed: Some(7),
        ..OrchestratorConfig::default()
    }
}

fn assert_dependency_safe(plan: &Plan, order: &[String]) {
    let position: HashMap<&str, usize> = order
        .iter()
        .enumerate()
        .map(|(index, id)| (id.as_str(), index))
        .collect();
    for action in &plan.actions {
        for dep in &action.dependencies {
            assert!(
                position[dep.as_str()] < position[action.id.as_str()],
                "{} dispatched before its dependency {}",
                action.id,
                dep
            );
        }
    }
}

#[tokio::test]
async fn test_run_persists_across_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let store_path = temp_dir.path().join("store");
    let plan = failover_plan();
    let adapter = Arc::new(SimulatedAdapter::new());

    let run_id = {
        let store = Arc::new(SledRunStore::open(&store_path).unwrap());
        let orchestrator = Orchestrator::builder()
            .with_config(seeded_config())
            .with_adapter(adapter.clone())
            .with_store(store.clone())
            .build()
            .unwrap();

        let outcome = orchestrator.start(&plan).await.unwrap();
        assert_eq!(outcome.run.state, RunState::Completed);
        assert_eq!(outcome.run.completed_actions.len(), 4);
        assert!(outcome.run.active_action_ids.is_empty());
        assert!(outcome.run.finished_at.is_some());
        assert!(outcome.region_peaks.values().all(|peak| *peak <= 2));
        assert_dependency_safe(&plan, &adapter.dispatched());
        assert_dependency_safe(&plan, &ids(&outcome.run.completed_actions));

        store.flush().unwrap();
        outcome.run.run_id
    };

    let store = SledRunStore::open(&store_path).unwrap();
    let runs = store.list_runs("failover").await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].run_id, run_id);
    assert_eq!(runs[0].state, RunState::Completed);
    let promote = runs[0]
        .completed_actions
        .iter()
        .find(|a| a.id == "promote")
        .unwrap();
    assert_eq!(promote.service_code, "rds");
    assert_eq!(promote.command, "promote-replica");

    // queued + completed per action, then the summary
    let events = store.get_events("failover", 100).await.unwrap();
    assert_eq!(events.len(), 9);
    assert!(events.iter().all(|e| e.run_id == run_id));
    let summary = events.last().unwrap();
    assert_eq!(summary.status, EventStatus::Info);
    assert!(summary.readiness.is_some());
}

#[tokio::test]
async fn test_failed_action_does_not_stop_the_run() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(SledRunStore::open(temp_dir.path()).unwrap());
    let adapter = Arc::new(SimulatedAdapter::new().fail_action("promote"));
    let orchestrator = Orchestrator::builder()
        .with_config(seeded_config())
        .with_adapter(adapter.clone())
        .with_store(store.clone())
        .build()
        .unwrap();

    let outcome = orchestrator.start(&failover_plan()).await.unwrap();
    assert_eq!(outcome.run.state, RunState::Failed);
    assert_eq!(ids(&outcome.run.failed_actions), vec!["promote"]);
    assert_eq!(outcome.run.completed_actions.len(), 3);

    // one attempt plus the two default retries
    let promote_attempts = adapter
        .dispatched()
        .iter()
        .filter(|id| id.as_str() == "promote")
        .count();
    assert_eq!(promote_attempts, 3);

    let failed: Vec<_> = outcome
        .events
        .iter()
        .filter(|e| e.status == EventStatus::Failed)
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].action_id, "promote");

    let stored = store.get_run(&outcome.run.run_id).await.unwrap().unwrap();
    assert_eq!(stored, outcome.run);
}

#[tokio::test]
async fn test_enforce_mode_denial_persists_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(SledRunStore::open(temp_dir.path()).unwrap());
    let adapter = Arc::new(SimulatedAdapter::new());
    let evaluator = StaticPolicyEvaluator::new(vec![CheckResult::deny(
        "change-window",
        vec!["outside window".to_string(), "no approver".to_string()],
        0.5,
    )]);
    let orchestrator = Orchestrator::builder()
        .with_config(OrchestratorConfig {
            policy_mode: PolicyMode::Enforce,
            ..seeded_config()
        })
        .with_adapter(adapter.clone())
        .with_store(store.clone())
        .with_policy(Arc::new(evaluator))
        .build()
        .unwrap();

    let err = orchestrator.start(&failover_plan()).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::PolicyDenied(2)));
    assert_eq!(err.to_string(), "policy-denied:2");
    assert!(adapter.dispatched().is_empty());
    assert!(store.list_runs("failover").await.unwrap().is_empty());
    assert!(store.get_events("failover", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_history_is_newest_first() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(SledRunStore::open(temp_dir.path()).unwrap());
    let orchestrator = Orchestrator::builder()
        .with_config(seeded_config())
        .with_adapter(Arc::new(SimulatedAdapter::new()))
        .with_store(store.clone())
        .build()
        .unwrap();

    let plan = Plan::new("single", 30, vec![Action::new("only", "us-east", 5)]);
    let first = orchestrator.start(&plan).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = orchestrator.start(&plan).await.unwrap();

    let runs = orchestrator.runs("single").await.unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].run_id, second.run.run_id);
    assert_eq!(runs[1].run_id, first.run.run_id);

    let events = orchestrator.events("single", 3).await.unwrap();
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|e| e.run_id == second.run.run_id));
}

#[tokio::test]
async fn test_abort_of_finished_run_is_a_no_op() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(SledRunStore::open(temp_dir.path()).unwrap());
    let orchestrator = Orchestrator::builder()
        .with_adapter(Arc::new(SimulatedAdapter::new()))
        .with_store(store.clone())
        .build()
        .unwrap();

    let outcome = orchestrator.start(&failover_plan()).await.unwrap();
    assert!(!orchestrator.abort(&outcome.run.run_id).await.unwrap());
    let stored = store.get_run(&outcome.run.run_id).await.unwrap().unwrap();
    assert_eq!(stored.state, RunState::Completed);

    let err = orchestrator.abort("run-missing").await.unwrap_err();
    assert!(matches!(err, OrchestratorError::RunNotFound(_)));
}

//! Dependency-ordering properties of the resolver and the scheduler queue

use mend::adapter::SimulatedAdapter;
use mend::config::OrchestratorConfig;
use mend::plan::{Action, Plan};
use mend::resolver::{resolve_execution_order, resolve_execution_order_or_fallback, ExecutionOrder};
use mend::store::MemoryRunStore;
use mend::Orchestrator;
use proptest::prelude::*;
use proptest::sample::Index;
use std::collections::HashMap;
use std::sync::Arc;

const REGIONS: [&str; 3] = ["us-east", "eu-west", "ap-south"];

/// Acyclic action lists: action `i` may only depend on actions `< i`, then the
/// list is shuffled so plan order says nothing about dependency order.
fn acyclic_actions() -> impl Strategy<Value = Vec<Action>> {
    (1usize..12)
        .prop_flat_map(|n| {
            (
                prop::collection::vec(prop::collection::vec(any::<Index>(), 0..3), n),
                prop::collection::vec(0usize..REGIONS.len(), n),
                prop::collection::vec(1u32..60, n),
                Just((0..n).collect::<Vec<usize>>()).prop_shuffle(),
            )
        })
        .prop_map(|(deps, regions, minutes, permutation)| {
            let actions: Vec<Action> = deps
                .iter()
                .enumerate()
                .map(|(i, picks)| {
                    let mut dependencies: Vec<String> = if i == 0 {
                        Vec::new()
                    } else {
                        picks.iter().map(|pick| format!("a{}", pick.index(i))).collect()
                    };
                    dependencies.sort();
                    dependencies.dedup();
                    Action::new(format!("a{}", i), REGIONS[regions[i]], minutes[i])
                        .with_dependencies(dependencies)
                })
                .collect();
            permutation.into_iter().map(|i| actions[i].clone()).collect()
        })
}

fn assert_topological(input: &[Action], output: &[Action]) {
    assert_eq!(input.len(), output.len());
    let position: HashMap<&str, usize> = output
        .iter()
        .enumerate()
        .map(|(index, action)| (action.id.as_str(), index))
        .collect();
    for action in output {
        for dep in &action.dependencies {
            assert!(position[dep.as_str()] < position[action.id.as_str()]);
        }
    }
}

#[test]
fn test_acyclic_plans_resolve_topologically() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&acyclic_actions(), |actions| {
            let order = resolve_execution_order(&actions);
            assert!(order.is_ordered());
            assert_topological(&actions, order.actions());
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_dangling_dependency_keeps_input_order() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(acyclic_actions(), any::<Index>()), |(mut actions, pick)| {
            let victim = pick.index(actions.len());
            actions[victim].dependencies.push("ghost".to_string());

            match resolve_execution_order(&actions) {
                ExecutionOrder::Unresolved {
                    actions: returned,
                    blocked,
                    dangling,
                } => {
                    assert_eq!(returned, actions);
                    assert!(blocked.contains(&actions[victim].id));
                    assert!(dangling.contains(&(actions[victim].id.clone(), "ghost".to_string())));
                }
                ExecutionOrder::Ordered(_) => panic!("dangling dependency resolved"),
            }
            assert_eq!(resolve_execution_order_or_fallback(&actions), actions);
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_cycles_never_drop_actions() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(2usize..10), |n| {
            // a0 <- a1 <- ... <- a{n-1} <- a0
            let actions: Vec<Action> = (0..n)
                .map(|i| {
                    let dep = format!("a{}", (i + n - 1) % n);
                    Action::new(format!("a{}", i), "r1", 1).with_dependencies([dep])
                })
                .collect();

            let order = resolve_execution_order(&actions);
            assert!(!order.is_ordered());
            assert_eq!(order.into_actions(), actions);
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_scheduler_dispatch_is_dependency_safe() {
    let mut runner = proptest::test_runner::TestRunner::new(proptest::test_runner::Config {
        cases: 64,
        ..proptest::test_runner::Config::default()
    });
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    runner
        .run(
            &(acyclic_actions(), 1usize..4, any::<u64>()),
            |(actions, parallelism, seed)| {
                let plan = Plan::new("prop", 600, actions);
                let adapter = Arc::new(SimulatedAdapter::new());
                let orchestrator = Orchestrator::builder()
                    .with_config(OrchestratorConfig {
                        parallelism,
                        shuffle_seed: Some(seed),
                        ..OrchestratorConfig::default()
                    })
                    .with_adapter(adapter.clone())
                    .with_store(Arc::new(MemoryRunStore::new()))
                    .build()
                    .unwrap();

                let outcome = runtime.block_on(orchestrator.start(&plan)).unwrap();
                assert_eq!(outcome.run.completed_actions.len(), plan.actions.len());
                assert!(outcome.region_peaks.values().all(|peak| *peak <= parallelism));
                assert_topological(&plan.actions, &outcome.run.completed_actions);
                assert_eq!(adapter.dispatched().len(), plan.actions.len());
                Ok(())
            },
        )
        .unwrap();
}

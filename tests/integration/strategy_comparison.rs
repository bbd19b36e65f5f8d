//! Strategy comparison and plan routing

use mend::forecast::{GraphDependencyInsight, SlaReadinessProjector};
use mend::plan::{Action, Plan};
use mend::policy::{CheckResult, PermissivePolicyEvaluator, PolicyEvaluator, StaticPolicyEvaluator};
use mend::router::{QualityRouter, Recommendation};
use mend::simulation::SimulationEngine;
use mend::strategy::Strategy;
use std::sync::Arc;

fn five_action_plan(sla_minutes: u32) -> Plan {
    Plan::new(
        "regional",
        sla_minutes,
        vec![
            Action::new("a", "r1", 10).with_tags(["db"]),
            Action::new("b", "r2", 5).with_dependencies(["a"]),
            Action::new("c", "r1", 20).with_dependencies(["a"]),
            Action::new("d", "r2", 8).with_dependencies(["b", "c"]),
            Action::new("e", "r3", 3),
        ],
    )
}

fn router(policy: Arc<dyn PolicyEvaluator>) -> QualityRouter {
    QualityRouter::new(
        policy,
        Arc::new(GraphDependencyInsight::default()),
        Arc::new(SlaReadinessProjector),
    )
}

#[tokio::test]
async fn test_comparison_traces_every_strategy() {
    let engine = SimulationEngine::new(
        Arc::new(SlaReadinessProjector),
        Arc::new(PermissivePolicyEvaluator),
    );
    let comparison = engine
        .compare_simulation_strategies(&five_action_plan(60))
        .await;

    assert_eq!(comparison.plan_id, "regional");
    assert_eq!(comparison.traces.len(), 4);
    let strategies: Vec<Strategy> = comparison.traces.iter().map(|t| t.strategy).collect();
    assert_eq!(strategies, Strategy::ALL.to_vec());

    let fewest = comparison
        .traces
        .iter()
        .map(|t| t.timeline.len())
        .min()
        .unwrap();
    let winner = comparison
        .traces
        .iter()
        .find(|t| t.strategy == comparison.winner)
        .unwrap();
    assert_eq!(winner.timeline.len(), fewest);
    // Every strategy stages the same buckets here, so declaration order decides.
    assert_eq!(comparison.winner, Strategy::DependencyFirst);

    assert_eq!(winner.timeline.len(), 2);
    assert_eq!(winner.timeline[0].action_ids, vec!["e".to_string()]);
    assert_eq!((winner.timeline[0].start_minute, winner.timeline[0].end_minute), (0, 3));
    assert_eq!((winner.timeline[1].start_minute, winner.timeline[1].end_minute), (3, 23));
    assert_eq!(winner.estimated_minutes, 23);
    assert!(winner.warnings.is_empty());
}

#[test]
fn test_simulation_walks_plan_order() {
    let engine = SimulationEngine::new(
        Arc::new(SlaReadinessProjector),
        Arc::new(PermissivePolicyEvaluator),
    );
    let result = engine.simulate_plan(&five_action_plan(15));
    assert_eq!(result.estimated_minutes, 46);
    let order: Vec<&str> = result.steps.iter().map(|s| s.action_id.as_str()).collect();
    assert_eq!(order, vec!["a", "b", "c", "d", "e"]);
    // Only c (20m) exceeds the 15m SLA.
    assert_eq!(result.critical_warnings.len(), 1);
    assert!(result.critical_warnings[0].starts_with("c expected 20m"));
    assert!(result.readiness_after_run < 100.0);
}

#[test]
fn test_router_ranks_plans_by_score() {
    let router = router(Arc::new(PermissivePolicyEvaluator));
    let roomy = five_action_plan(60);
    let mut tight = five_action_plan(10);
    tight.plan_id = "tight".to_string();

    let decisions = router.compare_plans(&[tight, roomy]);
    assert_eq!(decisions.len(), 2);
    assert_eq!(decisions[0].plan_id, "regional");
    assert_eq!(decisions[0].recommendation, Recommendation::Fast);
    assert_eq!(decisions[1].plan_id, "tight");
    assert_eq!(decisions[1].recommendation, Recommendation::Safe);
    assert!(decisions[0].score > decisions[1].score);
    assert!(decisions[0]
        .rationale
        .iter()
        .any(|line| line == "dependency health healthy"));
}

#[test]
fn test_violations_force_safe_route() {
    let evaluator = StaticPolicyEvaluator::new(vec![CheckResult::deny(
        "blast-radius",
        vec!["touches primary".to_string(), "no rollback".to_string()],
        0.4,
    )]);
    let decision = router(Arc::new(evaluator)).route_plan(&five_action_plan(60));
    assert_eq!(decision.recommendation, Recommendation::Safe);
    assert!(decision
        .rationale
        .iter()
        .any(|line| line == "2 policy violation(s)"));
}

#[test]
fn test_cyclic_plan_routes_as_brittle() {
    let plan = Plan::new(
        "cyclic",
        60,
        vec![
            Action::new("x", "r1", 5).with_dependencies(["y"]),
            Action::new("y", "r1", 5).with_dependencies(["x"]),
        ],
    );
    let decision = router(Arc::new(PermissivePolicyEvaluator)).route_plan(&plan);
    assert!(decision
        .rationale
        .iter()
        .any(|line| line == "dependency health brittle"));
}

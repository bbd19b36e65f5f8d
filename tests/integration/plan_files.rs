//! Plan file loading (TOML and JSON)

use mend::plan::{Plan, PlanMode};
use mend::OrchestratorError;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_toml_plan_loads_with_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("failover.toml");
    fs::write(
        &path,
        r#"
plan_id = "failover"
sla_minutes = 45

[[actions]]
id = "drain"
region = "us-east"
expected_duration_minutes = 10
tags = ["traffic"]

[[actions]]
id = "promote"
region = "us-east"
service_code = "rds"
command = "promote-replica"
expected_duration_minutes = 20
dependencies = ["drain"]
"#,
    )
    .unwrap();

    let plan = Plan::from_path(&path).unwrap();
    assert_eq!(plan.plan_id, "failover");
    assert_eq!(plan.sla_minutes, 45);
    assert_eq!(plan.mode, PlanMode::Manual);
    assert!(plan.is_safe);
    assert_eq!(plan.actions.len(), 2);
    assert_eq!(plan.actions[1].dependencies, vec!["drain".to_string()]);
    assert_eq!(plan.actions[1].command, "promote-replica");
    assert_eq!(plan.total_expected_minutes(), 30);
}

#[test]
fn test_json_plan_loads() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("failover.json");
    fs::write(
        &path,
        r#"{
  "plan_id": "failover",
  "sla_minutes": 30,
  "mode": "semi-automated",
  "is_safe": false,
  "actions": [
    {"id": "a", "region": "eu-west", "expected_duration_minutes": 5},
    {"id": "b", "region": "us-east", "expected_duration_minutes": 7, "dependencies": ["a"]}
  ]
}"#,
    )
    .unwrap();

    let plan = Plan::from_path(&path).unwrap();
    assert_eq!(plan.mode, PlanMode::SemiAutomated);
    assert!(!plan.is_safe);
    assert_eq!(plan.regions().into_iter().collect::<Vec<_>>(), vec!["eu-west", "us-east"]);
}

#[test]
fn test_dangling_dependency_still_loads() {
    // Left for the resolver to report; loading only checks structure.
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("dangling.json");
    fs::write(
        &path,
        r#"{"plan_id": "p", "sla_minutes": 10, "actions": [
            {"id": "a", "region": "r", "expected_duration_minutes": 1, "dependencies": ["ghost"]}
        ]}"#,
    )
    .unwrap();

    let plan = Plan::from_path(&path).unwrap();
    assert_eq!(plan.actions[0].dependencies, vec!["ghost".to_string()]);
}

#[test]
fn test_duplicate_action_ids_are_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("dup.json");
    fs::write(
        &path,
        r#"{"plan_id": "p", "sla_minutes": 10, "actions": [
            {"id": "a", "region": "r", "expected_duration_minutes": 1},
            {"id": "a", "region": "r", "expected_duration_minutes": 2}
        ]}"#,
    )
    .unwrap();

    let err = Plan::from_path(&path).unwrap_err();
    assert!(matches!(err, OrchestratorError::InvalidPlan(_)));
    assert!(err.to_string().contains("Duplicate action id: a"));
}

#[test]
fn test_load_errors_name_the_file() {
    let temp_dir = TempDir::new().unwrap();

    let malformed = temp_dir.path().join("broken.toml");
    fs::write(&malformed, "plan_id = \n").unwrap();
    let err = Plan::from_path(&malformed).unwrap_err();
    assert!(matches!(err, OrchestratorError::PlanLoad { .. }));
    assert!(err.to_string().contains("broken.toml"));

    let unsupported = temp_dir.path().join("plan.yaml");
    fs::write(&unsupported, "plan_id: p\n").unwrap();
    let err = Plan::from_path(&unsupported).unwrap_err();
    match err {
        OrchestratorError::PlanLoad { message, .. } => {
            assert!(message.contains("unsupported plan extension"))
        }
        other => panic!("unexpected error: {}", other),
    }

    let missing = temp_dir.path().join("missing.json");
    assert!(matches!(
        Plan::from_path(&missing),
        Err(OrchestratorError::PlanLoad { .. })
    ));
}

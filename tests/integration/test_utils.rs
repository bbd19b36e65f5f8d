//! Shared test utilities for integration tests
//!
//! Plan fixtures plus isolated XDG/`MEND_*` environment handling so config
//! tests never pick up the developer's real configuration.

use mend::plan::{Action, Plan};
use std::sync::Mutex;
use tempfile::TempDir;

/// Serializes environment variable access across all integration tests
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const MANAGED_VARS: [&str; 5] = [
    "HOME",
    "XDG_CONFIG_HOME",
    "MEND_ENV",
    "MEND__ORCHESTRATOR__PARALLELISM",
    "MEND__STORAGE__STORE_PATH",
];

/// Environment variable state to restore after test
struct EnvState(Vec<(&'static str, Option<String>)>);

impl EnvState {
    fn capture() -> Self {
        Self(
            MANAGED_VARS
                .iter()
                .map(|name| (*name, std::env::var(name).ok()))
                .collect(),
        )
    }

    fn restore(self) {
        for (name, value) in self.0 {
            match value {
                Some(value) => std::env::set_var(name, value),
                None => std::env::remove_var(name),
            }
        }
    }
}

/// Run `f` with HOME and XDG_CONFIG_HOME pointed into `test_dir` and every
/// `MEND_*` override cleared. The original environment is restored afterwards.
pub fn with_isolated_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let env_state = EnvState::capture();

    let test_home = test_dir.path().join("home");
    let test_config_home = test_dir.path().join("xdg");
    std::fs::create_dir_all(&test_home).unwrap();
    std::fs::create_dir_all(&test_config_home).unwrap();

    for name in MANAGED_VARS {
        std::env::remove_var(name);
    }
    std::env::set_var("HOME", test_home.to_str().unwrap());
    std::env::set_var("XDG_CONFIG_HOME", test_config_home.to_str().unwrap());

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));
    env_state.restore();
    match result {
        Ok(value) => value,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

/// Two-region failover: drain and promote in us-east, reroute in eu-west
/// after drain, verify once everything else is done.
pub fn failover_plan() -> Plan {
    Plan::new(
        "failover",
        60,
        vec![
            Action::new("drain", "us-east", 10).with_tags(["traffic"]),
            Action::new("promote", "us-east", 15)
                .with_dependencies(["drain"])
                .with_tags(["db"])
                .with_command("rds", "promote-replica"),
            Action::new("reroute", "eu-west", 5)
                .with_dependencies(["drain"])
                .with_tags(["dns", "edge"]),
            Action::new("verify", "eu-west", 5).with_dependencies(["promote", "reroute"]),
        ],
    )
}

pub fn ids(actions: &[Action]) -> Vec<String> {
    actions.iter().map(|a| a.id.clone()).collect()
}

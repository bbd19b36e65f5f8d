//! Layered configuration loading: global file, workspace files, environment

use mend::config::{global_config_path, ConfigLoader, MendConfig};
use mend::policy::PolicyMode;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use crate::integration::test_utils::with_isolated_env;

fn write_global(contents: &str) -> PathBuf {
    let path = global_config_path().expect("home directory is set");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_defaults_without_any_sources() {
    let test_dir = TempDir::new().unwrap();
    let config = with_isolated_env(&test_dir, || {
        let workspace = test_dir.path().join("workspace");
        fs::create_dir_all(&workspace).unwrap();
        ConfigLoader::load(&workspace).unwrap()
    });
    assert_eq!(config, MendConfig::default());
}

#[test]
fn test_global_config_under_config_home() {
    let test_dir = TempDir::new().unwrap();
    with_isolated_env(&test_dir, || {
        let path = write_global("[orchestrator]\npolicy_mode = \"enforce\"\nparallelism = 4\n");
        assert!(path.ends_with("mend/config.toml"));

        let workspace = test_dir.path().join("workspace");
        fs::create_dir_all(&workspace).unwrap();
        let config = ConfigLoader::load(&workspace).unwrap();
        assert_eq!(config.orchestrator.policy_mode, PolicyMode::Enforce);
        assert_eq!(config.orchestrator.parallelism, 4);
    });
}

#[test]
fn test_precedence_env_over_workspace_over_global() {
    let test_dir = TempDir::new().unwrap();
    with_isolated_env(&test_dir, || {
        write_global(
            "[orchestrator]\nparallelism = 4\nmax_runtime_minutes = 60\n\n[storage]\nstore_path = \"/srv/global\"\n",
        );

        let workspace = test_dir.path().join("workspace");
        let config_dir = workspace.join("config");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join("config.toml"), "[orchestrator]\nparallelism = 3\n").unwrap();
        fs::write(
            config_dir.join("production.toml"),
            "[orchestrator]\ndry_run = true\n",
        )
        .unwrap();

        std::env::set_var("MEND_ENV", "production");
        std::env::set_var("MEND__STORAGE__STORE_PATH", "/srv/env");
        let config = ConfigLoader::load(&workspace).unwrap();

        assert_eq!(config.orchestrator.parallelism, 3);
        assert_eq!(config.orchestrator.max_runtime_minutes, 60);
        assert!(config.orchestrator.dry_run);
        assert_eq!(config.storage.store_path, PathBuf::from("/srv/env"));

        std::env::set_var("MEND__ORCHESTRATOR__PARALLELISM", "9");
        let config = ConfigLoader::load(&workspace).unwrap();
        assert_eq!(config.orchestrator.parallelism, 9);
    });
}

#[test]
fn test_invalid_values_fail_validation_not_loading() {
    let test_dir = TempDir::new().unwrap();
    let config = with_isolated_env(&test_dir, || {
        let workspace = test_dir.path().join("workspace");
        fs::create_dir_all(workspace.join("config")).unwrap();
        fs::write(
            workspace.join("config").join("config.toml"),
            "[orchestrator]\nparallelism = 0\n\n[logging]\nformat = \"xml\"\n",
        )
        .unwrap();
        ConfigLoader::load(&workspace).unwrap()
    });

    let errors = config.validate().unwrap_err();
    assert_eq!(errors.len(), 2);
}

#[test]
fn test_malformed_workspace_file_is_an_error() {
    let test_dir = TempDir::new().unwrap();
    let result = with_isolated_env(&test_dir, || {
        let workspace = test_dir.path().join("workspace");
        fs::create_dir_all(workspace.join("config")).unwrap();
        fs::write(
            workspace.join("config").join("config.toml"),
            "[orchestrator\nparallelism = 3\n",
        )
        .unwrap();
        ConfigLoader::load(&workspace)
    });
    assert!(result.is_err());
}

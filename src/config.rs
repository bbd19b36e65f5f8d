//! Configuration System
//!
//! Layered configuration for the orchestrator, logging and storage: built-in
//! defaults, the global config file, workspace config files, then `MEND__*`
//! environment variables. Tests included.

use crate::logging::LoggingConfig;
use crate::policy::PolicyMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MendConfig {
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

/// Retry behaviour for a single action dispatch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetryPolicy {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Pause between attempts
    #[serde(default)]
    pub delay_ms: u64,
}

impl RetryPolicy {
    /// Retries granted after the first attempt.
    pub fn retries(&self) -> usize {
        if self.enabled {
            self.max_retries
        } else {
            0
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            max_retries: default_max_retries(),
            delay_ms: 0,
        }
    }
}

/// Scheduler settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrchestratorConfig {
    /// Per-region cap on active actions
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,

    /// Actions expected to run longer than this are failed
    #[serde(default = "default_max_runtime_minutes")]
    pub max_runtime_minutes: u32,

    #[serde(default)]
    pub retry_policy: RetryPolicy,

    #[serde(default)]
    pub policy_mode: PolicyMode,

    /// Dispatch through the adapter's dry-run path when it has one
    #[serde(default)]
    pub dry_run: bool,

    /// Seed for the cross-region tie-break shuffle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shuffle_seed: Option<u64>,
}

fn default_true() -> bool {
    true
}

fn default_max_retries() -> usize {
    2
}

fn default_parallelism() -> usize {
    2
}

fn default_max_runtime_minutes() -> u32 {
    180
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
            max_runtime_minutes: default_max_runtime_minutes(),
            retry_policy: RetryPolicy::default(),
            policy_mode: PolicyMode::default(),
            dry_run: false,
            shuffle_seed: None,
        }
    }
}

impl OrchestratorConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.parallelism == 0 {
            return Err("parallelism must be at least 1".to_string());
        }
        if self.max_runtime_minutes == 0 {
            return Err("max_runtime_minutes must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Storage paths
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".mend/store")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
        }
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.store_path.as_os_str().is_empty() {
            return Err("Store path cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Orchestrator(String),
    Logging(String),
    Storage(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Orchestrator(msg) => write!(f, "Orchestrator: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
            ValidationError::Storage(msg) => write!(f, "Storage: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl MendConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.orchestrator.validate() {
            errors.push(ValidationError::Orchestrator(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }
        if let Err(e) = self.storage.validate() {
            errors.push(ValidationError::Storage(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

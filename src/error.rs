//! Error types for the recovery plan orchestrator.

use thiserror::Error;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Record serialization failed: {0}")]
    Serialization(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors raised by a side-effecting adapter.
///
/// These never escape the scheduler loop; the dispatch call site turns them
/// into a `failed` action outcome carrying the message.
#[derive(Debug, Clone, Error)]
pub enum AdapterError {
    #[error("{0}")]
    DispatchFailed(String),

    #[error("Adapter does not support {0}")]
    Unsupported(String),
}

/// Orchestrator-level errors
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("policy-denied:{0}")]
    PolicyDenied(usize),

    #[error("run-not-found")]
    RunNotFound(String),

    #[error(transparent)]
    StorageError(#[from] StorageError),

    /// A builder was finished without a required port.
    #[error("orchestrator-not-initialized")]
    NotInitialized,

    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to load plan {path}: {message}")]
    PlanLoad { path: String, message: String },
}

impl From<config::ConfigError> for OrchestratorError {
    fn from(err: config::ConfigError) -> Self {
        OrchestratorError::ConfigError(err.to_string())
    }
}

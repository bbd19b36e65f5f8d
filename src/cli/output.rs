//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::OrchestratorError;

/// Map domain errors to a string for CLI output.
pub fn map_error(e: &OrchestratorError) -> String {
    match e {
        OrchestratorError::RunNotFound(run_id) => format!("run-not-found: {}", run_id),
        other => other.to_string(),
    }
}

/// Serialize a result as pretty JSON for `--format json`.
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<String, OrchestratorError> {
    serde_json::to_string_pretty(value).map_err(|e| {
        OrchestratorError::StorageError(crate::error::StorageError::Serialization(e.to_string()))
    })
}

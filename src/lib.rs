//! Mend: Recovery Plan Orchestration
//!
//! Resolves dependency-safe execution orders for multi-region recovery plans,
//! gates them on policy, dispatches actions through an adapter under a
//! per-region cap with bounded retries, and records runs and events. Planning
//! helpers simulate, compare strategies and route plans without side effects.

pub mod adapter;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod forecast;
pub mod logging;
pub mod orchestrator;
pub mod plan;
pub mod policy;
pub mod resolver;
pub mod router;
pub mod run;
pub mod simulation;
pub mod store;
pub mod strategy;
pub mod types;

pub use error::{AdapterError, OrchestratorError, StorageError};
pub use orchestrator::{Orchestrator, OrchestratorBuilder, StartOutcome};
pub use plan::{Action, Plan};

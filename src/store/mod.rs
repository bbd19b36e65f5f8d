//! Run Store
//!
//! Persistence port for runs and their command events, with an in-memory
//! implementation and a sled-backed one in [`persistence`].

pub mod persistence;

pub use persistence::SledRunStore;

use crate::error::StorageError;
use crate::run::{CommandEvent, RuntimeRun};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Storage for runs and events.
#[async_trait]
pub trait RunStore: Send + Sync {
    async fn upsert_run(&self, run: &RuntimeRun) -> Result<RuntimeRun, StorageError>;

    async fn get_run(&self, run_id: &str) -> Result<Option<RuntimeRun>, StorageError>;

    /// Runs for a plan, newest first.
    async fn list_runs(&self, plan_id: &str) -> Result<Vec<RuntimeRun>, StorageError>;

    async fn publish_event(&self, event: &CommandEvent) -> Result<(), StorageError>;

    /// Latest `limit` events for a plan, oldest first.
    async fn get_events(&self, plan_id: &str, limit: usize)
        -> Result<Vec<CommandEvent>, StorageError>;
}

#[derive(Debug, Default)]
pub struct MemoryRunStore {
    runs: RwLock<HashMap<String, RuntimeRun>>,
    events: RwLock<Vec<CommandEvent>>,
}

impl MemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run_count(&self) -> usize {
        self.runs.read().len()
    }

    pub fn event_count(&self) -> usize {
        self.events.read().len()
    }
}

#[async_trait]
impl RunStore for MemoryRunStore {
    async fn upsert_run(&self, run: &RuntimeRun) -> Result<RuntimeRun, StorageError> {
        self.runs.write().insert(run.run_id.clone(), run.clone());
        Ok(run.clone())
    }

    async fn get_run(&self, run_id: &str) -> Result<Option<RuntimeRun>, StorageError> {
        Ok(self.runs.read().get(run_id).cloned())
    }

    async fn list_runs(&self, plan_id: &str) -> Result<Vec<RuntimeRun>, StorageError> {
        let mut runs: Vec<RuntimeRun> = self
            .runs
            .read()
            .values()
            .filter(|r| r.plan_id == plan_id)
            .cloned()
            .collect();
        runs.sort_by(|a, b| b.started_at.cmp(&a.started_at).then(b.run_id.cmp(&a.run_id)));
        Ok(runs)
    }

    async fn publish_event(&self, event: &CommandEvent) -> Result<(), StorageError> {
        self.events.write().push(event.clone());
        Ok(())
    }

    async fn get_events(
        &self,
        plan_id: &str,
        limit: usize,
    ) -> Result<Vec<CommandEvent>, StorageError> {
        let events = self.events.read();
        let matching: Vec<&CommandEvent> =
            events.iter().filter(|e| e.plan_id == plan_id).collect();
        let skip = matching.len().saturating_sub(limit);
        Ok(matching.into_iter().skip(skip).cloned().collect())
    }
}

//! Durable sled-backed run and event store.

use std::io;
use std::path::Path;

use async_trait::async_trait;
use sled::{Db, Tree};

use crate::error::StorageError;
use crate::run::{CommandEvent, RuntimeRun};
use crate::store::RunStore;

const TREE_RUNS: &str = "runs";
const TREE_EVENTS: &str = "events";
const EVENT_KEY_PAD: usize = 20;

#[derive(Clone)]
pub struct SledRunStore {
    db: Db,
    runs: Tree,
    events: Tree,
}

impl SledRunStore {
    pub fn new(db: Db) -> Result<Self, StorageError> {
        let runs = db.open_tree(TREE_RUNS).map_err(to_storage_io)?;
        let events = db.open_tree(TREE_EVENTS).map_err(to_storage_io)?;
        Ok(Self { db, runs, events })
    }

    /// Open (or create) a sled database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path).map_err(|e| {
            StorageError::IoError(io::Error::new(
                io::ErrorKind::Other,
                format!("Failed to open sled database: {}", e),
            ))
        })?;
        Self::new(db)
    }

    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush().map_err(to_storage_io)?;
        Ok(())
    }

    pub fn encode_event_key(plan_id: &str, seq: u64) -> String {
        encode_event_key(plan_id, seq)
    }
}

#[async_trait]
impl RunStore for SledRunStore {
    async fn upsert_run(&self, run: &RuntimeRun) -> Result<RuntimeRun, StorageError> {
        let value = serde_json::to_vec(run).map_err(to_storage_data)?;
        self.runs
            .insert(run.run_id.as_bytes(), value)
            .map_err(to_storage_io)?;
        self.flush()?;
        Ok(run.clone())
    }

    async fn get_run(&self, run_id: &str) -> Result<Option<RuntimeRun>, StorageError> {
        let Some(raw) = self.runs.get(run_id.as_bytes()).map_err(to_storage_io)? else {
            return Ok(None);
        };
        let parsed = serde_json::from_slice(&raw).map_err(to_storage_data)?;
        Ok(Some(parsed))
    }

    async fn list_runs(&self, plan_id: &str) -> Result<Vec<RuntimeRun>, StorageError> {
        let mut out = Vec::new();
        for result in self.runs.iter() {
            let (_, value) = result.map_err(to_storage_io)?;
            let run: RuntimeRun = serde_json::from_slice(&value).map_err(to_storage_data)?;
            if run.plan_id == plan_id {
                out.push(run);
            }
        }
        out.sort_by(|a, b| b.started_at.cmp(&a.started_at).then(b.run_id.cmp(&a.run_id)));
        Ok(out)
    }

    async fn publish_event(&self, event: &CommandEvent) -> Result<(), StorageError> {
        let seq = self.db.generate_id().map_err(to_storage_io)?;
        let key = encode_event_key(&event.plan_id, seq);
        let value = serde_json::to_vec(event).map_err(to_storage_data)?;
        self.events
            .insert(key.as_bytes(), value)
            .map_err(to_storage_io)?;
        Ok(())
    }

    async fn get_events(
        &self,
        plan_id: &str,
        limit: usize,
    ) -> Result<Vec<CommandEvent>, StorageError> {
        let prefix = format!("{plan_id}:");
        let mut out = Vec::new();
        for result in self.events.scan_prefix(prefix.as_bytes()).rev() {
            if out.len() >= limit {
                break;
            }
            let (_, value) = result.map_err(to_storage_io)?;
            let parsed: CommandEvent = serde_json::from_slice(&value).map_err(to_storage_data)?;
            // "a:" also prefixes keys of a plan named "a:b".
            if parsed.plan_id == plan_id {
                out.push(parsed);
            }
        }
        out.reverse();
        Ok(out)
    }
}

fn encode_event_key(plan_id: &str, seq: u64) -> String {
    format!("{}:{:0width$}", plan_id, seq, width = EVENT_KEY_PAD)
}

fn to_storage_io(err: sled::Error) -> StorageError {
    StorageError::IoError(io::Error::new(io::ErrorKind::Other, err.to_string()))
}

fn to_storage_data(err: serde_json::Error) -> StorageError {
    StorageError::Serialization(err.to_string())
}

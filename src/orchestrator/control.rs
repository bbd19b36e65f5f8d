//! Shared handle between a running scheduler loop and `abort`.
//!
//! The loop owns the run record; this handle only carries the cancellation
//! request and the command ids dispatched so far.

use crate::types::CommandId;
use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Running,
    CancelRequested,
    Finalizing,
}

#[derive(Debug)]
struct Inner {
    phase: Phase,
    commands: Vec<CommandId>,
}

#[derive(Debug)]
pub struct RunControl {
    inner: Mutex<Inner>,
}

impl Default for RunControl {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner {
                phase: Phase::Running,
                commands: Vec::new(),
            }),
        }
    }
}

impl RunControl {
    /// Request cancellation. Returns the commands dispatched so far, or `None`
    /// when the run is already finalizing or was cancelled before.
    pub fn request_cancel(&self) -> Option<Vec<CommandId>> {
        let mut inner = self.inner.lock();
        match inner.phase {
            Phase::Running => {
                inner.phase = Phase::CancelRequested;
                Some(inner.commands.clone())
            }
            Phase::CancelRequested | Phase::Finalizing => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.lock().phase == Phase::CancelRequested
    }

    /// Record a dispatched command. Returns true when cancellation was already
    /// requested, in which case the caller must stop the command itself.
    pub fn record_command(&self, command_id: CommandId) -> bool {
        let mut inner = self.inner.lock();
        inner.commands.push(command_id);
        inner.phase == Phase::CancelRequested
    }

    /// Close the handle to further cancellation. Returns whether the run was cancelled.
    pub fn finalize(&self) -> bool {
        let mut inner = self.inner.lock();
        let cancelled = inner.phase == Phase::CancelRequested;
        inner.phase = Phase::Finalizing;
        cancelled
    }
}

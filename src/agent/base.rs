//! Agent interface and the state every agent owns
//!
//! Each agent instance owns exactly one [`AgentCore`]: its identity plus a
//! history guarded by a single mutex. Nothing here is global; the dispatcher
//! holds its agents by `Arc` handle.

use crate::agent::history::TaskHistory;
use crate::protocol::messages::{AgentInfo, HistoryEntry, RecordedOutcome, Task, TaskResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// A processor that implements a fixed set of task types
#[async_trait]
pub trait Agent: Send + Sync {
    /// Display name, e.g. `KPI Data Agent`
    fn name(&self) -> &str;

    /// Identity and completed-task count
    fn info(&self) -> AgentInfo;

    /// Process a task and record it in this agent's history
    ///
    /// Never fails: problems are reported as an error result.
    async fn process(&self, task: &Task) -> TaskResult;

    /// Retained history, oldest first
    fn history(&self) -> Vec<HistoryEntry>;
}

/// Identity and history owned by a single agent
#[derive(Debug)]
pub struct AgentCore {
    name: String,
    description: String,
    created_at: DateTime<Utc>,
    history: Mutex<TaskHistory>,
}

impl AgentCore {
    pub fn new<N: Into<String>, D: Into<String>>(
        name: N,
        description: D,
        history_capacity: usize,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            created_at: Utc::now(),
            history: Mutex::new(TaskHistory::with_capacity(history_capacity)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append one history entry
    pub fn record(&self, task_id: Option<Uuid>, task: &Task, outcome: RecordedOutcome) {
        let entry = HistoryEntry {
            task_id,
            timestamp: Utc::now(),
            task: task.clone(),
            result: outcome,
        };
        self.lock_history().push(entry);
    }

    /// Record a task this agent completed itself
    pub fn record_completed(&self, task: &Task, result: &TaskResult) {
        self.record(None, task, RecordedOutcome::Completed(result.clone()));
    }

    pub fn tasks_completed(&self) -> u64 {
        self.lock_history().completed()
    }

    pub fn info(&self) -> AgentInfo {
        AgentInfo {
            name: self.name.clone(),
            description: self.description.clone(),
            created_at: self.created_at,
            tasks_completed: self.tasks_completed(),
        }
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.lock_history().entries().cloned().collect()
    }

    // A panic while holding the lock cannot leave the ring buffer half-written,
    // so a poisoned lock is still safe to use.
    fn lock_history(&self) -> MutexGuard<'_, TaskHistory> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

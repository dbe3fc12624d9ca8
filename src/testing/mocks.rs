//! Mock agent for dispatcher tests
//!
//! [`MockAgent`] records every task it receives and answers from a queue of
//! scripted results, falling back to a fixed default once the queue is empty.

use crate::agent::base::{Agent, AgentCore};
use crate::protocol::messages::{AgentInfo, HistoryEntry, Task, TaskResult};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

#[derive(Serialize)]
struct MockPayload<'a> {
    handled_by: &'a str,
    task_type: &'a str,
}

/// Agent that records tasks and returns scripted results
#[derive(Debug)]
pub struct MockAgent {
    core: AgentCore,
    default_result: Option<TaskResult>,
    queued: Mutex<VecDeque<TaskResult>>,
    received: Mutex<Vec<Task>>,
}

impl MockAgent {
    /// Mock answering `{status: success, handled_by, task_type}` by default
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            core: AgentCore::new(name, "Mock agent for testing", 1000),
            default_result: None,
            queued: Mutex::new(VecDeque::new()),
            received: Mutex::new(Vec::new()),
        }
    }

    /// Answer every unscripted task with `result`
    pub fn with_result(mut self, result: TaskResult) -> Self {
        self.default_result = Some(result);
        self
    }

    /// Answer the next task with `result`
    pub fn push_result(&self, result: TaskResult) {
        self.queued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(result);
    }

    /// Tasks received so far, oldest first
    pub fn received(&self) -> Vec<Task> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn next_result(&self, task: &Task) -> TaskResult {
        if let Some(result) = self
            .queued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
        {
            return result;
        }

        match &self.default_result {
            Some(result) => result.clone(),
            None => TaskResult::success(&MockPayload {
                handled_by: self.core.name(),
                task_type: &task.task_type,
            })
            .unwrap_or_else(|e| e.to_task_result()),
        }
    }
}

#[async_trait]
impl Agent for MockAgent {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn info(&self) -> AgentInfo {
        self.core.info()
    }

    async fn process(&self, task: &Task) -> TaskResult {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(task.clone());

        let result = self.next_result(task);
        self.core.record_completed(task, &result);
        result
    }

    fn history(&self) -> Vec<HistoryEntry> {
        self.core.history()
    }
}

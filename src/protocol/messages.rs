//! Message types exchanged with the dispatch core
//!
//! A [`Task`] goes in, a [`TaskResult`] comes out. Everything else here is the
//! bookkeeping agents expose about themselves: [`AgentInfo`], history entries and
//! the structured [`LogRecord`] produced by the log parser.

use crate::error::{DispatchError, DispatchResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Typed unit of work submitted to the dispatcher
///
/// `data` has no fixed schema; each agent validates the keys it needs.
///
/// # Examples
/// ```
/// use agent_dispatch::protocol::Task;
/// use serde_json::json;
///
/// let task = Task::new("calculate_kpi", json!({
///     "kpi_type": "conversion_rate",
///     "values": {"conversions": 50, "total": 200}
/// }));
/// assert_eq!(task.task_type, "calculate_kpi");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Task type selecting the handler and operation
    #[serde(rename = "type", default)]
    pub task_type: String,
    /// Operation-specific payload
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl Task {
    /// Create a task; a non-object `data` value yields an empty payload
    pub fn new<S: Into<String>>(task_type: S, data: Value) -> Self {
        let data = match data {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            task_type: task_type.into(),
            data,
        }
    }

    /// Leniently read a task out of an arbitrary JSON value
    ///
    /// Missing or mistyped `type` becomes the empty string and missing or
    /// mistyped `data` becomes an empty payload, so classification can still
    /// run and report a proper error result.
    pub fn from_value(value: &Value) -> Self {
        let task_type = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let data = value.get("data").cloned().unwrap_or(Value::Null);
        Self::new(task_type, data)
    }

    /// Look up a payload field
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

/// Universal success/failure discriminator carried by every result
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Success,
    Error,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Success => "success",
            TaskStatus::Error => "error",
        }
    }
}

/// Result of a task: a JSON object that always contains `status`
///
/// Success payload shapes vary per task type; error results are always
/// `{status: "error", message}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct TaskResult(Map<String, Value>);

impl TaskResult {
    /// Build a success result from a payload that serializes to a JSON object
    pub fn success<T: Serialize>(payload: &T) -> DispatchResult<Self> {
        match serde_json::to_value(payload)? {
            Value::Object(mut map) => {
                map.insert(
                    "status".to_string(),
                    Value::String(TaskStatus::Success.as_str().to_string()),
                );
                Ok(Self(map))
            }
            other => Err(DispatchError::invalid_input(format!(
                "Result payload must be an object, got {other}"
            ))),
        }
    }

    /// Build an error result carrying a human-readable diagnostic
    pub fn error<S: Into<String>>(message: S) -> Self {
        let mut map = Map::new();
        map.insert(
            "status".to_string(),
            Value::String(TaskStatus::Error.as_str().to_string()),
        );
        map.insert("message".to_string(), Value::String(message.into()));
        Self(map)
    }

    /// Parsed `status` field; `None` only for results built from foreign JSON
    pub fn status(&self) -> Option<TaskStatus> {
        match self.0.get("status").and_then(Value::as_str) {
            Some("success") => Some(TaskStatus::Success),
            Some("error") => Some(TaskStatus::Error),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status() == Some(TaskStatus::Success)
    }

    /// Diagnostic message of an error result
    pub fn message(&self) -> Option<&str> {
        self.0.get("message").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Public description of an agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentInfo {
    pub name: String,
    pub description: String,
    /// Fixed at construction
    pub created_at: DateTime<Utc>,
    /// Grows monotonically as tasks complete
    pub tasks_completed: u64,
}

/// Record kept by the dispatcher when a task is forwarded to an agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DelegationRecord {
    /// Display name of the agent that processed the task
    pub delegated_to: String,
    pub task: Task,
    pub result: TaskResult,
    pub timestamp: DateTime<Utc>,
}

/// What a history entry recorded as the outcome of a task
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum RecordedOutcome {
    /// Task handled by the recording agent itself
    Completed(TaskResult),
    /// Task forwarded to another agent (dispatcher history only)
    Delegated(Box<DelegationRecord>),
}

/// One completed task in an agent's history
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HistoryEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
    pub task: Task,
    pub result: RecordedOutcome,
}

/// Structured form of one raw log line
///
/// `raw` always equals the source line verbatim, whether or not it parsed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogRecord {
    pub timestamp: Option<String>,
    /// `UNKNOWN` when the line did not match the log pattern
    pub level: String,
    pub message: String,
    pub raw: String,
}

/// Snapshot of the dispatcher and every registered agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemStatus {
    pub orchestrator: AgentInfo,
    pub agents: BTreeMap<String, AgentInfo>,
}

//! Error types for task dispatch and processing
//!
//! Every failure inside the core is a `DispatchError`. Agents never surface these
//! to callers as `Err`: they are folded into an error `TaskResult` at the agent
//! boundary via [`DispatchError::to_task_result`].

use crate::protocol::messages::TaskResult;
use thiserror::Error;

/// Maximum length of a diagnostic message carried by an error result
const MAX_MESSAGE_LEN: usize = 500;
const TRUNCATE_SUFFIX: &str = "...[truncated]";

/// Main error type for dispatch and processing operations
///
/// The `Display` text of each variant is exactly the `message` reported in the
/// corresponding error result.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{message}")]
    InvalidInput { message: String },

    #[error("Unknown task type: {0}")]
    UnknownTaskType(String),

    #[error("Unknown KPI type: {0}")]
    UnknownKpiType(String),

    #[error("Unknown orchestrator task type: {0}")]
    UnknownOrchestratorTask(String),

    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Could not determine appropriate agent")]
    Unclassifiable,

    #[error("Failed to serialize result: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DispatchError {
    /// Create invalid input error
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create unknown task type error
    pub fn unknown_task_type<S: Into<String>>(task_type: S) -> Self {
        Self::UnknownTaskType(task_type.into())
    }

    /// Convert into an error result with a bounded diagnostic message
    pub fn to_task_result(&self) -> TaskResult {
        TaskResult::error(truncate_message(&self.to_string()))
    }
}

/// Truncate overly long messages so an echoed payload cannot bloat a result
fn truncate_message(message: &str) -> String {
    if message.len() <= MAX_MESSAGE_LEN {
        return message.to_string();
    }

    let mut cut = MAX_MESSAGE_LEN - TRUNCATE_SUFFIX.len();
    while !message.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}{}", &message[..cut], TRUNCATE_SUFFIX)
}

/// Result type for dispatch operations
pub type DispatchResult<T> = Result<T, DispatchError>;

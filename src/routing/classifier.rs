//! Task classification
//!
//! A task type is resolved in two stages. The exact-match table is checked
//! first and is case-sensitive. Only when it misses are the keyword rules
//! tried, in order, against the lowercased type; the first rule with a
//! matching keyword wins, so KPI keywords take precedence over log keywords.

use crate::agent::kpi::KPI_TASK_TYPES;
use crate::agent::logs::LOGS_TASK_TYPES;
use serde::Serialize;
use std::fmt;

/// Task types the dispatcher answers itself
pub const ORCHESTRATOR_TASK_TYPES: [&str; 3] = ["multi_agent", "status", "agent_info"];

/// Which component handles a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerKind {
    Kpi,
    Logs,
    Orchestrator,
}

impl HandlerKind {
    /// Registry key, as used by `agent_info` and the status listing
    pub fn as_str(&self) -> &'static str {
        match self {
            HandlerKind::Kpi => "kpi",
            HandlerKind::Logs => "logs",
            HandlerKind::Orchestrator => "orchestrator",
        }
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct KeywordRule {
    handler: HandlerKind,
    keywords: &'static [&'static str],
}

const KEYWORD_RULES: [KeywordRule; 2] = [
    KeywordRule {
        handler: HandlerKind::Kpi,
        keywords: &["kpi", "metric", "performance", "trend"],
    },
    KeywordRule {
        handler: HandlerKind::Logs,
        keywords: &["log", "error", "parse", "filter"],
    },
];

/// Exact-match stage
fn exact_handler(task_type: &str) -> Option<HandlerKind> {
    if KPI_TASK_TYPES.contains(&task_type) {
        Some(HandlerKind::Kpi)
    } else if LOGS_TASK_TYPES.contains(&task_type) {
        Some(HandlerKind::Logs)
    } else if ORCHESTRATOR_TASK_TYPES.contains(&task_type) {
        Some(HandlerKind::Orchestrator)
    } else {
        None
    }
}

/// Keyword stage; `None` when no rule matches
fn inferred_handler(task_type: &str) -> Option<HandlerKind> {
    let lowered = task_type.to_lowercase();
    KEYWORD_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|keyword| lowered.contains(keyword)))
        .map(|rule| rule.handler)
}

/// Resolve the handler for a task type
pub fn determine_handler(task_type: &str) -> HandlerKind {
    exact_handler(task_type)
        .or_else(|| inferred_handler(task_type))
        .unwrap_or(HandlerKind::Orchestrator)
}

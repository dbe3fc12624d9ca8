//! Agents and the dispatcher that routes between them
//!
//! Every agent implements [`Agent`] and owns an [`AgentCore`]. The
//! [`Dispatcher`] holds the KPI and logs agents by `Arc` handle.

pub mod base;
pub mod history;
pub mod kpi;
pub mod logs;
pub mod orchestrator;
pub(crate) mod payload;

pub use base::{Agent, AgentCore};
pub use history::TaskHistory;
pub use kpi::{KpiAgent, Trend, KPI_TASK_TYPES};
pub use logs::{LogsAgent, LOGS_TASK_TYPES};
pub use orchestrator::{Dispatcher, ORCHESTRATOR_KEY};

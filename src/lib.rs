//! Agent Dispatch
//!
//! Routes typed analytical tasks to specialized agents: a KPI agent for
//! metric analysis and a logs agent for log parsing and error analysis. A
//! central [`Dispatcher`] classifies each task, forwards it, answers
//! orchestrator tasks (`multi_agent`, `status`, `agent_info`) itself, and keeps
//! an in-memory history.
//!
//! # Quick Start
//!
//! ```rust
//! use agent_dispatch::{Dispatcher, DispatcherConfig, Task};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let dispatcher = Dispatcher::new(&DispatcherConfig::default());
//!
//! let result = dispatcher
//!     .dispatch(&Task::new(
//!         "calculate_kpi",
//!         json!({"kpi_type": "conversion_rate", "values": {"conversions": 50, "total": 200}}),
//!     ))
//!     .await;
//!
//! assert!(result.is_success());
//! assert_eq!(result.get("value"), Some(&json!(25.0)));
//! # });
//! ```
//!
//! Every operation returns a [`TaskResult`] with a `status` field; failures
//! are error results, never panics or `Err` values.

pub mod agent;
pub mod analysis;
pub mod config;
pub mod error;
pub mod observability;
pub mod protocol;
pub mod routing;
pub mod testing;

pub use agent::{Agent, Dispatcher, KpiAgent, LogsAgent};
pub use config::{ConfigError, DispatcherConfig};
pub use error::{DispatchError, DispatchResult};
pub use protocol::*;
pub use routing::{determine_handler, HandlerKind};

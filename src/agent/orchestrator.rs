//! Task dispatcher
//!
//! The [`Dispatcher`] classifies each task, forwards processor tasks to the
//! KPI or logs agent, and answers `multi_agent`, `status` and `agent_info`
//! itself. Every dispatched task appends exactly one entry to the
//! dispatcher's own history; a delegated task also lands in the target
//! agent's history.

use crate::agent::base::{Agent, AgentCore};
use crate::agent::kpi::KpiAgent;
use crate::agent::logs::LogsAgent;
use crate::agent::payload;
use crate::config::DispatcherConfig;
use crate::error::{DispatchError, DispatchResult};
use crate::observability::metrics::metrics;
use crate::protocol::messages::{
    AgentInfo, DelegationRecord, HistoryEntry, RecordedOutcome, SystemStatus, Task, TaskResult,
};
use crate::routing::{determine_handler, HandlerKind};
use crate::{delegation_span, fanout_span, task_span};
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

/// Registry key under which the dispatcher describes itself
pub const ORCHESTRATOR_KEY: &str = "orchestrator";

/// Agent label used for subtasks no processor accepts
const UNKNOWN_AGENT: &str = "unknown";

#[derive(Debug, Serialize)]
struct SubtaskOutcome {
    agent: String,
    subtask: Value,
    result: TaskResult,
}

#[derive(Debug, Serialize)]
struct FanOutReport {
    total_subtasks: usize,
    completed: usize,
    results: Vec<SubtaskOutcome>,
}

#[derive(Debug, Serialize)]
struct AgentInfoReport {
    info: AgentInfo,
}

/// Routes tasks to processors and owns orchestrator-level behavior
pub struct Dispatcher {
    core: AgentCore,
    kpi: Arc<dyn Agent>,
    logs: Arc<dyn Agent>,
}

impl Dispatcher {
    pub const NAME: &'static str = "Orchestrator Agent";
    pub const DESCRIPTION: &'static str = "Coordinates tasks and delegates to specialized agents";

    /// Build a dispatcher with the standard KPI and logs agents
    pub fn new(config: &DispatcherConfig) -> Self {
        let capacity = config.dispatcher.history_capacity;
        Self::with_agents(
            Arc::new(KpiAgent::new(capacity)),
            Arc::new(LogsAgent::new(capacity, &config.analysis)),
            capacity,
        )
    }

    /// Build a dispatcher over arbitrary processor agents
    pub fn with_agents(
        kpi: Arc<dyn Agent>,
        logs: Arc<dyn Agent>,
        history_capacity: usize,
    ) -> Self {
        Self {
            core: AgentCore::new(Self::NAME, Self::DESCRIPTION, history_capacity),
            kpi,
            logs,
        }
    }

    fn processor(&self, handler: HandlerKind) -> Option<&Arc<dyn Agent>> {
        match handler {
            HandlerKind::Kpi => Some(&self.kpi),
            HandlerKind::Logs => Some(&self.logs),
            HandlerKind::Orchestrator => None,
        }
    }

    /// Classify and run one task
    ///
    /// Never fails: every problem comes back as an error result.
    pub async fn dispatch(&self, task: &Task) -> TaskResult {
        let task_id = Uuid::new_v4();
        let span = task_span!(task_id = %task_id, task_type = %task.task_type);
        self.dispatch_tagged(task_id, task).instrument(span).await
    }

    async fn dispatch_tagged(&self, task_id: Uuid, task: &Task) -> TaskResult {
        let started = Instant::now();
        let handler = determine_handler(&task.task_type);
        debug!(handler = %handler, "Classified task");

        let result = match self.processor(handler) {
            Some(agent) => {
                let result = delegate(agent.as_ref(), task).await;
                let record = DelegationRecord {
                    delegated_to: agent.name().to_string(),
                    task: task.clone(),
                    result: result.clone(),
                    timestamp: Utc::now(),
                };
                self.core.record(
                    Some(task_id),
                    task,
                    RecordedOutcome::Delegated(Box::new(record)),
                );
                result
            }
            None => {
                let result = self.handle_orchestrator_task(task).await;
                self.core.record(
                    Some(task_id),
                    task,
                    RecordedOutcome::Completed(result.clone()),
                );
                result
            }
        };

        if !result.is_success() {
            warn!(
                handler = %handler,
                message = result.message().unwrap_or_default(),
                "Task returned an error result"
            );
        }
        metrics().task_dispatched(handler, started.elapsed(), result.is_success());

        result
    }

    /// Answer a task that classified to the dispatcher itself
    pub async fn handle_orchestrator_task(&self, task: &Task) -> TaskResult {
        self.try_orchestrator_task(task)
            .await
            .unwrap_or_else(|e| e.to_task_result())
    }

    async fn try_orchestrator_task(&self, task: &Task) -> DispatchResult<TaskResult> {
        match task.task_type.as_str() {
            "multi_agent" => self.run_multi_agent(task).await,
            "status" => Ok(self.system_status()),
            "agent_info" => {
                let requested = payload::field(&task.data, "agent");
                match requested.and_then(Value::as_str) {
                    Some(name) => Ok(self.agent_info(name)),
                    None => Err(DispatchError::AgentNotFound(
                        requested.map_or_else(|| "null".to_string(), Value::to_string),
                    )),
                }
            }
            other => Err(DispatchError::UnknownOrchestratorTask(other.to_string())),
        }
    }

    /// Run every subtask in order and aggregate the outcomes
    async fn run_multi_agent(&self, task: &Task) -> DispatchResult<TaskResult> {
        let subtasks = payload::list_field(&task.data, "subtasks", "subtasks must be a list")?;

        let span = fanout_span!(subtasks = subtasks.len());
        let results = async {
            let mut results = Vec::with_capacity(subtasks.len());
            for subtask in subtasks {
                results.push(self.run_subtask(subtask).await);
            }
            results
        }
        .instrument(span)
        .await;

        let completed = results
            .iter()
            .filter(|outcome| outcome.result.is_success())
            .count();

        TaskResult::success(&FanOutReport {
            total_subtasks: subtasks.len(),
            completed,
            results,
        })
    }

    async fn run_subtask(&self, raw: &Value) -> SubtaskOutcome {
        let subtask = Task::from_value(raw);

        match self.processor(determine_handler(&subtask.task_type)) {
            Some(agent) => {
                metrics().subtask_executed();
                SubtaskOutcome {
                    agent: agent.name().to_string(),
                    subtask: raw.clone(),
                    result: delegate(agent.as_ref(), &subtask).await,
                }
            }
            None => {
                metrics().subtask_unclassifiable();
                debug!(task_type = %subtask.task_type, "Subtask matches no processor");
                SubtaskOutcome {
                    agent: UNKNOWN_AGENT.to_string(),
                    subtask: raw.clone(),
                    result: DispatchError::Unclassifiable.to_task_result(),
                }
            }
        }
    }

    /// Identity of the dispatcher and every processor, keyed `kpi` and `logs`
    pub fn status_snapshot(&self) -> SystemStatus {
        let agents = [HandlerKind::Kpi, HandlerKind::Logs]
            .into_iter()
            .filter_map(|kind| {
                self.processor(kind)
                    .map(|agent| (kind.as_str().to_string(), agent.info()))
            })
            .collect::<BTreeMap<_, _>>();

        SystemStatus {
            orchestrator: self.core.info(),
            agents,
        }
    }

    /// `status` result: `{status, orchestrator, agents}`
    pub fn system_status(&self) -> TaskResult {
        TaskResult::success(&self.status_snapshot()).unwrap_or_else(|e| e.to_task_result())
    }

    /// `agent_info` result for `orchestrator`, `kpi` or `logs`
    pub fn agent_info(&self, name: &str) -> TaskResult {
        let info = match name {
            ORCHESTRATOR_KEY => Some(self.core.info()),
            "kpi" => Some(self.kpi.info()),
            "logs" => Some(self.logs.info()),
            _ => None,
        };

        match info {
            Some(info) => TaskResult::success(&AgentInfoReport { info })
                .unwrap_or_else(|e| e.to_task_result()),
            None => DispatchError::AgentNotFound(name.to_string()).to_task_result(),
        }
    }
}

async fn delegate(agent: &dyn Agent, task: &Task) -> TaskResult {
    info!(agent = agent.name(), task_type = %task.task_type, "Delegating task");
    agent
        .process(task)
        .instrument(delegation_span!(agent = agent.name()))
        .await
}

#[async_trait]
impl Agent for Dispatcher {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn info(&self) -> AgentInfo {
        self.core.info()
    }

    async fn process(&self, task: &Task) -> TaskResult {
        self.dispatch(task).await
    }

    fn history(&self) -> Vec<HistoryEntry> {
        self.core.history()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::mocks::MockAgent;
    use serde_json::json;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(&DispatcherConfig::default())
    }

    #[tokio::test]
    async fn test_delegated_task_returns_processor_result_unchanged() {
        let kpi = Arc::new(MockAgent::new("Mock KPI").with_result(TaskResult::error("canned")));
        let logs = Arc::new(MockAgent::new("Mock Logs"));
        let dispatcher = Dispatcher::with_agents(kpi.clone(), logs.clone(), 10);

        let result = dispatcher
            .dispatch(&Task::new("analyze_metrics", json!({"metrics": [1]})))
            .await;

        assert_eq!(result, TaskResult::error("canned"));
        assert_eq!(kpi.received().len(), 1);
        assert!(logs.received().is_empty());
    }

    #[tokio::test]
    async fn test_delegation_is_recorded() {
        let dispatcher = dispatcher();
        let task = Task::new("parse_logs", json!({"logs": ["[t] INFO: hi"]}));

        let result = dispatcher.dispatch(&task).await;
        let history = dispatcher.history();

        assert_eq!(history.len(), 1);
        assert!(history[0].task_id.is_some());
        match &history[0].result {
            RecordedOutcome::Delegated(record) => {
                assert_eq!(record.delegated_to, LogsAgent::NAME);
                assert_eq!(record.task, task);
                assert_eq!(record.result, result);
            }
            other => panic!("expected delegation record, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_delegated_task_increments_both_counters() {
        let dispatcher = dispatcher();

        dispatcher
            .dispatch(&Task::new("analyze_metrics", json!({"metrics": [1, 2, 3]})))
            .await;

        let status = dispatcher.status_snapshot();
        assert_eq!(status.orchestrator.tasks_completed, 1);
        assert_eq!(status.agents["kpi"].tasks_completed, 1);
        assert_eq!(status.agents["logs"].tasks_completed, 0);
    }

    #[tokio::test]
    async fn test_orchestrator_task_recorded_with_own_result() {
        let dispatcher = dispatcher();

        let result = dispatcher.dispatch(&Task::new("unknown_xyz", json!({}))).await;

        assert_eq!(result.message(), Some("Unknown orchestrator task type: unknown_xyz"));
        let history = dispatcher.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].result, RecordedOutcome::Completed(result));
    }

    #[tokio::test]
    async fn test_keyword_inference_reaches_processor() {
        let dispatcher = dispatcher();

        let result = dispatcher.dispatch(&Task::new("kpi_trend_check", json!({}))).await;

        assert_eq!(result.message(), Some("Unknown task type: kpi_trend_check"));
        assert_eq!(dispatcher.status_snapshot().agents["kpi"].tasks_completed, 1);
    }

    #[tokio::test]
    async fn test_multi_agent_preserves_order() {
        let dispatcher = dispatcher();
        let task = Task::new(
            "multi_agent",
            json!({"subtasks": [
                {"type": "analyze_metrics", "data": {"metrics": [1, 2, 3]}},
                {"type": "mystery"},
                {"type": "find_errors", "data": {"logs": ["ERROR: x"]}}
            ]}),
        );

        let result = dispatcher.dispatch(&task).await;

        assert!(result.is_success());
        assert_eq!(result.get("total_subtasks"), Some(&json!(3)));
        assert_eq!(result.get("completed"), Some(&json!(2)));

        let results = result.get("results").unwrap().as_array().unwrap();
        assert_eq!(results[0]["agent"], KpiAgent::NAME);
        assert_eq!(results[1]["agent"], "unknown");
        assert_eq!(
            results[1]["result"],
            json!({"status": "error", "message": "Could not determine appropriate agent"})
        );
        assert_eq!(results[1]["subtask"], json!({"type": "mystery"}));
        assert_eq!(results[2]["agent"], LogsAgent::NAME);
    }

    #[tokio::test]
    async fn test_multi_agent_records_once_in_dispatcher() {
        let dispatcher = dispatcher();
        let task = Task::new(
            "multi_agent",
            json!({"subtasks": [
                {"type": "parse_logs", "data": {"logs": []}},
                {"type": "parse_logs", "data": {"logs": []}}
            ]}),
        );

        dispatcher.dispatch(&task).await;

        let status = dispatcher.status_snapshot();
        assert_eq!(status.orchestrator.tasks_completed, 1);
        assert_eq!(status.agents["logs"].tasks_completed, 2);
    }

    #[tokio::test]
    async fn test_multi_agent_nested_orchestrator_subtask_is_unclassifiable() {
        let dispatcher = dispatcher();
        let task = Task::new("multi_agent", json!({"subtasks": [{"type": "status"}]}));

        let result = dispatcher.dispatch(&task).await;

        assert_eq!(result.get("completed"), Some(&json!(0)));
        assert_eq!(result.get("results").unwrap()[0]["agent"], "unknown");
    }

    #[tokio::test]
    async fn test_multi_agent_without_subtasks() {
        let result = dispatcher().dispatch(&Task::new("multi_agent", json!({}))).await;

        assert!(result.is_success());
        assert_eq!(result.get("total_subtasks"), Some(&json!(0)));
        assert_eq!(result.get("results"), Some(&json!([])));
    }

    #[tokio::test]
    async fn test_multi_agent_rejects_non_list_subtasks() {
        let result = dispatcher()
            .dispatch(&Task::new("multi_agent", json!({"subtasks": "nope"})))
            .await;
        assert_eq!(result.message(), Some("subtasks must be a list"));
    }

    #[tokio::test]
    async fn test_status_lists_agents() {
        let dispatcher = dispatcher();
        let result = dispatcher.dispatch(&Task::new("status", json!({}))).await;

        assert!(result.is_success());
        assert_eq!(result.get("orchestrator").unwrap()["name"], Dispatcher::NAME);
        let agents = result.get("agents").unwrap().as_object().unwrap();
        let keys: Vec<&String> = agents.keys().collect();
        assert_eq!(keys, vec!["kpi", "logs"]);
        assert_eq!(agents["logs"]["name"], LogsAgent::NAME);
    }

    #[tokio::test]
    async fn test_agent_info_lookup() {
        let dispatcher = dispatcher();

        let result = dispatcher
            .dispatch(&Task::new("agent_info", json!({"agent": "kpi"})))
            .await;
        assert_eq!(result.get("info").unwrap()["name"], KpiAgent::NAME);

        let result = dispatcher
            .dispatch(&Task::new("agent_info", json!({"agent": "orchestrator"})))
            .await;
        assert_eq!(result.get("info").unwrap()["name"], Dispatcher::NAME);

        let result = dispatcher
            .dispatch(&Task::new("agent_info", json!({"agent": "billing"})))
            .await;
        assert_eq!(result.message(), Some("Agent not found: billing"));
    }

    #[tokio::test]
    async fn test_agent_info_without_name() {
        let result = dispatcher().dispatch(&Task::new("agent_info", json!({}))).await;
        assert_eq!(result.message(), Some("Agent not found: null"));
    }

    #[tokio::test]
    async fn test_history_is_bounded_but_counter_keeps_counting() {
        let dispatcher = Dispatcher::new(&DispatcherConfig::test_config());

        for _ in 0..6 {
            dispatcher.dispatch(&Task::new("status", json!({}))).await;
        }

        assert_eq!(dispatcher.history().len(), 4);
        assert_eq!(dispatcher.info().tasks_completed, 6);
    }

    #[test]
    fn test_agent_info_is_case_sensitive() {
        let result = dispatcher().agent_info("KPI");
        assert_eq!(result.message(), Some("Agent not found: KPI"));
    }
}

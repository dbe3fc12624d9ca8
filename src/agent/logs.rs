//! Logs agent
//!
//! Handles `parse_logs`, `find_errors`, `analyze_patterns`, `filter_logs` and
//! `summarize_logs` over a `logs` list of raw lines. Parsing and error
//! classification live in [`crate::analysis::log_parser`].

use crate::agent::base::{Agent, AgentCore};
use crate::agent::payload::{self, Payload};
use crate::analysis::frequency::FrequencyCounter;
use crate::analysis::log_parser;
use crate::analysis::stats::{self, round2};
use crate::config::AnalysisSection;
use crate::error::{DispatchError, DispatchResult};
use crate::protocol::messages::{AgentInfo, HistoryEntry, LogRecord, Task, TaskResult};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Task types this agent implements
pub const LOGS_TASK_TYPES: [&str; 5] = [
    "parse_logs",
    "find_errors",
    "analyze_patterns",
    "filter_logs",
    "summarize_logs",
];

const LOG_LINES_SHAPE_ERROR: &str = "Log lines must be strings";

#[derive(Debug, Serialize)]
struct ParsedLogs {
    total_entries: usize,
    parsed_logs: Vec<LogRecord>,
}

#[derive(Debug, Serialize)]
struct ErrorReport {
    total_errors: usize,
    errors: Vec<LogRecord>,
    error_rate: f64,
}

#[derive(Debug, Serialize)]
struct KeywordCount {
    word: String,
    count: usize,
}

#[derive(Debug, Serialize)]
struct RepeatedMessage {
    message: String,
    count: usize,
}

#[derive(Debug, Serialize)]
struct PatternAnalysis {
    level_distribution: BTreeMap<String, usize>,
    common_keywords: Vec<KeywordCount>,
    repeated_messages: Vec<RepeatedMessage>,
    total_analyzed: usize,
}

#[derive(Debug, Serialize)]
struct FilteredLogs {
    filtered_count: usize,
    original_count: usize,
    filtered_logs: Vec<LogRecord>,
}

#[derive(Debug, Serialize)]
struct TimeRange {
    start: Option<String>,
    end: Option<String>,
}

#[derive(Debug, Serialize)]
struct LogSummary {
    total_entries: usize,
    level_breakdown: BTreeMap<String, usize>,
    error_count: usize,
    error_percentage: f64,
    time_range: TimeRange,
}

/// Agent specialized in parsing logs, finding errors and pattern matching
pub struct LogsAgent {
    core: AgentCore,
    top_keywords: usize,
    top_repeated_messages: usize,
}

impl LogsAgent {
    pub const NAME: &'static str = "Logs Agent";
    pub const DESCRIPTION: &'static str =
        "Specializes in parsing logs, finding errors, pattern matching, and troubleshooting";

    pub fn new(history_capacity: usize, analysis: &AnalysisSection) -> Self {
        Self {
            core: AgentCore::new(Self::NAME, Self::DESCRIPTION, history_capacity),
            top_keywords: analysis.top_keywords,
            top_repeated_messages: analysis.top_repeated_messages,
        }
    }

    /// Run the operation named by the task type
    pub fn handle(&self, task: &Task) -> DispatchResult<TaskResult> {
        match task.task_type.as_str() {
            "parse_logs" => parse_logs(&log_lines(&task.data)?),
            "find_errors" => find_errors(&log_lines(&task.data)?),
            "analyze_patterns" => self.analyze_patterns(&log_lines(&task.data)?),
            "filter_logs" => filter_logs(&task.data),
            "summarize_logs" => summarize_logs(&log_lines(&task.data)?),
            other => Err(DispatchError::unknown_task_type(other)),
        }
    }

    fn analyze_patterns(&self, lines: &[&str]) -> DispatchResult<TaskResult> {
        let records = log_parser::parse_lines(lines);

        let levels: FrequencyCounter<String> =
            records.iter().map(|record| record.level.clone()).collect();

        let words: FrequencyCounter<String> = records
            .iter()
            .flat_map(|record| {
                record
                    .message
                    .to_lowercase()
                    .split_whitespace()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect();

        let messages: FrequencyCounter<&str> =
            records.iter().map(|record| record.message.as_str()).collect();

        let common_keywords = words
            .most_common(self.top_keywords)
            .into_iter()
            .map(|(word, count)| KeywordCount { word, count })
            .collect();

        let repeated_messages = messages
            .most_common(messages.len())
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .take(self.top_repeated_messages)
            .map(|(message, count)| RepeatedMessage {
                message: message.to_string(),
                count,
            })
            .collect();

        TaskResult::success(&PatternAnalysis {
            level_distribution: levels.to_btree_map(),
            common_keywords,
            repeated_messages,
            total_analyzed: lines.len(),
        })
    }
}

#[async_trait]
impl Agent for LogsAgent {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn info(&self) -> AgentInfo {
        self.core.info()
    }

    #[tracing::instrument(name = "logs_agent", skip(self, task), fields(task_type = %task.task_type))]
    async fn process(&self, task: &Task) -> TaskResult {
        debug!("Processing logs task");

        let result = self.handle(task).unwrap_or_else(|e| {
            warn!(error = %e, "Logs task failed");
            e.to_task_result()
        });

        self.core.record_completed(task, &result);
        result
    }

    fn history(&self) -> Vec<HistoryEntry> {
        self.core.history()
    }
}

/// The `logs` payload as string slices; absent reads as no lines
fn log_lines(data: &Payload) -> DispatchResult<Vec<&str>> {
    let items = payload::list_field(data, "logs", LOG_LINES_SHAPE_ERROR)?;
    payload::string_items(items, LOG_LINES_SHAPE_ERROR)
}

fn parse_logs(lines: &[&str]) -> DispatchResult<TaskResult> {
    let parsed_logs = log_parser::parse_lines(lines);

    TaskResult::success(&ParsedLogs {
        total_entries: parsed_logs.len(),
        parsed_logs,
    })
}

fn find_errors(lines: &[&str]) -> DispatchResult<TaskResult> {
    let errors: Vec<LogRecord> = lines
        .iter()
        .filter(|line| log_parser::is_error_line(line))
        .map(|line| log_parser::parse_line(line))
        .collect();

    TaskResult::success(&ErrorReport {
        total_errors: errors.len(),
        error_rate: stats::percentage(errors.len() as f64, lines.len() as f64),
        errors,
    })
}

fn filter_logs(data: &Payload) -> DispatchResult<TaskResult> {
    let lines = log_lines(data)?;
    let filters = payload::object_field(data, "filters")?;

    let level = payload::non_empty_str(filters, "level");
    let keyword = payload::non_empty_str(filters, "keyword").map(str::to_lowercase);

    let filtered_logs: Vec<LogRecord> = lines
        .iter()
        .map(|line| log_parser::parse_line(line))
        .filter(|record| level.map_or(true, |level| record.level == level))
        .filter(|record| {
            keyword
                .as_deref()
                .map_or(true, |keyword| record.raw.to_lowercase().contains(keyword))
        })
        .collect();

    TaskResult::success(&FilteredLogs {
        filtered_count: filtered_logs.len(),
        original_count: lines.len(),
        filtered_logs,
    })
}

fn summarize_logs(lines: &[&str]) -> DispatchResult<TaskResult> {
    if lines.is_empty() {
        return Err(DispatchError::invalid_input("No logs provided"));
    }

    let records = log_parser::parse_lines(lines);
    let levels: FrequencyCounter<String> =
        records.iter().map(|record| record.level.clone()).collect();
    let error_count = lines
        .iter()
        .filter(|line| log_parser::is_error_line(line))
        .count();

    let mut timestamps = records
        .iter()
        .filter_map(|record| record.timestamp.as_deref());
    let start = timestamps.next().map(str::to_string);
    let end = timestamps.last().map(str::to_string).or_else(|| start.clone());

    TaskResult::success(&LogSummary {
        total_entries: lines.len(),
        level_breakdown: levels.to_btree_map(),
        error_count,
        error_percentage: round2(stats::percentage(error_count as f64, lines.len() as f64)),
        time_range: TimeRange { start, end },
    })
}

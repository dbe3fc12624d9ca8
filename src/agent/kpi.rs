//! KPI data agent
//!
//! Handles `analyze_metrics`, `calculate_kpi`, `trend_analysis` and
//! `performance_report`. Each operation validates its own payload and reports
//! problems as an error result.

use crate::agent::base::{Agent, AgentCore};
use crate::agent::payload::{self, Payload};
use crate::analysis::stats::{self, round2};
use crate::error::{DispatchError, DispatchResult};
use crate::protocol::messages::{AgentInfo, HistoryEntry, Task, TaskResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Task types this agent implements
pub const KPI_TASK_TYPES: [&str; 4] = [
    "analyze_metrics",
    "calculate_kpi",
    "trend_analysis",
    "performance_report",
];

/// Advisory rules are keyed by these literal metric names only
const RESPONSE_TIME_METRIC: &str = "response_time";
const RESPONSE_TIME_LIMIT_MS: f64 = 1000.0;
const ERROR_RATE_METRIC: &str = "error_rate";
const ERROR_RATE_LIMIT: f64 = 5.0;

const HIGH_RESPONSE_TIME_ADVICE: &str = "Response time is high. Consider optimization.";
const HIGH_ERROR_RATE_ADVICE: &str = "Error rate is above threshold. Investigation needed.";

#[derive(Debug, Serialize)]
struct MetricsAnalysis {
    total_metrics: usize,
    average: f64,
    median: f64,
    min: f64,
    max: f64,
    std_dev: f64,
}

#[derive(Debug, Serialize)]
struct KpiValue<'a> {
    kpi_type: &'a str,
    value: f64,
    unit: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Serialize)]
struct TrendReport {
    trend: Trend,
    change_percentage: f64,
    first_half_avg: f64,
    second_half_avg: f64,
}

#[derive(Debug, Serialize)]
struct MetricSummary {
    average: f64,
    min: f64,
    max: f64,
    count: usize,
}

#[derive(Debug, Serialize)]
struct PerformanceReport {
    generated_at: DateTime<Utc>,
    summary: BTreeMap<String, MetricSummary>,
    recommendations: Vec<String>,
}

/// Named KPI formulas supported by `calculate_kpi`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KpiKind {
    ConversionRate,
    AverageResponseTime,
    UptimePercentage,
}

impl KpiKind {
    fn parse(kpi_type: &str) -> Option<Self> {
        match kpi_type {
            "conversion_rate" => Some(KpiKind::ConversionRate),
            "average_response_time" => Some(KpiKind::AverageResponseTime),
            "uptime_percentage" => Some(KpiKind::UptimePercentage),
            _ => None,
        }
    }
}

/// Agent specialized in metrics, performance data and KPI tracking
pub struct KpiAgent {
    core: AgentCore,
}

impl KpiAgent {
    pub const NAME: &'static str = "KPI Data Agent";
    pub const DESCRIPTION: &'static str =
        "Specializes in analyzing metrics, performance data, and KPI tracking";

    pub fn new(history_capacity: usize) -> Self {
        Self {
            core: AgentCore::new(Self::NAME, Self::DESCRIPTION, history_capacity),
        }
    }

    /// Run the operation named by the task type
    pub fn handle(&self, task: &Task) -> DispatchResult<TaskResult> {
        match task.task_type.as_str() {
            "analyze_metrics" => analyze_metrics(&task.data),
            "calculate_kpi" => calculate_kpi(&task.data),
            "trend_analysis" => trend_analysis(&task.data),
            "performance_report" => performance_report(&task.data),
            other => Err(DispatchError::unknown_task_type(other)),
        }
    }
}

#[async_trait]
impl Agent for KpiAgent {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn info(&self) -> AgentInfo {
        self.core.info()
    }

    #[tracing::instrument(name = "kpi_agent", skip(self, task), fields(task_type = %task.task_type))]
    async fn process(&self, task: &Task) -> TaskResult {
        debug!("Processing KPI task");

        let result = self.handle(task).unwrap_or_else(|e| {
            warn!(error = %e, "KPI task failed");
            e.to_task_result()
        });

        self.core.record_completed(task, &result);
        result
    }

    fn history(&self) -> Vec<HistoryEntry> {
        self.core.history()
    }
}

fn analyze_metrics(data: &Payload) -> DispatchResult<TaskResult> {
    let raw = payload::list_field(data, "metrics", "Metrics must be numeric")?;
    if raw.is_empty() {
        return Err(DispatchError::invalid_input("No metrics provided"));
    }

    let values = stats::collect_numbers(raw)
        .ok_or_else(|| DispatchError::invalid_input("Metrics must be numeric"))?;
    let summary = stats::summarize(&values)
        .ok_or_else(|| DispatchError::invalid_input("No metrics provided"))?;

    TaskResult::success(&MetricsAnalysis {
        total_metrics: summary.count,
        average: summary.mean,
        median: summary.median,
        min: summary.min,
        max: summary.max,
        std_dev: summary.std_dev,
    })
}

fn calculate_kpi(data: &Payload) -> DispatchResult<TaskResult> {
    let kpi_type = payload::field(data, "kpi_type")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let kind =
        KpiKind::parse(kpi_type).ok_or_else(|| DispatchError::UnknownKpiType(kpi_type.to_string()))?;
    let values = payload::object_field(data, "values")?;

    let (value, unit) = match kind {
        KpiKind::ConversionRate => {
            let conversions = payload::number_or_zero(values, "conversions")?;
            let total = payload::number_or_zero(values, "total")?;
            (stats::percentage(conversions, total), "%")
        }
        KpiKind::AverageResponseTime => {
            let raw: &[Value] = match values {
                Some(map) => {
                    payload::list_field(map, "response_times", "response_times must be numeric")?
                }
                None => &[],
            };
            let times = stats::collect_numbers(raw).ok_or_else(|| {
                DispatchError::invalid_input("response_times must be numeric")
            })?;
            (stats::mean(&times).unwrap_or(0.0), "ms")
        }
        KpiKind::UptimePercentage => {
            let uptime = payload::number_or_zero(values, "uptime_minutes")?;
            let total = payload::number_or_zero(values, "total_minutes")?;
            (stats::percentage(uptime, total), "%")
        }
    };

    TaskResult::success(&KpiValue {
        kpi_type,
        value: round2(value),
        unit,
    })
}

fn trend_analysis(data: &Payload) -> DispatchResult<TaskResult> {
    let points = payload::list_field(data, "time_series", "time_series must be a list")?;
    if points.len() < 2 {
        return Err(DispatchError::invalid_input(
            "Need at least 2 data points for trend analysis",
        ));
    }

    let values = points
        .iter()
        .map(point_value)
        .collect::<DispatchResult<Vec<f64>>>()?;

    // Odd lengths give the extra point to the second half
    let (first_half, second_half) = values.split_at(values.len() / 2);
    let first_avg = stats::mean(first_half).unwrap_or(0.0);
    let second_avg = stats::mean(second_half).unwrap_or(0.0);

    let trend = if second_avg > first_avg {
        Trend::Increasing
    } else if second_avg < first_avg {
        Trend::Decreasing
    } else {
        Trend::Stable
    };

    let change_percentage = if first_avg != 0.0 {
        let delta = second_avg - first_avg;
        if delta.is_finite() {
            delta / first_avg * 100.0
        } else {
            (second_avg / first_avg - 1.0) * 100.0
        }
    } else {
        0.0
    };

    TaskResult::success(&TrendReport {
        trend,
        change_percentage: round2(change_percentage),
        first_half_avg: round2(first_avg),
        second_half_avg: round2(second_avg),
    })
}

/// `value` of one time-series point; a point without one counts as 0
fn point_value(point: &Value) -> DispatchResult<f64> {
    let invalid =
        || DispatchError::invalid_input("Time series points must be objects with a numeric value");

    let map = point.as_object().ok_or_else(invalid)?;
    match payload::field(map, "value") {
        None => Ok(0.0),
        Some(value) => value.as_f64().ok_or_else(invalid),
    }
}

fn performance_report(data: &Payload) -> DispatchResult<TaskResult> {
    let metrics = payload::object_field(data, "metrics")?;

    let mut summary = BTreeMap::new();
    for (name, samples) in metrics.into_iter().flatten() {
        let Some(samples) = samples.as_array().filter(|s| !s.is_empty()) else {
            debug!(metric = %name, "Skipping metric without samples");
            continue;
        };
        let Some(values) = stats::collect_numbers(samples) else {
            debug!(metric = %name, "Skipping metric with non-numeric samples");
            continue;
        };
        let Some(metric) = stats::summarize(&values) else {
            continue;
        };

        summary.insert(
            name.clone(),
            MetricSummary {
                average: round2(metric.mean),
                min: metric.min,
                max: metric.max,
                count: metric.count,
            },
        );
    }

    let recommendations = recommendations_for(&summary);

    TaskResult::success(&PerformanceReport {
        generated_at: Utc::now(),
        summary,
        recommendations,
    })
}

fn recommendations_for(summary: &BTreeMap<String, MetricSummary>) -> Vec<String> {
    let mut recommendations = Vec::new();

    if summary
        .get(RESPONSE_TIME_METRIC)
        .is_some_and(|m| m.average > RESPONSE_TIME_LIMIT_MS)
    {
        recommendations.push(HIGH_RESPONSE_TIME_ADVICE.to_string());
    }

    if summary
        .get(ERROR_RATE_METRIC)
        .is_some_and(|m| m.average > ERROR_RATE_LIMIT)
    {
        recommendations.push(HIGH_ERROR_RATE_ADVICE.to_string());
    }

    recommendations
}

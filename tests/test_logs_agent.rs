//! Logs agent behavior through the public dispatcher surface


use agent_dispatch::analysis::parse_line;
use agent_dispatch::{Agent, DispatcherConfig, LogsAgent, Task};
use serde_json::json;
use test_helpers::{sample_logs, task, test_dispatcher};

#[test]
fn test_parse_line_examples() {
    let record = parse_line("[2024-01-01T10:00:00] ERROR: disk full");
    assert_eq!(record.timestamp.as_deref(), Some("2024-01-01T10:00:00"));
    assert_eq!(record.level, "ERROR");
    assert_eq!(record.message, "disk full");

    let record = parse_line("plain text");
    assert_eq!(
        serde_json::to_value(&record).unwrap(),
        json!({"timestamp": null, "level": "UNKNOWN", "message": "plain text", "raw": "plain text"})
    );
}

#[tokio::test]
async fn test_find_errors_example() {
    let result = test_dispatcher()
        .dispatch(&task("find_errors", json!({"logs": ["INFO: ok", "ERROR: boom"]})))
        .await;

    assert_eq!(result.get("total_errors"), Some(&json!(1)));
    assert_eq!(result.get("error_rate"), Some(&json!(50.0)));
}

#[tokio::test]
async fn test_find_errors_uses_every_pattern() {
    let result = test_dispatcher()
        .dispatch(&task("find_errors", json!({"logs": sample_logs()})))
        .await;

    // two ERROR lines plus the untimestamped timeout line
    assert_eq!(result.get("total_errors"), Some(&json!(3)));
    assert_eq!(result.get("error_rate"), Some(&json!(50.0)));
}

#[tokio::test]
async fn test_filter_logs_without_filters_is_identity() {
    let logs = sample_logs();
    let result = test_dispatcher()
        .dispatch(&task("filter_logs", json!({"logs": logs})))
        .await;

    assert_eq!(result.get("filtered_count"), Some(&json!(6)));
    assert_eq!(result.get("original_count"), Some(&json!(6)));

    let raws: Vec<&serde_json::Value> = result
        .get("filtered_logs")
        .unwrap()
        .as_array()
        .unwrap()
        .iter()
        .map(|record| &record["raw"])
        .collect();
    let expected: Vec<&serde_json::Value> = logs.as_array().unwrap().iter().collect();
    assert_eq!(raws, expected);
}

#[tokio::test]
async fn test_filter_logs_level_and_keyword_are_conjunctive() {
    let result = test_dispatcher()
        .dispatch(&task(
            "filter_logs",
            json!({"logs": sample_logs(), "filters": {"level": "INFO", "keyword": "CONNECTION"}}),
        ))
        .await;

    assert_eq!(result.get("filtered_count"), Some(&json!(1)));
    assert_eq!(
        result.get("filtered_logs").unwrap()[0]["message"],
        "retrying connection"
    );
}

#[tokio::test]
async fn test_analyze_patterns_over_sample() {
    let result = test_dispatcher()
        .dispatch(&task("analyze_patterns", json!({"logs": sample_logs()})))
        .await;

    assert_eq!(
        result.get("level_distribution"),
        Some(&json!({"ERROR": 2, "INFO": 2, "UNKNOWN": 1, "WARN": 1}))
    );
    assert_eq!(
        result.get("repeated_messages"),
        Some(&json!([{"message": "database connection refused", "count": 2}]))
    );
    assert_eq!(
        result.get("common_keywords").unwrap()[0],
        json!({"word": "connection", "count": 3})
    );
}

#[tokio::test]
async fn test_summarize_logs_over_sample() {
    let result = test_dispatcher()
        .dispatch(&task("summarize_logs", json!({"logs": sample_logs()})))
        .await;

    assert_eq!(result.get("total_entries"), Some(&json!(6)));
    assert_eq!(result.get("error_count"), Some(&json!(3)));
    assert_eq!(result.get("error_percentage"), Some(&json!(50.0)));
    assert_eq!(
        result.get("time_range"),
        Some(&json!({"start": "2024-01-01T10:00:00", "end": "2024-01-01T10:02:00"}))
    );
}

#[tokio::test]
async fn test_configured_keyword_limit() {
    let config = DispatcherConfig::from_toml_str("[analysis]\ntop_keywords = 1\n").unwrap();
    let agent = LogsAgent::new(config.dispatcher.history_capacity, &config.analysis);

    let result = agent
        .process(&Task::new("analyze_patterns", json!({"logs": sample_logs()})))
        .await;

    assert_eq!(result.get("common_keywords").unwrap().as_array().unwrap().len(), 1);
}

//! KPI agent behavior through the public dispatcher surface


use proptest::prelude::*;
use serde_json::json;
use test_helpers::{task, test_dispatcher};

#[tokio::test]
async fn test_conversion_rate_example() {
    let result = test_dispatcher()
        .dispatch(&task(
            "calculate_kpi",
            json!({"kpi_type": "conversion_rate", "values": {"conversions": 50, "total": 200}}),
        ))
        .await;

    assert_eq!(
        result.into_value(),
        json!({"status": "success", "kpi_type": "conversion_rate", "value": 25.0, "unit": "%"})
    );
}

#[tokio::test]
async fn test_trend_analysis_example() {
    let result = test_dispatcher()
        .dispatch(&task(
            "trend_analysis",
            json!({"time_series": [{"value": 10}, {"value": 10}, {"value": 20}, {"value": 20}]}),
        ))
        .await;

    assert_eq!(result.get("trend"), Some(&json!("increasing")));
    assert_eq!(result.get("change_percentage"), Some(&json!(100.0)));
    assert_eq!(result.get("first_half_avg"), Some(&json!(10.0)));
    assert_eq!(result.get("second_half_avg"), Some(&json!(20.0)));
}

#[tokio::test]
async fn test_performance_report_shape() {
    let result = test_dispatcher()
        .dispatch(&task(
            "performance_report",
            json!({"metrics": {
                "response_time": [900, 1200, 1500],
                "error_rate": [1, 2],
                "cpu": "not a list",
                "memory": []
            }}),
        ))
        .await;

    assert!(result.is_success());
    let summary = result.get("summary").unwrap().as_object().unwrap();
    assert_eq!(summary.len(), 2);
    assert_eq!(
        summary["response_time"],
        json!({"average": 1200.0, "min": 900.0, "max": 1500.0, "count": 3})
    );
    assert_eq!(
        result.get("recommendations"),
        Some(&json!(["Response time is high. Consider optimization."]))
    );
    assert!(result.get("generated_at").unwrap().is_string());
}

#[tokio::test]
async fn test_missing_kpi_type_is_error() {
    let result = test_dispatcher()
        .dispatch(&task("calculate_kpi", json!({"values": {}})))
        .await;

    assert!(!result.is_success());
    assert!(result.message().unwrap().starts_with("Unknown KPI type"));
}

proptest! {
    #[test]
    fn prop_analyze_metrics_bounds(values in prop::collection::vec(-1_000_000i64..1_000_000, 1..50)) {
        let dispatcher = test_dispatcher();
        let result = tokio_test::block_on(
            dispatcher.dispatch(&task("analyze_metrics", json!({"metrics": values}))),
        );

        let get = |key: &str| result.get(key).and_then(|v| v.as_f64()).unwrap();
        let (min, max) = (get("min"), get("max"));
        // average and median are rounded to 2 decimals
        prop_assert!(min - 0.005 <= get("median") && get("median") <= max + 0.005);
        prop_assert!(min - 0.005 <= get("average") && get("average") <= max + 0.005);
        prop_assert_eq!(get("total_metrics") as usize, values.len());
    }
}

#[tokio::test]
async fn test_analyze_metrics_near_float_limit_stays_numeric() {
    let result = test_dispatcher()
        .dispatch(&task("analyze_metrics", json!({"metrics": [1e308, 1e308]})))
        .await;

    assert!(result.is_success());
    assert_eq!(result.get("average"), Some(&json!(1e308)));
    assert_eq!(result.get("median"), Some(&json!(1e308)));
    assert_eq!(result.get("std_dev"), Some(&json!(0.0)));
}

#[tokio::test]
async fn test_trend_near_float_limit_stays_numeric() {
    let result = test_dispatcher()
        .dispatch(&task(
            "trend_analysis",
            json!({"time_series": [{"value": 1e307}, {"value": 1e307}]}),
        ))
        .await;

    assert_eq!(result.get("trend"), Some(&json!("stable")));
    assert_eq!(result.get("change_percentage"), Some(&json!(0.0)));
    assert_eq!(result.get("first_half_avg"), Some(&json!(1e307)));
    assert_eq!(result.get("second_half_avg"), Some(&json!(1e307)));
}

#[tokio::test]
async fn test_trend_across_opposite_extremes() {
    let result = test_dispatcher()
        .dispatch(&task(
            "trend_analysis",
            json!({"time_series": [{"value": -1e308}, {"value": 1e308}]}),
        ))
        .await;

    assert_eq!(result.get("trend"), Some(&json!("increasing")));
    assert_eq!(result.get("change_percentage"), Some(&json!(-200.0)));
}

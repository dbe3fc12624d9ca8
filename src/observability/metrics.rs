//! Thread-safe dispatch metrics
//!
//! Counters are atomics; processing-time samples sit behind a mutex and keep
//! only the most recent [`MAX_TIMING_SAMPLES`] measurements.

use crate::routing::HandlerKind;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Retained processing-time samples
pub const MAX_TIMING_SAMPLES: usize = 1000;

/// Global metrics collector instance
pub static METRICS: Lazy<MetricsCollector> = Lazy::new(MetricsCollector::new);

/// Get reference to global metrics collector
pub fn metrics() -> &'static MetricsCollector {
    &METRICS
}

pub struct MetricsCollector {
    tasks_dispatched: AtomicU64,
    kpi_tasks: AtomicU64,
    logs_tasks: AtomicU64,
    orchestrator_tasks: AtomicU64,
    error_results: AtomicU64,
    subtasks_executed: AtomicU64,
    subtasks_unclassifiable: AtomicU64,
    started_at: AtomicU64,

    // microseconds
    processing_times: Mutex<VecDeque<u64>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            tasks_dispatched: AtomicU64::new(0),
            kpi_tasks: AtomicU64::new(0),
            logs_tasks: AtomicU64::new(0),
            orchestrator_tasks: AtomicU64::new(0),
            error_results: AtomicU64::new(0),
            subtasks_executed: AtomicU64::new(0),
            subtasks_unclassifiable: AtomicU64::new(0),
            started_at: AtomicU64::new(current_timestamp()),
            processing_times: Mutex::new(VecDeque::new()),
        }
    }

    fn handler_counter(&self, handler: HandlerKind) -> &AtomicU64 {
        match handler {
            HandlerKind::Kpi => &self.kpi_tasks,
            HandlerKind::Logs => &self.logs_tasks,
            HandlerKind::Orchestrator => &self.orchestrator_tasks,
        }
    }

    /// Record one top-level dispatch
    pub fn task_dispatched(&self, handler: HandlerKind, duration: Duration, success: bool) {
        self.tasks_dispatched.fetch_add(1, Ordering::Relaxed);
        self.handler_counter(handler).fetch_add(1, Ordering::Relaxed);
        if !success {
            self.error_results.fetch_add(1, Ordering::Relaxed);
        }
        self.record_processing_time(duration);
    }

    /// Record one multi-agent subtask handed to a processor
    pub fn subtask_executed(&self) {
        self.subtasks_executed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one multi-agent subtask that matched no processor
    pub fn subtask_unclassifiable(&self) {
        self.subtasks_unclassifiable.fetch_add(1, Ordering::Relaxed);
    }

    fn record_processing_time(&self, duration: Duration) {
        if let Ok(mut times) = self.processing_times.lock() {
            times.push_back(duration.as_micros() as u64);
            if times.len() > MAX_TIMING_SAMPLES {
                times.pop_front();
            }
        }
    }

    /// Reset all counters (useful for testing)
    pub fn reset(&self) {
        for counter in [
            &self.tasks_dispatched,
            &self.kpi_tasks,
            &self.logs_tasks,
            &self.orchestrator_tasks,
            &self.error_results,
            &self.subtasks_executed,
            &self.subtasks_unclassifiable,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        self.started_at.store(current_timestamp(), Ordering::Relaxed);
        if let Ok(mut times) = self.processing_times.lock() {
            times.clear();
        }
    }

    fn processing_time_statistics(&self) -> ProcessingTimes {
        let mut sorted: Vec<u64> = match self.processing_times.lock() {
            Ok(times) => times.iter().copied().collect(),
            Err(_) => Vec::new(),
        };
        if sorted.is_empty() {
            return ProcessingTimes::default();
        }
        sorted.sort_unstable();

        let to_ms = |micros: f64| micros / 1000.0;
        let avg = sorted.iter().sum::<u64>() as f64 / sorted.len() as f64;

        ProcessingTimes {
            samples: sorted.len(),
            avg_ms: to_ms(avg),
            p50_ms: to_ms(percentile(&sorted, 50.0)),
            p95_ms: to_ms(percentile(&sorted, 95.0)),
            p99_ms: to_ms(percentile(&sorted, 99.0)),
        }
    }

    /// Get complete metrics snapshot
    pub fn get_metrics(&self) -> MetricsSnapshot {
        let now = current_timestamp();
        let started_at = self.started_at.load(Ordering::Relaxed);

        MetricsSnapshot {
            tasks: DispatchMetrics {
                tasks_dispatched: self.tasks_dispatched.load(Ordering::Relaxed),
                kpi_tasks: self.kpi_tasks.load(Ordering::Relaxed),
                logs_tasks: self.logs_tasks.load(Ordering::Relaxed),
                orchestrator_tasks: self.orchestrator_tasks.load(Ordering::Relaxed),
                error_results: self.error_results.load(Ordering::Relaxed),
            },
            fan_out: FanOutMetrics {
                subtasks_executed: self.subtasks_executed.load(Ordering::Relaxed),
                subtasks_unclassifiable: self.subtasks_unclassifiable.load(Ordering::Relaxed),
            },
            processing_time: self.processing_time_statistics(),
            uptime_seconds: now.saturating_sub(started_at),
            timestamp: now,
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub tasks: DispatchMetrics,
    pub fan_out: FanOutMetrics,
    pub processing_time: ProcessingTimes,
    pub uptime_seconds: u64,
    pub timestamp: u64,
}

#[derive(Debug, Serialize)]
pub struct DispatchMetrics {
    pub tasks_dispatched: u64,
    pub kpi_tasks: u64,
    pub logs_tasks: u64,
    pub orchestrator_tasks: u64,
    pub error_results: u64,
}

#[derive(Debug, Serialize)]
pub struct FanOutMetrics {
    pub subtasks_executed: u64,
    pub subtasks_unclassifiable: u64,
}

#[derive(Debug, Default, Serialize)]
pub struct ProcessingTimes {
    pub samples: usize,
    pub avg_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Linear-interpolated percentile of sorted data
fn percentile(sorted_data: &[u64], percentile: f64) -> f64 {
    if sorted_data.is_empty() {
        return 0.0;
    }

    let index = (percentile / 100.0) * (sorted_data.len() - 1) as f64;
    let lower = sorted_data[index.floor() as usize] as f64;
    let upper = sorted_data[index.ceil() as usize] as f64;

    lower + (upper - lower) * index.fract()
}

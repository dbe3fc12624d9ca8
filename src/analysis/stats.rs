//! Numeric summarization and KPI formulas
//!
//! Pure functions over slices of `f64`. Empty input yields `None` rather than a
//! made-up value; callers decide what an empty sequence means for their task.

use serde::Serialize;
use serde_json::Value;

/// Descriptive statistics of a non-empty sequence
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation, 0 for fewer than two points
    pub std_dev: f64,
}

/// Summarize a sequence, `None` when it is empty
pub fn summarize(values: &[f64]) -> Option<Summary> {
    Some(Summary {
        count: values.len(),
        mean: mean(values)?,
        median: median(values)?,
        min: min(values)?,
        max: max(values)?,
        std_dev: sample_std_dev(values),
    })
}

/// Arithmetic mean, finite whenever every value is finite
pub fn mean(values: &[f64]) -> Option<f64> {
    let lo = min(values)?;
    let hi = max(values)?;

    let sum: f64 = values.iter().sum();
    let avg = if sum.is_finite() {
        sum / values.len() as f64
    } else {
        // The plain sum overflowed; a running mean stays near [lo, hi]
        values
            .iter()
            .enumerate()
            .fold(0.0, |avg, (k, &v)| {
                let n = (k + 1) as f64;
                avg + (v / n - avg / n)
            })
    };
    Some(avg.max(lo).min(hi))
}

/// Middle value, or the mean of the two middle values for even lengths
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some(sorted[mid - 1] / 2.0 + sorted[mid] / 2.0)
    } else {
        Some(sorted[mid])
    }
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// Sample (n - 1) standard deviation; a single value has no deviation
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    let Some(avg) = mean(values) else {
        return 0.0;
    };
    // Deviations are halved and scaled by the largest one so squares stay finite
    let deviations: Vec<f64> = values.iter().map(|v| v / 2.0 - avg / 2.0).collect();
    let scale = deviations.iter().fold(0.0_f64, |acc, d| acc.max(d.abs()));
    if scale == 0.0 {
        return 0.0;
    }
    let sum_sq: f64 = deviations.iter().map(|d| (d / scale).powi(2)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt() * scale * 2.0
}

/// `part / whole * 100`, or 0 when `whole` is not positive
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

/// Round half away from zero to two decimals
///
/// Magnitudes too large to scale by 100 have no fractional part and are
/// returned as they are.
pub fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    if scaled.is_finite() {
        scaled.round() / 100.0
    } else {
        value
    }
}

/// Read every element as a number, `None` if any element is not numeric
pub fn collect_numbers(values: &[Value]) -> Option<Vec<f64>> {
    values.iter().map(Value::as_f64).collect()
}

//! Distribution statistics over a cross-section of values.
//!
//! All moments use the population (biased) convention: variance divides by
//! `n`, skewness is `m3 / m2^1.5`, kurtosis is Fisher's excess `m4 / m2^2 - 3`.

use std::cmp::Ordering;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// k-th central moment.
fn central_moment(values: &[f64], k: i32) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(k)).sum::<f64>() / values.len() as f64
}

/// Population variance (divides by `n`).
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    central_moment(values, 2)
}

/// Skewness; NaN when the distribution is degenerate.
pub fn skewness(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m2 = central_moment(values, 2);
    if m2 <= 0.0 {
        return f64::NAN;
    }
    central_moment(values, 3) / m2.powf(1.5)
}

/// Excess kurtosis; NaN when the distribution is degenerate.
pub fn excess_kurtosis(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m2 = central_moment(values, 2);
    if m2 <= 0.0 {
        return f64::NAN;
    }
    central_moment(values, 4) / (m2 * m2) - 3.0
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted
}

/// Quantile with linear interpolation between closest ranks
/// (position `q * (n - 1)` in the sorted sample).
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() || !(0.0..=1.0).contains(&q) {
        return f64::NAN;
    }
    quantile_sorted(&sorted(values), q)
}

fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Summary of one cross-section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub mean: f64,
    pub variance: f64,
    pub kurtosis: f64,
    pub skewness: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl Summary {
    pub fn of(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                mean: f64::NAN,
                variance: f64::NAN,
                kurtosis: f64::NAN,
                skewness: f64::NAN,
                min: f64::NAN,
                q25: f64::NAN,
                median: f64::NAN,
                q75: f64::NAN,
                max: f64::NAN,
            };
        }
        let s = sorted(values);
        Self {
            mean: mean(values),
            variance: population_variance(values),
            kurtosis: excess_kurtosis(values),
            skewness: skewness(values),
            min: s[0],
            q25: quantile_sorted(&s, 0.25),
            median: quantile_sorted(&s, 0.5),
            q75: quantile_sorted(&s, 0.75),
            max: s[s.len() - 1],
        }
    }
}

/// Running sum: `out[i] = values[0] + ... + values[i]`.
pub fn cumulative_sum(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .scan(0.0, |acc, &v| {
            *acc += v;
            Some(*acc)
        })
        .collect()
}

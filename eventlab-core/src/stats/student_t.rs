//! Student-t significance helpers for cumulative abnormal returns.
//!
//! Both the single-event and aggregate results report a t-statistic
//! `CAR / sqrt(var(CAR))` and the one-sided complement
//! `1 - CDF_t(|t|, df)`. Degenerate inputs (zero variance, zero degrees of
//! freedom) produce NaN rather than a panic.

use statrs::distribution::{ContinuousCDF, StudentsT};

/// Standard Student-t with `df` degrees of freedom, or `None` when `df` is not positive.
fn distribution(df: f64) -> Option<StudentsT> {
    if df.is_nan() || df <= 0.0 {
        return None;
    }
    StudentsT::new(0.0, 1.0, df).ok()
}

/// `value / sqrt(variance)`, NaN when the variance is zero, negative or not finite.
pub fn t_statistic(value: f64, variance: f64) -> f64 {
    if variance.is_nan() || variance <= 0.0 || variance.is_infinite() {
        return f64::NAN;
    }
    value / variance.sqrt()
}

/// One-sided upper-tail probability of `|t|`: `1 - CDF(|t|, df)`.
///
/// Lies in `[0, 0.5]` for finite `t`. Double it for a two-sided test.
pub fn upper_tail_p_value(t: f64, df: f64) -> f64 {
    if t.is_nan() {
        return f64::NAN;
    }
    match distribution(df) {
        Some(dist) => (1.0 - dist.cdf(t.abs())).clamp(0.0, 1.0),
        None => f64::NAN,
    }
}

/// Quantile of the t distribution at `level` (e.g. 0.90).
pub fn t_quantile(level: f64, df: f64) -> f64 {
    if level.is_nan() || level <= 0.0 || level >= 1.0 {
        return f64::NAN;
    }
    match distribution(df) {
        Some(dist) => dist.inverse_cdf(level),
        None => f64::NAN,
    }
}

/// t-statistics and p-values for paired cumulative values and variances.
pub fn significance(cumulative: &[f64], variance: &[f64], df: f64) -> (Vec<f64>, Vec<f64>) {
    let t_stats: Vec<f64> = cumulative
        .iter()
        .zip(variance)
        .map(|(&c, &v)| t_statistic(c, v))
        .collect();
    let p_values = t_stats.iter().map(|&t| upper_tail_p_value(t, df)).collect();
    (t_stats, p_values)
}

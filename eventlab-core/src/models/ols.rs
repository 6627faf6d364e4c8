//! Ordinary least squares with intercept.
//!
//! The fit is solved through the SVD of the design matrix, which gives the
//! pseudo-inverse solution and stays defined for rank-deficient designs
//! (e.g. a constant regressor).

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use super::{tail, ModelOutput, ModelSizes};
use crate::error::{EventStudyError, Result};
use crate::models::FittedModel;
use crate::stats::population_variance;

const SVD_EPS: f64 = 1e-12;

/// Coefficients and fit statistics of one regression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OlsFit {
    pub intercept: f64,
    /// One slope per regressor, in input order.
    pub coefficients: Vec<f64>,
    pub nobs: usize,
    pub r_squared: f64,
}

impl OlsFit {
    /// Prediction for row `row` of `regressors`.
    pub fn predict_row(&self, regressors: &[&[f64]], row: usize) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(regressors)
                .map(|(b, x)| b * x[row])
                .sum::<f64>()
    }
}

fn design(regressors: &[&[f64]], rows: usize) -> DMatrix<f64> {
    DMatrix::from_fn(rows, regressors.len() + 1, |i, j| {
        if j == 0 {
            1.0
        } else {
            regressors[j - 1][i]
        }
    })
}

/// Fit `y ~ 1 + regressors` on the first `rows` observations.
pub fn fit(y: &[f64], regressors: &[&[f64]], rows: usize) -> Result<OlsFit> {
    if rows == 0 || y.len() < rows || regressors.iter().any(|x| x.len() < rows) {
        return Err(EventStudyError::Regression(format!(
            "need {rows} observations for every series"
        )));
    }
    let y = &y[..rows];
    if y.iter().chain(regressors.iter().flat_map(|x| x[..rows].iter())).any(|v| !v.is_finite()) {
        return Err(EventStudyError::Regression(
            "estimation window contains non-finite values".into(),
        ));
    }

    let x = design(regressors, rows);
    let yv = DVector::from_column_slice(y);
    let beta = x
        .clone()
        .svd(true, true)
        .solve(&yv, SVD_EPS)
        .map_err(|e| EventStudyError::Regression(e.to_string()))?;

    let fitted = &x * &beta;
    let ss_res = (&yv - &fitted).norm_squared();
    let y_mean = yv.mean();
    let ss_tot = yv.iter().map(|v| (v - y_mean).powi(2)).sum::<f64>();
    let r_squared = if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else {
        f64::NAN
    };

    Ok(OlsFit {
        intercept: beta[0],
        coefficients: beta.iter().skip(1).copied().collect(),
        nobs: rows,
        r_squared,
    })
}

/// Shared estimation used by the regression models.
///
/// Fits on the first `estimation_size` rows, computes residuals over the
/// whole supplied window and keeps the trailing `event_window_size` of them.
/// The variance is the population variance of the estimation-window
/// residuals, repeated for every event-window period.
pub(crate) fn estimate(y: &[f64], regressors: &[&[f64]], sizes: &ModelSizes) -> Result<ModelOutput> {
    let fit = fit(y, regressors, sizes.estimation_size)?;
    let n = regressors
        .iter()
        .map(|x| x.len())
        .chain(std::iter::once(y.len()))
        .min()
        .unwrap_or(0);
    let residuals: Vec<f64> = (0..n)
        .map(|row| y[row] - fit.predict_row(regressors, row))
        .collect();
    let variance = population_variance(&residuals[..sizes.estimation_size]);

    Ok(ModelOutput {
        residuals: tail(&residuals, sizes.event_window_size).to_vec(),
        df: sizes.estimation_size.saturating_sub(1),
        variance: vec![variance; sizes.event_window_size],
        fitted: sizes.keep_model.then(|| FittedModel::Ols(fit)),
    })
}

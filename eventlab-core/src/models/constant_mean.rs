//! Constant-mean model: expected return is the estimation-window mean.

use super::{
    require_estimation_rows, tail, FittedModel, ModelData, ModelOutput, ModelSizes, ReturnModel,
    SECURITY_RETURNS,
};
use crate::error::Result;
use crate::stats::{mean, population_variance};

/// Reads `security_returns`.
///
/// Residuals are taken over the whole supplied window, and so is their
/// variance (buffer and event rows included).
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantMean;

impl ReturnModel for ConstantMean {
    fn name(&self) -> &str {
        "constant_mean"
    }

    fn estimate(&self, data: &ModelData, sizes: &ModelSizes) -> Result<ModelOutput> {
        let returns = data.get(SECURITY_RETURNS)?;
        require_estimation_rows(self.name(), SECURITY_RETURNS, returns, sizes)?;

        let mu = mean(&returns[..sizes.estimation_size]);
        let residuals: Vec<f64> = returns.iter().map(|r| r - mu).collect();
        let variance = population_variance(&residuals);

        Ok(ModelOutput {
            residuals: tail(&residuals, sizes.event_window_size).to_vec(),
            df: sizes.estimation_size.saturating_sub(1),
            variance: vec![variance; sizes.event_window_size],
            fitted: sizes
                .keep_model
                .then_some(FittedModel::ConstantMean { mean: mu }),
        })
    }
}

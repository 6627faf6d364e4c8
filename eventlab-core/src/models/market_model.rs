//! Market model: `security ~ 1 + market`.

use super::{ols, ModelData, ModelOutput, ModelSizes, ReturnModel, MARKET_RETURNS, SECURITY_RETURNS};
use crate::error::Result;

/// Reads `security_returns` and `market_returns`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarketModel;

impl ReturnModel for MarketModel {
    fn name(&self) -> &str {
        "market_model"
    }

    fn estimate(&self, data: &ModelData, sizes: &ModelSizes) -> Result<ModelOutput> {
        let security = data.get(SECURITY_RETURNS)?;
        let market = data.get(MARKET_RETURNS)?;
        ols::estimate(security, &[market], sizes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EventStudyError;
    use crate::models::FittedModel;
    use approx::assert_relative_eq;

    #[test]
    fn beta_is_recovered_and_event_shock_is_abnormal() {
        let market: Vec<f64> = (0..25).map(|i| ((i * 7 % 11) as f64 - 5.0) / 100.0).collect();
        let mut security: Vec<f64> = market.iter().map(|m| 0.001 + 1.2 * m).collect();
        security[23] += 0.05;
        let data = ModelData::new()
            .with(SECURITY_RETURNS, security)
            .with(MARKET_RETURNS, market);
        let sizes = ModelSizes {
            estimation_size: 20,
            event_window_size: 3,
            keep_model: true,
        };
        let out = MarketModel.estimate(&data, &sizes).unwrap();
        assert_eq!(out.residuals.len(), 3);
        assert_relative_eq!(out.residuals[0], 0.0, epsilon = 1e-10);
        assert_relative_eq!(out.residuals[1], 0.05, epsilon = 1e-10);
        match out.fitted {
            Some(FittedModel::Ols(fit)) => assert_relative_eq!(fit.coefficients[0], 1.2, epsilon = 1e-9),
            other => panic!("unexpected fitted model: {other:?}"),
        }
    }

    #[test]
    fn requires_market_input() {
        let data = ModelData::new().with(SECURITY_RETURNS, vec![0.0; 10]);
        let sizes = ModelSizes {
            estimation_size: 5,
            event_window_size: 2,
            keep_model: false,
        };
        assert!(matches!(
            MarketModel.estimate(&data, &sizes),
            Err(EventStudyError::MissingParameter { .. })
        ));
    }
}

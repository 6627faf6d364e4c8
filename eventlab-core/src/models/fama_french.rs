//! Fama-French factor models on excess returns.

use super::{
    ols, ModelData, ModelOutput, ModelSizes, ReturnModel, CMA, HML, MKT_RF, RF, RMW,
    SECURITY_RETURNS, SMB,
};
use crate::error::{EventStudyError, Result};

const THREE: [&str; 3] = [MKT_RF, SMB, HML];
const FIVE: [&str; 5] = [MKT_RF, SMB, HML, RMW, CMA];

/// `security - RF ~ 1 + factors`.
///
/// Reads `security_returns`, `RF` and one input per factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamaFrench {
    factors: &'static [&'static str],
}

impl FamaFrench {
    /// Mkt-RF, SMB, HML.
    pub fn three_factor() -> Self {
        Self { factors: &THREE }
    }

    /// Mkt-RF, SMB, HML, RMW, CMA.
    pub fn five_factor() -> Self {
        Self { factors: &FIVE }
    }

    pub fn factors(&self) -> &'static [&'static str] {
        self.factors
    }
}

impl ReturnModel for FamaFrench {
    fn name(&self) -> &str {
        if self.factors.len() == FIVE.len() {
            "fama_french_5factor"
        } else {
            "fama_french_3factor"
        }
    }

    fn estimate(&self, data: &ModelData, sizes: &ModelSizes) -> Result<ModelOutput> {
        let security = data.get(SECURITY_RETURNS)?;
        let rf = data.get(RF)?;
        if rf.len() != security.len() {
            return Err(EventStudyError::ModelShape {
                model: self.name().to_string(),
                field: RF,
                actual: rf.len(),
                expected: security.len(),
            });
        }
        let excess: Vec<f64> = security.iter().zip(rf).map(|(s, r)| s - r).collect();
        let factors = self
            .factors
            .iter()
            .map(|name| data.get(name))
            .collect::<Result<Vec<_>>>()?;
        ols::estimate(&excess, &factors, sizes)
    }
}

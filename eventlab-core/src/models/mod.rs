//! Return-generating models.
//!
//! A model receives the aligned study window for each of its named input
//! series (estimation rows first, buffer rows next, event rows last) and
//! returns the event-window residuals, their variance and the degrees of
//! freedom used by the significance test.
//!
//! Built-in models implement [`ReturnModel`]. Custom models either implement
//! the trait or are plain closures with the [`ReturnModel::estimate`]
//! signature.

pub mod constant_mean;
pub mod fama_french;
pub mod market_model;
pub mod ols;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{EventStudyError, Result};

pub use constant_mean::ConstantMean;
pub use fama_french::FamaFrench;
pub use market_model::MarketModel;
pub use ols::OlsFit;

/// Input name of the security return window.
pub const SECURITY_RETURNS: &str = "security_returns";
/// Input name of the market return window.
pub const MARKET_RETURNS: &str = "market_returns";
pub const MKT_RF: &str = "Mkt-RF";
pub const SMB: &str = "SMB";
pub const HML: &str = "HML";
pub const RMW: &str = "RMW";
pub const CMA: &str = "CMA";
pub const RF: &str = "RF";

/// Named, aligned input windows for a model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelData {
    series: BTreeMap<String, Vec<f64>>,
}

impl ModelData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.insert(name, values);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.series.insert(name.into(), values);
    }

    /// Input window by name; `MissingParameter` if it was not supplied.
    pub fn get(&self, name: &str) -> Result<&[f64]> {
        self.series
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| EventStudyError::MissingParameter {
                name: name.to_string(),
            })
    }
}

/// Window sizes handed to every model call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSizes {
    pub estimation_size: usize,
    pub event_window_size: usize,
    /// Ask the model to return its fitted state.
    pub keep_model: bool,
}

/// Fitted state retained when `keep_model` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FittedModel {
    Ols(OlsFit),
    ConstantMean { mean: f64 },
    /// Free-form state from a custom model.
    Custom(BTreeMap<String, f64>),
}

/// What a model returns for one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOutput {
    /// Abnormal returns over the event window.
    pub residuals: Vec<f64>,
    pub df: usize,
    /// Residual variance per event-window period.
    pub variance: Vec<f64>,
    pub fitted: Option<FittedModel>,
}

/// Contract for return-generating models.
pub trait ReturnModel: Send + Sync {
    /// Short identifier, used in logs and shape errors.
    fn name(&self) -> &str;

    fn estimate(&self, data: &ModelData, sizes: &ModelSizes) -> Result<ModelOutput>;
}

impl<F> ReturnModel for F
where
    F: Fn(&ModelData, &ModelSizes) -> Result<ModelOutput> + Send + Sync,
{
    fn name(&self) -> &str {
        "custom"
    }

    fn estimate(&self, data: &ModelData, sizes: &ModelSizes) -> Result<ModelOutput> {
        self(data, sizes)
    }
}

/// Last `n` entries of `values` (all of them if shorter).
pub(crate) fn tail(values: &[f64], n: usize) -> &[f64] {
    &values[values.len().saturating_sub(n)..]
}

/// Check that every input window holds at least `estimation_size` rows.
pub(crate) fn require_estimation_rows(
    model: &str,
    name: &'static str,
    values: &[f64],
    sizes: &ModelSizes,
) -> Result<()> {
    if values.len() < sizes.estimation_size {
        return Err(EventStudyError::ModelShape {
            model: model.to_string(),
            field: name,
            actual: values.len(),
            expected: sizes.estimation_size,
        });
    }
    Ok(())
}

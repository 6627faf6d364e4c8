//! Named model constructors that resolve tickers against a [`ReturnStore`].

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data::{ReturnStore, FAMA_FRENCH, RETURNS};
use crate::error::{EventStudyError, Result};
use crate::models::{
    ConstantMean, FamaFrench, MarketModel, ModelData, ReturnModel, MARKET_RETURNS, RF,
    SECURITY_RETURNS,
};
use crate::single::{EventOptions, SingleEvent};
use crate::window::WindowSpec;

/// Built-in models addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    MarketModel,
    ConstantMean,
    #[serde(rename = "fama_french_3factor")]
    FamaFrench3,
    #[serde(rename = "fama_french_5factor")]
    FamaFrench5,
}

impl ModelKind {
    pub const ALL: [ModelKind; 4] = [
        ModelKind::MarketModel,
        ModelKind::ConstantMean,
        ModelKind::FamaFrench3,
        ModelKind::FamaFrench5,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ModelKind::MarketModel => "market_model",
            ModelKind::ConstantMean => "constant_mean",
            ModelKind::FamaFrench3 => "fama_french_3factor",
            ModelKind::FamaFrench5 => "fama_french_5factor",
        }
    }

    /// Whether the model reads the `FamaFrench` table.
    pub fn needs_factors(self) -> bool {
        matches!(self, ModelKind::FamaFrench3 | ModelKind::FamaFrench5)
    }

    /// Whether the model reads a market return column next to the security.
    pub fn needs_market(self) -> bool {
        matches!(self, ModelKind::MarketModel)
    }

    fn description(self, security: &str, market: Option<&str>) -> String {
        match self {
            ModelKind::MarketModel => format!(
                "Market model estimation, Security: {security}, Market: {}",
                market.unwrap_or_default()
            ),
            ModelKind::ConstantMean => format!("Constant mean estimation, Security: {security}"),
            ModelKind::FamaFrench3 => {
                format!("Fama-French 3-factor model estimation, Security: {security}")
            }
            ModelKind::FamaFrench5 => {
                format!("Fama-French 5-factor model estimation, Security: {security}")
            }
        }
    }

    /// Resolve the inputs of this model in `store` and run one event.
    ///
    /// `market` is required by the market model and ignored otherwise.
    pub fn run(
        self,
        store: &ReturnStore,
        security: &str,
        market: Option<&str>,
        event_date: NaiveDate,
        spec: &WindowSpec,
        keep_model: bool,
    ) -> Result<SingleEvent> {
        let mut data = ModelData::new();
        let model: Box<dyn ReturnModel> = match self {
            ModelKind::MarketModel => {
                let market = market.ok_or_else(|| EventStudyError::MissingParameter {
                    name: "market_ticker".into(),
                })?;
                let mut w = store.window(RETURNS, &[security, market], event_date, spec)?;
                data.insert(MARKET_RETURNS, w.columns.pop().unwrap_or_default());
                data.insert(SECURITY_RETURNS, w.columns.pop().unwrap_or_default());
                Box::new(MarketModel)
            }
            ModelKind::ConstantMean => {
                let mut w = store.window(RETURNS, &[security], event_date, spec)?;
                data.insert(SECURITY_RETURNS, w.columns.pop().unwrap_or_default());
                Box::new(ConstantMean)
            }
            ModelKind::FamaFrench3 | ModelKind::FamaFrench5 => {
                let ff = if self == ModelKind::FamaFrench3 {
                    FamaFrench::three_factor()
                } else {
                    FamaFrench::five_factor()
                };
                let mut w = store.window(RETURNS, &[security], event_date, spec)?;
                data.insert(SECURITY_RETURNS, w.columns.pop().unwrap_or_default());

                let mut columns: Vec<&str> = ff.factors().to_vec();
                columns.push(RF);
                let factors = store.window(FAMA_FRENCH, &columns, event_date, spec)?;
                for (name, values) in columns.iter().zip(factors.columns) {
                    data.insert(*name, values);
                }
                Box::new(ff)
            }
        };

        SingleEvent::new(
            model.as_ref(),
            &data,
            spec,
            EventOptions {
                event_date: Some(event_date),
                keep_model,
                description: Some(self.description(security, market)),
            },
        )
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ModelKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = ModelKind::ALL.iter().map(|k| k.name()).collect();
                format!("unknown model '{s}' (expected one of: {})", known.join(", "))
            })
    }
}

impl SingleEvent {
    /// Market model for `security` against `market` from the `returns` table.
    pub fn market_model(
        store: &ReturnStore,
        security: &str,
        market: &str,
        event_date: NaiveDate,
        spec: &WindowSpec,
        keep_model: bool,
    ) -> Result<Self> {
        ModelKind::MarketModel.run(store, security, Some(market), event_date, spec, keep_model)
    }

    pub fn constant_mean(
        store: &ReturnStore,
        security: &str,
        event_date: NaiveDate,
        spec: &WindowSpec,
        keep_model: bool,
    ) -> Result<Self> {
        ModelKind::ConstantMean.run(store, security, None, event_date, spec, keep_model)
    }

    /// Fama-French 3-factor model; factors come from the `FamaFrench` table.
    pub fn fama_french_3factor(
        store: &ReturnStore,
        security: &str,
        event_date: NaiveDate,
        spec: &WindowSpec,
        keep_model: bool,
    ) -> Result<Self> {
        ModelKind::FamaFrench3.run(store, security, None, event_date, spec, keep_model)
    }

    pub fn fama_french_5factor(
        store: &ReturnStore,
        security: &str,
        event_date: NaiveDate,
        spec: &WindowSpec,
        keep_model: bool,
    ) -> Result<Self> {
        ModelKind::FamaFrench5.run(store, security, None, event_date, spec, keep_model)
    }
}

//! Single-event engine.
//!
//! Runs a return model over one aligned study window and derives the
//! cumulative abnormal return and its significance. A [`SingleEvent`] is fully
//! computed at construction and read-only afterwards.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::error::{EventStudyError, Result};
use crate::models::{FittedModel, ModelData, ModelSizes, ReturnModel};
use crate::stats::{cumulative_sum, significance, t_quantile};
use crate::window::{EventWindow, WindowSpec};

/// Optional metadata attached to a single event.
#[derive(Debug, Clone, Default)]
pub struct EventOptions {
    pub event_date: Option<NaiveDate>,
    pub keep_model: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SingleEvent {
    event_date: Option<NaiveDate>,
    event_window: EventWindow,
    event_window_size: usize,
    estimation_size: usize,
    buffer_size: usize,
    model_name: String,
    description: Option<String>,
    ar: Vec<f64>,
    var_ar: Vec<f64>,
    df: usize,
    car: Vec<f64>,
    var_car: Vec<f64>,
    t_stat: Vec<f64>,
    p_value: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<FittedModel>,
}

/// Lower and upper bounds of a confidence band around the CAR.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfidenceBand {
    pub level: f64,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl SingleEvent {
    /// Run `model` over `data` and compute the event statistics.
    ///
    /// Errors raised by the model propagate unchanged. A model returning
    /// residuals or variances that do not match the event window size fails
    /// with `ModelShape`.
    pub fn new<M: ReturnModel + ?Sized>(
        model: &M,
        data: &ModelData,
        spec: &WindowSpec,
        options: EventOptions,
    ) -> Result<Self> {
        spec.validate()?;
        let event_window_size = spec.event_window_size();
        let sizes = ModelSizes {
            estimation_size: spec.estimation_size,
            event_window_size,
            keep_model: options.keep_model,
        };

        debug!(
            model = model.name(),
            event_date = ?options.event_date,
            estimation_size = spec.estimation_size,
            event_window_size,
            "estimating return model"
        );
        let output = model.estimate(data, &sizes)?;

        for (field, len) in [
            ("residuals", output.residuals.len()),
            ("variance", output.variance.len()),
        ] {
            if len != event_window_size {
                return Err(EventStudyError::ModelShape {
                    model: model.name().to_string(),
                    field,
                    actual: len,
                    expected: event_window_size,
                });
            }
        }

        let ar = output.residuals;
        let var_ar = output.variance;
        let car = cumulative_sum(&ar);
        // per-period variance is a broadcast constant, so it scales with the horizon
        let var_car: Vec<f64> = var_ar
            .iter()
            .enumerate()
            .map(|(i, v)| (i + 1) as f64 * v)
            .collect();
        let (t_stat, p_value) = significance(&car, &var_car, output.df as f64);

        Ok(Self {
            event_date: options.event_date,
            event_window: spec.event_window,
            event_window_size,
            estimation_size: spec.estimation_size,
            buffer_size: spec.buffer_size,
            model_name: model.name().to_string(),
            description: options.description,
            ar,
            var_ar,
            df: output.df,
            car,
            var_car,
            t_stat,
            p_value,
            model: output.fitted,
        })
    }

    pub fn event_date(&self) -> Option<NaiveDate> {
        self.event_date
    }

    pub fn event_window(&self) -> EventWindow {
        self.event_window
    }

    pub fn event_window_size(&self) -> usize {
        self.event_window_size
    }

    pub fn estimation_size(&self) -> usize {
        self.estimation_size
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Abnormal returns.
    pub fn ar(&self) -> &[f64] {
        &self.ar
    }

    pub fn var_ar(&self) -> &[f64] {
        &self.var_ar
    }

    pub fn df(&self) -> usize {
        self.df
    }

    /// Cumulative abnormal returns.
    pub fn car(&self) -> &[f64] {
        &self.car
    }

    pub fn var_car(&self) -> &[f64] {
        &self.var_car
    }

    pub fn t_stat(&self) -> &[f64] {
        &self.t_stat
    }

    /// One-sided `1 - CDF_t(|t|, df)`.
    pub fn p_value(&self) -> &[f64] {
        &self.p_value
    }

    /// Fitted model, present only when built with `keep_model`.
    pub fn model(&self) -> Option<&FittedModel> {
        self.model.as_ref()
    }

    /// CAR at the last event-window period.
    pub fn terminal_car(&self) -> f64 {
        self.car.last().copied().unwrap_or(f64::NAN)
    }

    /// `CAR ± sqrt(var_CAR) · t⁻¹(level, df)` per period.
    pub fn confidence_band(&self, level: f64) -> ConfidenceBand {
        let q = t_quantile(level, self.df as f64);
        let (lower, upper): (Vec<f64>, Vec<f64>) = self
            .car
            .iter()
            .zip(&self.var_car)
            .map(|(c, v)| {
                let delta = v.sqrt() * q;
                (c - delta, c + delta)
            })
            .unzip();
        ConfidenceBand {
            level,
            lower,
            upper,
        }
    }
}

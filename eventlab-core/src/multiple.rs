//! Cross-sectional aggregation of single events.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, EventStudyError, Result};
use crate::single::SingleEvent;
use crate::stats::{cumulative_sum, significance, Summary};
use crate::window::EventWindow;

/// An event that could not be computed, kept for the error report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    pub detail: String,
    pub event_date: Option<NaiveDate>,
    /// Parameters the event was requested with, by name.
    pub parameters: BTreeMap<String, String>,
}

impl ErrorRecord {
    pub fn new(
        error: &EventStudyError,
        event_date: Option<NaiveDate>,
        parameters: BTreeMap<String, String>,
    ) -> Self {
        Self {
            kind: error.kind(),
            detail: error.to_string(),
            event_date,
            parameters,
        }
    }
}

/// Distribution of the sample's CARs at each relative time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CarDistribution {
    pub mean: Vec<f64>,
    pub variance: Vec<f64>,
    pub kurtosis: Vec<f64>,
    pub skewness: Vec<f64>,
    pub min: Vec<f64>,
    pub q25: Vec<f64>,
    pub median: Vec<f64>,
    pub q75: Vec<f64>,
    pub max: Vec<f64>,
}

impl CarDistribution {
    fn push(&mut self, s: Summary) {
        self.mean.push(s.mean);
        self.variance.push(s.variance);
        self.kurtosis.push(s.kurtosis);
        self.skewness.push(s.skewness);
        self.min.push(s.min);
        self.q25.push(s.q25);
        self.median.push(s.median);
        self.q75.push(s.q75);
        self.max.push(s.max);
    }

    /// Columns in report order, with their labels.
    pub fn columns(&self) -> [(&'static str, &[f64]); 9] {
        [
            ("Mean", self.mean.as_slice()),
            ("Variance", self.variance.as_slice()),
            ("Kurtosis", self.kurtosis.as_slice()),
            ("Skewness", self.skewness.as_slice()),
            ("Min", self.min.as_slice()),
            ("Quantile 25%", self.q25.as_slice()),
            ("Quantile 50%", self.median.as_slice()),
            ("Quantile 75%", self.q75.as_slice()),
            ("Max", self.max.as_slice()),
        ]
    }
}

/// Aggregate of a sample of single events sharing one event window.
#[derive(Debug, Clone, Serialize)]
pub struct MultipleEvents {
    event_window: EventWindow,
    event_window_size: usize,
    sample: Vec<SingleEvent>,
    errors: Vec<ErrorRecord>,
    aar: Vec<f64>,
    var_aar: Vec<f64>,
    df: usize,
    caar: Vec<f64>,
    var_caar: Vec<f64>,
    t_stat: Vec<f64>,
    p_value: Vec<f64>,
    car_dist: CarDistribution,
    terminal_car: Vec<f64>,
}

impl MultipleEvents {
    /// Aggregate `sample`; `errors` are carried along for reporting only.
    ///
    /// Fails with `EmptySample` on an empty sample and with
    /// `MismatchedEventWindow` when events disagree on the event window.
    pub fn new(sample: Vec<SingleEvent>, errors: Vec<ErrorRecord>) -> Result<Self> {
        let first = sample.first().ok_or(EventStudyError::EmptySample)?;
        let event_window = first.event_window();
        let event_window_size = first.event_window_size();
        for (index, event) in sample.iter().enumerate().skip(1) {
            let w = event.event_window();
            if w != event_window || event.ar().len() != event_window_size {
                return Err(EventStudyError::MismatchedEventWindow {
                    index,
                    start: w.start,
                    end: w.end,
                    expected_start: event_window.start,
                    expected_end: event_window.end,
                });
            }
        }

        let n = sample.len() as f64;
        let mut aar = vec![0.0; event_window_size];
        let mut var_aar = vec![0.0; event_window_size];
        for event in &sample {
            for t in 0..event_window_size {
                aar[t] += event.ar()[t];
                var_aar[t] += event.var_ar()[t];
            }
        }
        for t in 0..event_window_size {
            aar[t] /= n;
            var_aar[t] /= n * n;
        }

        let df: usize = sample.iter().map(SingleEvent::df).sum();
        let caar = cumulative_sum(&aar);
        let var_caar = cumulative_sum(&var_aar);
        let (t_stat, p_value) = significance(&caar, &var_caar, df as f64);

        let mut car_dist = CarDistribution::default();
        let mut cross_section = Vec::with_capacity(sample.len());
        for t in 0..event_window_size {
            cross_section.clear();
            cross_section.extend(sample.iter().map(|e| e.car()[t]));
            car_dist.push(Summary::of(&cross_section));
        }
        let terminal_car = sample.iter().map(SingleEvent::terminal_car).collect();

        Ok(Self {
            event_window,
            event_window_size,
            sample,
            errors,
            aar,
            var_aar,
            df,
            caar,
            var_caar,
            t_stat,
            p_value,
            car_dist,
            terminal_car,
        })
    }

    pub fn event_window(&self) -> EventWindow {
        self.event_window
    }

    pub fn event_window_size(&self) -> usize {
        self.event_window_size
    }

    pub fn sample(&self) -> &[SingleEvent] {
        &self.sample
    }

    pub fn errors(&self) -> &[ErrorRecord] {
        &self.errors
    }

    /// Average abnormal returns.
    pub fn aar(&self) -> &[f64] {
        &self.aar
    }

    pub fn var_aar(&self) -> &[f64] {
        &self.var_aar
    }

    /// Sum of the sample's degrees of freedom.
    pub fn df(&self) -> usize {
        self.df
    }

    pub fn caar(&self) -> &[f64] {
        &self.caar
    }

    pub fn var_caar(&self) -> &[f64] {
        &self.var_caar
    }

    pub fn t_stat(&self) -> &[f64] {
        &self.t_stat
    }

    pub fn p_value(&self) -> &[f64] {
        &self.p_value
    }

    pub fn car_distribution(&self) -> &CarDistribution {
        &self.car_dist
    }

    /// Last CAR of every event, in sample order.
    pub fn terminal_car(&self) -> &[f64] {
        &self.terminal_car
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ModelData, ModelOutput, ModelSizes};
    use crate::single::EventOptions;
    use crate::window::WindowSpec;
    use approx::assert_relative_eq;

    fn event(start: i32, end: i32, ar: Vec<f64>, var: f64, df: usize) -> SingleEvent {
        let spec = WindowSpec::new(EventWindow::new(start, end).unwrap(), 10, 0).unwrap();
        let model = move |_: &ModelData, sizes: &ModelSizes| -> Result<ModelOutput> {
            Ok(ModelOutput {
                residuals: ar.clone(),
                df,
                variance: vec![var; sizes.event_window_size],
                fitted: None,
            })
        };
        SingleEvent::new(&model, &ModelData::new(), &spec, EventOptions::default()).unwrap()
    }

    #[test]
    fn empty_sample_is_rejected() {
        assert!(matches!(
            MultipleEvents::new(vec![], vec![]),
            Err(EventStudyError::EmptySample)
        ));
    }

    #[test]
    fn mismatched_windows_are_rejected() {
        let sample = vec![
            event(-1, 1, vec![0.0; 3], 1.0, 5),
            event(-2, 0, vec![0.0; 3], 1.0, 5),
        ];
        assert!(matches!(
            MultipleEvents::new(sample, vec![]),
            Err(EventStudyError::MismatchedEventWindow { index: 1, .. })
        ));
    }

    #[test]
    fn aggregates_two_events() {
        let sample = vec![
            event(-1, 1, vec![0.01, 0.02, 0.03], 0.0004, 10),
            event(-1, 1, vec![0.03, 0.00, -0.01], 0.0002, 20),
        ];
        let m = MultipleEvents::new(sample, vec![]).unwrap();
        assert_relative_eq!(m.aar()[0], 0.02, epsilon = 1e-12);
        assert_relative_eq!(m.aar()[1], 0.01, epsilon = 1e-12);
        assert_relative_eq!(m.aar()[2], 0.01, epsilon = 1e-12);
        assert_relative_eq!(m.var_aar()[0], 0.0006 / 4.0, epsilon = 1e-15);
        assert_relative_eq!(m.caar()[2], 0.04, epsilon = 1e-12);
        // cumulative, not scaled by horizon
        assert_relative_eq!(m.var_caar()[2], 3.0 * 0.0006 / 4.0, epsilon = 1e-15);
        assert_eq!(m.df(), 30);
        assert_eq!(m.terminal_car().len(), 2);
        assert_relative_eq!(m.terminal_car()[0], 0.06, epsilon = 1e-12);
        assert_relative_eq!(m.terminal_car()[1], 0.02, epsilon = 1e-12);
    }

    #[test]
    fn car_distribution_per_time_step() {
        let sample = vec![
            event(0, 1, vec![0.01, 0.01], 0.0001, 5),
            event(0, 1, vec![0.03, 0.00], 0.0001, 5),
            event(0, 1, vec![0.02, -0.01], 0.0001, 5),
        ];
        let m = MultipleEvents::new(sample, vec![]).unwrap();
        let d = m.car_distribution();
        assert_eq!(d.mean.len(), 2);
        assert_relative_eq!(d.mean[0], 0.02, epsilon = 1e-12);
        assert_relative_eq!(d.min[0], 0.01, epsilon = 1e-12);
        assert_relative_eq!(d.max[0], 0.03, epsilon = 1e-12);
        assert_relative_eq!(d.median[0], 0.02, epsilon = 1e-12);
        assert_relative_eq!(d.variance[0], 0.0002 / 3.0, epsilon = 1e-15);
        // CARs at t = 1 are 0.02, 0.03, 0.01
        assert_relative_eq!(d.q25[1], 0.015, epsilon = 1e-12);
        assert_relative_eq!(d.q75[1], 0.025, epsilon = 1e-12);
    }

    #[test]
    fn errors_are_carried_but_not_counted() {
        let err = EventStudyError::DateNotFound {
            date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            table: "returns".into(),
        };
        let record = ErrorRecord::new(&err, None, BTreeMap::new());
        let m = MultipleEvents::new(vec![event(0, 0, vec![0.1], 0.01, 3)], vec![record]).unwrap();
        assert_eq!(m.sample().len(), 1);
        assert_eq!(m.errors().len(), 1);
        assert_eq!(m.errors()[0].kind, ErrorKind::DateNotFound);
    }
}

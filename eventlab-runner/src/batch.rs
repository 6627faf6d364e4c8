//! Batch runner: one named-model event study per descriptor, then aggregation.
//!
//! Data-availability failures (date, column or data missing) are collected
//! as [`ErrorRecord`]s and the batch continues, unless `ignore_errors` is
//! off. Every other failure aborts the batch.

use std::time::Instant;

use chrono::NaiveDate;
use eventlab_core::{
    ErrorRecord, EventStudyError, ModelKind, MultipleEvents, ReturnStore, SingleEvent, WindowSpec,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::events::{EventDescriptor, MARKET_TICKER};
use crate::report::unprocessed_summary;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("event {index} ({date}) failed: {source}")]
    Event {
        index: usize,
        date: NaiveDate,
        #[source]
        source: EventStudyError,
    },

    #[error(transparent)]
    Aggregate(#[from] EventStudyError),
}

/// Settings shared by every event of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOptions {
    pub model: ModelKind,
    pub spec: WindowSpec,
    pub keep_model: bool,
    /// Collect data-availability failures instead of aborting.
    pub ignore_errors: bool,
    pub parallel: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            model: ModelKind::MarketModel,
            spec: WindowSpec::default(),
            keep_model: false,
            ignore_errors: true,
            parallel: true,
        }
    }
}

fn run_one(store: &ReturnStore, event: &EventDescriptor, opts: &BatchOptions) -> Result<SingleEvent, EventStudyError> {
    opts.model.run(
        store,
        &event.security_ticker,
        event.market_ticker.as_deref(),
        event.event_date,
        &opts.spec,
        opts.keep_model,
    )
}

/// Run every descriptor through `run`, keeping input order.
///
/// Strict batches run sequentially and stop at the first failure. Lenient
/// batches evaluate every event, in parallel when asked, then sort outcomes
/// into the sample and the error records.
fn collect_outcomes<F>(
    events: &[EventDescriptor],
    opts: &BatchOptions,
    run: F,
) -> Result<(Vec<SingleEvent>, Vec<ErrorRecord>), BatchError>
where
    F: Fn(&EventDescriptor) -> Result<SingleEvent, EventStudyError> + Sync,
{
    let mut sample = Vec::with_capacity(events.len());
    let mut errors = Vec::new();

    if !opts.ignore_errors {
        for (index, event) in events.iter().enumerate() {
            let single = run(event).map_err(|source| BatchError::Event {
                index,
                date: event.event_date,
                source,
            })?;
            sample.push(single);
        }
        return Ok((sample, errors));
    }

    let outcomes: Vec<Result<SingleEvent, EventStudyError>> = if opts.parallel {
        events.par_iter().map(|e| run(e)).collect()
    } else {
        events.iter().map(|e| run(e)).collect()
    };

    for (index, (event, outcome)) in events.iter().zip(outcomes).enumerate() {
        match outcome {
            Ok(single) => sample.push(single),
            Err(e) if e.is_data_availability() => {
                errors.push(ErrorRecord::new(&e, Some(event.event_date), event.parameters()));
            }
            Err(source) => {
                return Err(BatchError::Event {
                    index,
                    date: event.event_date,
                    source,
                })
            }
        }
    }
    Ok((sample, errors))
}

/// Run every descriptor against `store` and aggregate the successes.
///
/// Results keep input order whether or not the batch runs in parallel.
/// When a failure aborts the batch, it is the first one in input order.
/// A model that needs a market ticker rejects the batch up front if any
/// descriptor lacks one.
pub fn run_batch(
    store: &ReturnStore,
    events: &[EventDescriptor],
    opts: &BatchOptions,
) -> Result<MultipleEvents, BatchError> {
    let started = Instant::now();

    if opts.model.needs_market() {
        if let Some((index, event)) = events
            .iter()
            .enumerate()
            .find(|(_, e)| e.market_ticker.is_none())
        {
            return Err(BatchError::Event {
                index,
                date: event.event_date,
                source: EventStudyError::MissingParameter {
                    name: MARKET_TICKER.into(),
                },
            });
        }
    }

    let (sample, errors) = collect_outcomes(events, opts, |e| run_one(store, e, opts))?;

    if let Some(summary) = unprocessed_summary(&errors) {
        warn!(count = errors.len(), "{summary}");
    }

    let successes = sample.len();
    let failures = errors.len();
    let result = MultipleEvents::new(sample, errors)?;
    info!(
        model = %opts.model,
        successes,
        failures,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "batch complete"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventlab_core::{ErrorKind, EventWindow, ReturnTable};
    use chrono::Days;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn base() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
    }

    fn day(i: u64) -> NaiveDate {
        base().checked_add_days(Days::new(i)).unwrap()
    }

    fn store() -> ReturnStore {
        let n = 60;
        let dates = (0..n as u64).map(day).collect();
        let wave = |f: f64| -> Vec<f64> { (0..n).map(|i| (i as f64 * f).sin() / 100.0).collect() };
        let table = ReturnTable::new("returns", dates)
            .unwrap()
            .with_column("SPY", wave(0.9))
            .unwrap()
            .with_column("AAPL", wave(1.7))
            .unwrap();
        let mut s = ReturnStore::new();
        s.insert(table);
        s
    }

    fn opts(ignore_errors: bool, parallel: bool) -> BatchOptions {
        BatchOptions {
            model: ModelKind::MarketModel,
            spec: WindowSpec::new(EventWindow::new(-1, 1).unwrap(), 20, 5).unwrap(),
            keep_model: false,
            ignore_errors,
            parallel,
        }
    }

    fn event(ticker: &str, d: NaiveDate) -> EventDescriptor {
        EventDescriptor::new(ticker, d).with_market("SPY")
    }

    #[test]
    fn data_errors_are_collected() {
        let events = vec![
            event("AAPL", day(40)),
            event("MSFT", day(41)),
            event("AAPL", day(2)),
            event("AAPL", day(45)),
        ];
        let m = run_batch(&store(), &events, &opts(true, true)).unwrap();
        assert_eq!(m.sample().len(), 2);
        let kinds: Vec<ErrorKind> = m.errors().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![ErrorKind::ColumnMissing, ErrorKind::InsufficientData]);
        assert_eq!(m.errors()[0].parameters["security_ticker"], "MSFT");
    }

    #[test]
    fn first_failure_aborts_when_not_ignoring() {
        let events = vec![
            event("AAPL", day(40)),
            event("AAPL", day(2)),
            event("MSFT", day(41)),
        ];
        match run_batch(&store(), &events, &opts(false, true)) {
            Err(BatchError::Event { index, source, .. }) => {
                assert_eq!(index, 1);
                assert_eq!(source.kind(), ErrorKind::InsufficientData);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn strict_batch_stops_at_first_failure() {
        let s = store();
        let o = opts(false, true);
        let events = vec![
            event("AAPL", day(40)),
            event("AAPL", day(2)),
            event("AAPL", day(41)),
            event("AAPL", day(42)),
        ];
        let calls = AtomicUsize::new(0);
        let err = collect_outcomes(&events, &o, |e| {
            calls.fetch_add(1, Ordering::SeqCst);
            run_one(&s, e, &o)
        })
        .unwrap_err();
        assert!(matches!(err, BatchError::Event { index: 1, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn lenient_batch_runs_every_event() {
        let s = store();
        let o = opts(true, true);
        let events = vec![event("AAPL", day(40)), event("AAPL", day(2)), event("AAPL", day(41))];
        let calls = AtomicUsize::new(0);
        let (sample, errors) = collect_outcomes(&events, &o, |e| {
            calls.fetch_add(1, Ordering::SeqCst);
            run_one(&s, e, &o)
        })
        .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!((sample.len(), errors.len()), (2, 1));
    }

    #[test]
    fn market_model_needs_a_market_ticker_on_every_event() {
        let events = vec![
            event("AAPL", day(40)),
            EventDescriptor::new("AAPL", day(41)),
            event("AAPL", day(42)),
        ];
        match run_batch(&store(), &events, &opts(true, true)) {
            Err(BatchError::Event { index, source, .. }) => {
                assert_eq!(index, 1);
                assert_eq!(source.kind(), ErrorKind::MissingParameter);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn constant_mean_ignores_missing_market() {
        let events = vec![EventDescriptor::new("AAPL", day(40))];
        let mut o = opts(true, false);
        o.model = ModelKind::ConstantMean;
        assert_eq!(run_batch(&store(), &events, &o).unwrap().sample().len(), 1);
    }

    #[test]
    fn missing_table_is_always_fatal() {
        let events = vec![event("AAPL", day(40))];
        let err = run_batch(&ReturnStore::new(), &events, &opts(true, false)).unwrap_err();
        assert!(matches!(
            err,
            BatchError::Event {
                source: EventStudyError::MissingParameter { .. },
                ..
            }
        ));
    }

    #[test]
    fn all_failed_is_empty_sample() {
        let events = vec![event("MSFT", day(40))];
        let err = run_batch(&store(), &events, &opts(true, false)).unwrap_err();
        assert!(matches!(err, BatchError::Aggregate(EventStudyError::EmptySample)));
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let events: Vec<_> = (30..50).map(|i| event("AAPL", day(i))).collect();
        let a = run_batch(&store(), &events, &opts(true, true)).unwrap();
        let b = run_batch(&store(), &events, &opts(true, false)).unwrap();
        assert_eq!(a.caar(), b.caar());
        assert_eq!(a.sample(), b.sample());
    }
}

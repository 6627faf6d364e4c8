//! Property tests for the batch runner.
//!
//! 1. Partition: every descriptor ends up either in the sample or in the errors
//! 2. Determinism: parallel and sequential runs agree, in input order

use chrono::{Days, NaiveDate};
use eventlab_core::{EventWindow, ModelKind, ReturnStore, WindowSpec};
use eventlab_runner::{run_batch, synthetic_returns, BatchError, BatchOptions, EventDescriptor};
use proptest::prelude::*;

const ROWS: usize = 120;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 1, 4).unwrap()
}

fn store() -> ReturnStore {
    let mut s = ReturnStore::new();
    s.insert(synthetic_returns(&["SPY", "AAPL", "MSFT"], start(), ROWS, 7).unwrap());
    s
}

fn options(parallel: bool) -> BatchOptions {
    BatchOptions {
        model: ModelKind::MarketModel,
        spec: WindowSpec::new(EventWindow::new(-3, 3).unwrap(), 40, 5).unwrap(),
        keep_model: false,
        ignore_errors: true,
        parallel,
    }
}

fn arb_events() -> impl Strategy<Value = Vec<EventDescriptor>> {
    let one = (prop::sample::select(vec!["AAPL", "MSFT", "GOOG"]), 0u64..220).prop_map(|(ticker, offset)| {
        EventDescriptor::new(ticker, start().checked_add_days(Days::new(offset)).unwrap()).with_market("SPY")
    });
    prop::collection::vec(one, 1..12)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn every_event_is_accounted_for(events in arb_events()) {
        let s = store();
        match run_batch(&s, &events, &options(true)) {
            Ok(m) => {
                prop_assert_eq!(m.sample().len() + m.errors().len(), events.len());
                prop_assert!(m.errors().iter().all(|e| e.kind.is_data_availability()));
            }
            Err(BatchError::Aggregate(_)) => {
                // every event failed on data availability
            }
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }

    #[test]
    fn parallel_matches_sequential(events in arb_events()) {
        let s = store();
        let a = run_batch(&s, &events, &options(true));
        let b = run_batch(&s, &events, &options(false));
        match (a, b) {
            (Ok(a), Ok(b)) => {
                prop_assert_eq!(a.sample(), b.sample());
                prop_assert_eq!(a.errors(), b.errors());
            }
            (Err(_), Err(_)) => {}
            _ => prop_assert!(false, "parallel and sequential runs disagree"),
        }
    }
}

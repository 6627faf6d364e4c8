//! EventLab Core, the event-study engine: windows, return models, single events, aggregation.
//!
//! This crate contains the computational heart of an event study:
//! - Date lookup with forward probing over non-trading days
//! - Study window arithmetic (estimation, buffer, event)
//! - Return tables and the explicit [`ReturnStore`](data::ReturnStore)
//! - Return models: constant mean, market model, Fama-French 3 and 5 factor
//! - Single-event AR / CAR with Student-t significance
//! - Cross-sectional AAR / CAAR and CAR distribution statistics

pub mod data;
pub mod error;
pub mod models;
pub mod multiple;
pub mod named;
pub mod single;
pub mod stats;
pub mod window;

pub use data::{ReturnStore, ReturnTable};
pub use error::{ErrorKind, EventStudyError, Result};
pub use models::{FittedModel, ModelData, ModelOutput, ModelSizes, ReturnModel};
pub use multiple::{CarDistribution, ErrorRecord, MultipleEvents};
pub use named::ModelKind;
pub use single::{ConfidenceBand, EventOptions, SingleEvent};
pub use window::{EventWindow, WindowSpec};

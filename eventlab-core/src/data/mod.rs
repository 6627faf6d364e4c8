//! Return tables, event-date lookup and the series store.

pub mod locate;
pub mod series;
pub mod store;

pub use locate::{locate, Located, DEFAULT_MAX_PROBE_DAYS};
pub use series::ReturnTable;
pub use store::{ReturnStore, WindowSlice, FAMA_FRENCH, RETURNS};

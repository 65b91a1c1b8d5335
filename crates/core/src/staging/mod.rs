//! Staging of incoming payment events.
//!
//! Payment events are appended to a temporary table for later processing.
//! Staging is best-effort: a failed write is logged and counted, never
//! surfaced to the sender.

mod sqlite;
mod stager;
mod store;

pub use sqlite::SqliteStagingStore;
pub use stager::PaymentStager;
pub use store::{StagedPayment, StagingError, StagingStore};

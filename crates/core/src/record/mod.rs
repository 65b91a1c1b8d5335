//! Operational status records.
//!
//! The operational table is written by the downstream processing pipeline;
//! this crate only reads it (the `put` on the SQLite adapter exists for
//! local tooling and tests). Records for one `hashId` are totally ordered by
//! their `execDateTime` sort key.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteRecordStore;
pub use store::{RecordStore, RecordStoreError};
pub use types::{HashId, OperationalRecord};

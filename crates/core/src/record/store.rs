//! Record store trait and error type.

use async_trait::async_trait;
use thiserror::Error;

use super::{HashId, OperationalRecord};

#[derive(Debug, Error)]
pub enum RecordStoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Read access to the operational table.
///
/// All reads are strongly consistent.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// The most recent record for `hash_id` by `execDateTime`, if any.
    async fn latest_by_key(
        &self,
        hash_id: &HashId,
    ) -> Result<Option<OperationalRecord>, RecordStoreError>;

    /// Whether any record for `hash_id` carries `status`.
    async fn exists_by_key_and_status(
        &self,
        hash_id: &HashId,
        status: &str,
    ) -> Result<bool, RecordStoreError>;

    /// Point lookup on the full primary key.
    async fn by_key_and_exec_date_time(
        &self,
        hash_id: &HashId,
        exec_date_time: &str,
    ) -> Result<Option<OperationalRecord>, RecordStoreError>;
}

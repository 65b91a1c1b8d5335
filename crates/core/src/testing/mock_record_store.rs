//! Mock record store for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::record::{HashId, OperationalRecord, RecordStore, RecordStoreError};

/// Mock implementation of the RecordStore trait.
///
/// Holds records in memory and logs every query by name
/// (`latest_by_key`, `exists_by_key_and_status`, `by_key_and_exec_date_time`).
#[derive(Debug, Clone, Default)]
pub struct MockRecordStore {
    records: Arc<RwLock<Vec<OperationalRecord>>>,
    calls: Arc<RwLock<Vec<String>>>,
    /// If set, the next query will fail with this error.
    next_error: Arc<RwLock<Option<RecordStoreError>>>,
}

impl MockRecordStore {
    /// Create an empty mock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record, replacing any with the same key.
    pub async fn insert(&self, record: OperationalRecord) {
        let mut records = self.records.write().await;
        records.retain(|r| {
            !(r.hash_id == record.hash_id && r.exec_date_time == record.exec_date_time)
        });
        records.push(record);
    }

    /// Names of the queries made so far, in order.
    pub async fn calls(&self) -> Vec<String> {
        self.calls.read().await.clone()
    }

    /// Configure the next query to fail with the given error.
    pub async fn set_next_error(&self, error: RecordStoreError) {
        *self.next_error.write().await = Some(error);
    }

    async fn record(&self, call: &str) -> Result<(), RecordStoreError> {
        self.calls.write().await.push(call.to_string());
        match self.next_error.write().await.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RecordStore for MockRecordStore {
    async fn latest_by_key(
        &self,
        hash_id: &HashId,
    ) -> Result<Option<OperationalRecord>, RecordStoreError> {
        self.record("latest_by_key").await?;
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| &r.hash_id == hash_id)
            .max_by(|a, b| a.exec_date_time.cmp(&b.exec_date_time))
            .cloned())
    }

    async fn exists_by_key_and_status(
        &self,
        hash_id: &HashId,
        status: &str,
    ) -> Result<bool, RecordStoreError> {
        self.record("exists_by_key_and_status").await?;
        Ok(self
            .records
            .read()
            .await
            .iter()
            .any(|r| &r.hash_id == hash_id && r.has_status(status)))
    }

    async fn by_key_and_exec_date_time(
        &self,
        hash_id: &HashId,
        exec_date_time: &str,
    ) -> Result<Option<OperationalRecord>, RecordStoreError> {
        self.record("by_key_and_exec_date_time").await?;
        Ok(self
            .records
            .read()
            .await
            .iter()
            .find(|r| &r.hash_id == hash_id && r.exec_date_time == exec_date_time)
            .cloned())
    }
}

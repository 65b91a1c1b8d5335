//! Trait definitions for the queue module.

use async_trait::async_trait;

use super::error::QueueError;
use super::types::ReceivedMessage;

/// The queue operations the dispatch engine and reconciler consume.
#[async_trait]
pub trait QueueService: Send + Sync {
    /// Url of the first queue whose name starts with `prefix`.
    async fn resolve_url_by_prefix(&self, prefix: &str) -> Result<Option<String>, QueueError>;

    /// Receive at most one message. The message is hidden from other
    /// consumers until deleted or until its visibility expires.
    async fn receive_one(&self, queue_url: &str) -> Result<Option<ReceivedMessage>, QueueError>;

    /// Delete a received message by its receipt handle.
    async fn delete_message(&self, queue_url: &str, receipt_handle: &str)
        -> Result<(), QueueError>;

    /// Urls of every queue whose name starts with `prefix`.
    async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<String>, QueueError>;
}

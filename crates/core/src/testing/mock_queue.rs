//! Mock queue service for testing.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::queue::{queue_name_from_url, QueueError, QueueService, ReceivedMessage};

const MOCK_QUEUE_BASE: &str = "mock://queues";

/// A call made against the mock, for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueCall {
    ResolveUrl { prefix: String },
    Receive { queue_url: String },
    Delete { queue_url: String, receipt_handle: String },
    List { prefix: String },
}

/// Mock implementation of the QueueService trait.
///
/// Queues are keyed by name and addressed as `mock://queues/{name}`. A
/// received message moves to an in-flight set until it is deleted; it is not
/// redelivered (the visibility timeout never expires).
#[derive(Debug, Clone, Default)]
pub struct MockQueueService {
    /// Pending messages per queue name.
    queues: Arc<RwLock<BTreeMap<String, VecDeque<String>>>>,
    /// Receipt handle -> (queue name, body) of received, undeleted messages.
    in_flight: Arc<RwLock<HashMap<String, (String, String)>>>,
    /// Every call, in order.
    calls: Arc<RwLock<Vec<QueueCall>>>,
    /// If set, the next call will fail with this error.
    next_error: Arc<RwLock<Option<QueueError>>>,
    handle_seq: Arc<AtomicU64>,
}

impl MockQueueService {
    /// Create a new mock queue service with no queues.
    pub fn new() -> Self {
        Self::default()
    }

    /// Url of a queue name.
    pub fn url_for(name: &str) -> String {
        format!("{}/{}", MOCK_QUEUE_BASE, name)
    }

    /// Provision an empty queue, returning its url.
    pub async fn add_queue(&self, name: &str) -> String {
        self.queues
            .write()
            .await
            .entry(name.to_string())
            .or_default();
        Self::url_for(name)
    }

    /// Append a message to a queue, creating the queue if needed.
    pub async fn push_message(&self, name: &str, body: impl Into<String>) -> String {
        self.queues
            .write()
            .await
            .entry(name.to_string())
            .or_default()
            .push_back(body.into());
        Self::url_for(name)
    }

    /// Messages not yet received in a queue.
    pub async fn pending_count(&self, name: &str) -> usize {
        self.queues
            .read()
            .await
            .get(name)
            .map(|q| q.len())
            .unwrap_or(0)
    }

    /// Received messages that were never deleted.
    pub async fn in_flight_count(&self) -> usize {
        self.in_flight.read().await.len()
    }

    /// Get every recorded call.
    pub async fn calls(&self) -> Vec<QueueCall> {
        self.calls.read().await.clone()
    }

    /// Receipt handles deleted so far, in order.
    pub async fn deleted_handles(&self) -> Vec<String> {
        self.calls
            .read()
            .await
            .iter()
            .filter_map(|c| match c {
                QueueCall::Delete { receipt_handle, .. } => Some(receipt_handle.clone()),
                _ => None,
            })
            .collect()
    }

    /// Configure the next call to fail with the given error.
    pub async fn set_next_error(&self, error: QueueError) {
        *self.next_error.write().await = Some(error);
    }

    async fn record(&self, call: QueueCall) -> Result<(), QueueError> {
        self.calls.write().await.push(call);
        match self.next_error.write().await.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn names_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.queues
            .read()
            .await
            .keys()
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl QueueService for MockQueueService {
    async fn resolve_url_by_prefix(&self, prefix: &str) -> Result<Option<String>, QueueError> {
        self.record(QueueCall::ResolveUrl {
            prefix: prefix.to_string(),
        })
        .await?;
        Ok(self
            .names_with_prefix(prefix)
            .await
            .first()
            .map(|name| Self::url_for(name)))
    }

    async fn receive_one(&self, queue_url: &str) -> Result<Option<ReceivedMessage>, QueueError> {
        self.record(QueueCall::Receive {
            queue_url: queue_url.to_string(),
        })
        .await?;

        let name = queue_name_from_url(queue_url).to_string();
        let body = {
            let mut queues = self.queues.write().await;
            let queue = queues.get_mut(&name).ok_or_else(|| QueueError::QueueNotFound {
                url: queue_url.to_string(),
            })?;
            queue.pop_front()
        };

        Ok(match body {
            Some(body) => {
                let handle = format!("rh-{}", self.handle_seq.fetch_add(1, Ordering::SeqCst) + 1);
                self.in_flight
                    .write()
                    .await
                    .insert(handle.clone(), (name, body.clone()));
                Some(ReceivedMessage::new(body, handle))
            }
            None => None,
        })
    }

    async fn delete_message(
        &self,
        queue_url: &str,
        receipt_handle: &str,
    ) -> Result<(), QueueError> {
        self.record(QueueCall::Delete {
            queue_url: queue_url.to_string(),
            receipt_handle: receipt_handle.to_string(),
        })
        .await?;
        self.in_flight.write().await.remove(receipt_handle);
        Ok(())
    }

    async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<String>, QueueError> {
        self.record(QueueCall::List {
            prefix: prefix.to_string(),
        })
        .await?;
        Ok(self
            .names_with_prefix(prefix)
            .await
            .iter()
            .map(|name| Self::url_for(name))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_receive_then_delete() {
        let queues = MockQueueService::new();
        let url = queues.push_message("pfx-ar-invoice.fifo", "{}").await;

        let message = queues.receive_one(&url).await.unwrap().unwrap();
        assert_eq!(message.receipt_handle, "rh-1");
        assert_eq!(queues.in_flight_count().await, 1);
        assert!(queues.receive_one(&url).await.unwrap().is_none());

        queues.delete_message(&url, &message.receipt_handle).await.unwrap();
        assert_eq!(queues.in_flight_count().await, 0);
        assert_eq!(queues.deleted_handles().await, vec!["rh-1".to_string()]);
    }

    #[tokio::test]
    async fn test_prefix_lookups() {
        let queues = MockQueueService::new();
        queues.add_queue("pfx-ar-receipt.fifo").await;
        queues.add_queue("pfx-ar-invoice.fifo").await;
        queues.add_queue("pfx-cl-invoice.fifo").await;

        let urls = queues.list_by_prefix("pfx-ar").await.unwrap();
        assert_eq!(urls.len(), 2);

        let url = queues.resolve_url_by_prefix("pfx-ar-invoice").await.unwrap();
        assert_eq!(url, Some(MockQueueService::url_for("pfx-ar-invoice.fifo")));
    }

    #[tokio::test]
    async fn test_next_error_is_recorded_and_consumed() {
        let queues = MockQueueService::new();
        queues.add_queue("q").await;
        queues
            .set_next_error(QueueError::Backend("unavailable".to_string()))
            .await;

        assert!(queues.list_by_prefix("q").await.is_err());
        assert!(queues.list_by_prefix("q").await.is_ok());
        assert_eq!(queues.calls().await.len(), 2);
    }
}

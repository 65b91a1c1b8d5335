//! Error types for the dispatch module.

use thiserror::Error;

use crate::invoker::InvokerError;
use crate::queue::QueueError;
use crate::record::RecordStoreError;

/// A failed dispatch invocation. Every variant is fatal for the invocation;
/// redelivery is up to whatever delivered the trigger.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Record store call failed: {0}")]
    RecordStore(#[from] RecordStoreError),

    #[error("Queue call failed: {0}")]
    Queue(#[from] QueueError),

    #[error("Downstream invocation failed: {0}")]
    Invoker(#[from] InvokerError),

    #[error("Failed to build dispatch payload: {0}")]
    Payload(String),
}

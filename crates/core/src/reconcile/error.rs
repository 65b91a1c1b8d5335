//! Error types for the reconcile module.

use thiserror::Error;

use crate::invoker::InvokerError;
use crate::queue::QueueError;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Failed to list queues: {0}")]
    Queue(#[from] QueueError),

    #[error("Downstream invocation failed: {0}")]
    Invoker(#[from] InvokerError),

    #[error("Failed to encode {what}: {reason}")]
    Encoding { what: &'static str, reason: String },
}

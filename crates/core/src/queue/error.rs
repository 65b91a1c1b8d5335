//! Error types for the queue module.

use thiserror::Error;

/// Errors that can occur while talking to the queue service.
#[derive(Debug, Error)]
pub enum QueueError {
    /// No queue is provisioned at the given url.
    #[error("Queue not found: {url}")]
    QueueNotFound { url: String },

    /// A message body could not be decoded.
    #[error("Malformed queue message: {reason}")]
    MalformedMessage { reason: String },

    /// Backend storage failure.
    #[error("Queue backend error: {0}")]
    Backend(String),
}

impl QueueError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedMessage {
            reason: reason.into(),
        }
    }
}

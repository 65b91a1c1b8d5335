//! Trait definitions for the invoker module.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::error::InvokerError;

/// Acknowledgment that a target accepted a job.
#[derive(Debug, Clone, Serialize)]
pub struct InvocationAck {
    pub target: String,
    pub request_id: String,
    pub accepted_at: DateTime<Utc>,
}

impl InvocationAck {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            request_id: uuid::Uuid::new_v4().to_string(),
            accepted_at: Utc::now(),
        }
    }
}

/// Fire-and-forget submission of a payload to a named target.
#[async_trait]
pub trait Invoker: Send + Sync {
    /// Submit `payload` to `target`, returning once the job is accepted.
    async fn invoke_async(&self, target: &str, payload: Value)
        -> Result<InvocationAck, InvokerError>;
}

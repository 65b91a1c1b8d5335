//! Staging store trait and types.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The event is not a JSON object.
    #[error("Payment event must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// A payment event as stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StagedPayment {
    pub id: i64,
    pub organization_code: Option<String>,
    pub payment: Map<String, Value>,
    pub staged_at: String,
}

/// Append-only store of payment events.
#[async_trait]
pub trait StagingStore: Send + Sync {
    /// Append a payment event, returning its row id.
    async fn append(&self, payment: &Map<String, Value>) -> Result<i64, StagingError>;
}

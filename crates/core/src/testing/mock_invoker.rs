//! Mock invoker for testing.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::invoker::{InvocationAck, Invoker, InvokerError};

/// A recorded invocation for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedInvocation {
    /// Target the payload was submitted to.
    pub target: String,
    /// Submitted payload.
    pub payload: Value,
    /// Whether the mock accepted it.
    pub accepted: bool,
}

/// Mock implementation of the Invoker trait.
///
/// Provides controllable behavior for testing:
/// - Track every submission for assertions
/// - Fail the next submission, or every submission to a target
///
/// # Example
///
/// ```rust,ignore
/// use payflow_core::testing::MockInvoker;
///
/// let invoker = MockInvoker::new();
/// invoker.invoke_async("get-payments-ar", payload).await?;
///
/// let calls = invoker.invocations_for("get-payments-ar").await;
/// assert_eq!(calls.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockInvoker {
    /// Recorded invocations, in submission order.
    invocations: Arc<RwLock<Vec<RecordedInvocation>>>,
    /// If set, the next invocation will fail with this error.
    next_error: Arc<RwLock<Option<InvokerError>>>,
    /// Targets that always reject.
    failing_targets: Arc<RwLock<HashSet<String>>>,
}

impl MockInvoker {
    /// Create a new mock invoker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded invocations.
    pub async fn recorded_invocations(&self) -> Vec<RecordedInvocation> {
        self.invocations.read().await.clone()
    }

    /// Payloads accepted by `target`, in order.
    pub async fn invocations_for(&self, target: &str) -> Vec<Value> {
        self.invocations
            .read()
            .await
            .iter()
            .filter(|i| i.accepted && i.target == target)
            .map(|i| i.payload.clone())
            .collect()
    }

    /// Get the number of invocations attempted.
    pub async fn invocation_count(&self) -> usize {
        self.invocations.read().await.len()
    }

    /// Clear recorded invocations.
    pub async fn clear_recorded_invocations(&self) {
        self.invocations.write().await.clear();
    }

    /// Configure the next invocation to fail with the given error.
    pub async fn set_next_error(&self, error: InvokerError) {
        *self.next_error.write().await = Some(error);
    }

    /// Reject every invocation addressed to `target`.
    pub async fn fail_target(&self, target: &str) {
        self.failing_targets.write().await.insert(target.to_string());
    }

    async fn take_error(&self, target: &str) -> Option<InvokerError> {
        if let Some(err) = self.next_error.write().await.take() {
            return Some(err);
        }
        if self.failing_targets.read().await.contains(target) {
            return Some(InvokerError::Rejected {
                target: target.to_string(),
                status: 500,
            });
        }
        None
    }
}

#[async_trait]
impl Invoker for MockInvoker {
    async fn invoke_async(
        &self,
        target: &str,
        payload: Value,
    ) -> Result<InvocationAck, InvokerError> {
        let error = self.take_error(target).await;
        self.invocations.write().await.push(RecordedInvocation {
            target: target.to_string(),
            payload,
            accepted: error.is_none(),
        });

        match error {
            Some(err) => Err(err),
            None => Ok(InvocationAck::new(target)),
        }
    }
}

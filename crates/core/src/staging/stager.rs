use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error};

use super::store::{StagingError, StagingStore};
use crate::metrics::{PAYMENTS_STAGED, PAYMENTS_STAGING_FAILED};

/// Writes incoming payment events to the staging store.
pub struct PaymentStager {
    store: Arc<dyn StagingStore>,
}

impl PaymentStager {
    pub fn new(store: Arc<dyn StagingStore>) -> Self {
        Self { store }
    }

    /// Stage one payment event, copying `organizationCode` into
    /// `organization_code`.
    ///
    /// Never fails; returns the row id when the event was stored.
    pub async fn stage(&self, event: Value) -> Option<i64> {
        match self.try_stage(event).await {
            Ok(id) => {
                PAYMENTS_STAGED.inc();
                debug!("Staged payment {}", id);
                Some(id)
            }
            Err(e) => {
                PAYMENTS_STAGING_FAILED.inc();
                error!("Failed to stage payment: {}", e);
                None
            }
        }
    }

    async fn try_stage(&self, event: Value) -> Result<i64, StagingError> {
        let mut payment = match event {
            Value::Object(map) => map,
            other => return Err(StagingError::NotAnObject(json_kind(&other))),
        };

        let organization_code = payment
            .get("organizationCode")
            .cloned()
            .unwrap_or(Value::Null);
        payment.insert("organization_code".to_string(), organization_code);

        self.store.append(&payment).await
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

//! HTTP invoker.
//!
//! Each target is an endpoint under a common base url. A job is a JSON POST
//! marked `X-Invocation-Type: Event`; the target is expected to queue the
//! work and answer immediately.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::InvokerConfig;

use super::{InvocationAck, Invoker, InvokerError};

/// Header telling the target not to hold the connection for a result.
pub const INVOCATION_TYPE_HEADER: &str = "X-Invocation-Type";

/// Request id echoed back by targets that track submissions.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// HTTP invoker implementation.
pub struct HttpInvoker {
    client: Client,
    base_url: String,
}

impl HttpInvoker {
    /// Create a new HttpInvoker with the given configuration.
    pub fn new(config: &InvokerConfig) -> Result<Self, InvokerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| InvokerError::Setup(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn target_url(&self, target: &str) -> String {
        format!("{}/{}", self.base_url, target.trim_start_matches('/'))
    }
}

#[async_trait]
impl Invoker for HttpInvoker {
    async fn invoke_async(
        &self,
        target: &str,
        payload: Value,
    ) -> Result<InvocationAck, InvokerError> {
        let mut ack = InvocationAck::new(target);
        let url = self.target_url(target);
        debug!("Invoking {} ({})", target, url);

        let response = self
            .client
            .post(&url)
            .header(INVOCATION_TYPE_HEADER, "Event")
            .header(REQUEST_ID_HEADER, &ack.request_id)
            .json(&payload)
            .send()
            .await
            .map_err(|e| InvokerError::Transport {
                target: target.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(InvokerError::Rejected {
                target: target.to_string(),
                status: status.as_u16(),
            });
        }

        if let Some(id) = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            ack.request_id = id.to_string();
        }

        Ok(ack)
    }
}

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::record::HashId;

use super::error::QueueError;

/// Suffix marking a queue as ordered and deduplicated.
pub const FIFO_SUFFIX: &str = ".fifo";

/// A message held by the current consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    /// Raw JSON body.
    pub body: String,
    /// Proof that this consumer holds the message; required to delete it.
    pub receipt_handle: String,
}

impl ReceivedMessage {
    pub fn new(body: impl Into<String>, receipt_handle: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            receipt_handle: receipt_handle.into(),
        }
    }

    /// Decode the body as a pending unit of work.
    pub fn parse_body(&self) -> Result<QueueMessageBody, QueueError> {
        serde_json::from_str(&self.body).map_err(|e| QueueError::malformed(e.to_string()))
    }
}

/// Body of a pending unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueMessageBody {
    pub exec_date_time: String,
    pub country_code: String,
    pub doc_type: String,
    pub prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql_config_file_pre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_handle: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl QueueMessageBody {
    /// The operational key this message belongs to.
    pub fn hash_id(&self) -> HashId {
        HashId::new(&self.prefix, &self.country_code, &self.doc_type)
    }

    pub fn with_receipt_handle(mut self, receipt_handle: impl Into<String>) -> Self {
        self.receipt_handle = Some(receipt_handle.into());
        self
    }
}

/// Queue name of a queue url (its last path segment).
pub fn queue_name_from_url(queue_url: &str) -> &str {
    queue_url.rsplit('/').next().unwrap_or(queue_url)
}

/// Whether a queue url names exactly `queue_name`, ignoring the queue type
/// suffix. A name that merely starts with `queue_name` does not match.
pub fn queue_matches_name(queue_url: &str, queue_name: &str) -> bool {
    let name = queue_name_from_url(queue_url);
    name.strip_suffix(FIFO_SUFFIX).unwrap_or(name) == queue_name
}

/// Document-type token of a queue url or name: the last `-` segment, up to
/// the first `.`.
pub fn doc_type_token(queue_url: &str) -> &str {
    let last = queue_url.rsplit('-').next().unwrap_or(queue_url);
    last.split('.').next().unwrap_or(last)
}

//! Types for the dispatch engine.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::queue::QueueMessageBody;
use crate::record::{HashId, OperationalRecord};

/// Operation tag of a change notification.
///
/// Tags other than the three well-known ones are kept verbatim and routed
/// to the status-transition branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChangeOperation {
    Insert,
    Modify,
    Remove,
    Other(String),
}

impl From<String> for ChangeOperation {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "INSERT" => Self::Insert,
            "MODIFY" => Self::Modify,
            "REMOVE" => Self::Remove,
            _ => Self::Other(tag),
        }
    }
}

impl From<ChangeOperation> for String {
    fn from(op: ChangeOperation) -> Self {
        op.to_string()
    }
}

impl fmt::Display for ChangeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insert => f.write_str("INSERT"),
            Self::Modify => f.write_str("MODIFY"),
            Self::Remove => f.write_str("REMOVE"),
            Self::Other(tag) => f.write_str(tag),
        }
    }
}

/// Primary key of the changed record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeKey {
    pub hash_id: HashId,
    pub exec_date_time: String,
}

/// A change-feed notification for one operational record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub operation: ChangeOperation,
    pub key: ChangeKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_image: Option<OperationalRecord>,
}

/// Instruction to receive and delete one message from a queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrainSignal {
    pub queue_url: String,
    pub receipt_handle: String,
}

/// Anything the dispatch engine can be invoked with.
///
/// On the wire a drain signal is an object with `queueUrl` and
/// `receiptHandle` and no `key`; a change event carries `operation` and
/// `key`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawTrigger")]
pub enum TriggerEvent {
    Drain(DrainSignal),
    Change(ChangeEvent),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTrigger {
    queue_url: Option<String>,
    receipt_handle: Option<String>,
    operation: Option<ChangeOperation>,
    key: Option<ChangeKey>,
    new_image: Option<OperationalRecord>,
}

impl TryFrom<RawTrigger> for TriggerEvent {
    type Error = String;

    fn try_from(raw: RawTrigger) -> Result<Self, Self::Error> {
        match (raw.key, raw.receipt_handle) {
            (Some(key), _) => {
                let operation = raw
                    .operation
                    .ok_or_else(|| "change event without operation".to_string())?;
                Ok(Self::Change(ChangeEvent {
                    operation,
                    key,
                    new_image: raw.new_image,
                }))
            }
            (None, Some(receipt_handle)) => {
                let queue_url = raw
                    .queue_url
                    .ok_or_else(|| "drain signal without queueUrl".to_string())?;
                Ok(Self::Drain(DrainSignal {
                    queue_url,
                    receipt_handle,
                }))
            }
            (None, None) => {
                Err("trigger is neither a change event nor a drain signal".to_string())
            }
        }
    }
}

/// Processing window handed to the downstream job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetWindow {
    pub from_date_time: Option<String>,
    pub to_date_time: Option<String>,
}

impl PresetWindow {
    pub fn of(record: Option<&OperationalRecord>) -> Self {
        Self {
            from_date_time: record.and_then(|r| r.from_date_time.clone()),
            to_date_time: record.and_then(|r| r.to_date_time.clone()),
        }
    }
}

/// Payload submitted to the dispatch target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchPayload {
    /// Operational state the job starts from.
    pub operational: Option<OperationalRecord>,
    /// The pending message, with its receipt handle.
    pub message: QueueMessageBody,
    pub sql_config_file: Option<String>,
    pub preset_data: Vec<PresetWindow>,
}

/// What one invocation of the engine did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// A drain signal was served.
    Drained { queue_url: String, deleted: bool },
    /// The key belongs to another country.
    ForeignCountry { hash_id: HashId },
    /// REMOVE notifications are ignored.
    Removed,
    /// MODIFY notifications are reporting transitions, not dispatch triggers.
    Modified,
    /// A not-accepted status is present for the key.
    Blocked { status: String },
    /// No queue is provisioned for the key.
    QueueNotFound { hash_id: HashId },
    /// The key's queue has nothing pending.
    NoPendingMessage { queue_url: String },
    /// The new image's status is neither the ok nor the error status.
    NotTerminalStatus { status: Option<String> },
    /// The record named by the pending message does not exist.
    RecordNotFound { exec_date_time: String },
    /// The resolved record and the pending message disagree on execDateTime.
    CorrelationMismatch {
        record_exec_date_time: String,
        message_exec_date_time: String,
    },
    /// One downstream job was submitted.
    Dispatched {
        hash_id: HashId,
        exec_date_time: String,
        request_id: String,
    },
}

impl DispatchOutcome {
    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Drained { .. } => "drained",
            Self::ForeignCountry { .. } => "foreign_country",
            Self::Removed => "removed",
            Self::Modified => "modified",
            Self::Blocked { .. } => "blocked",
            Self::QueueNotFound { .. } => "queue_not_found",
            Self::NoPendingMessage { .. } => "no_message",
            Self::NotTerminalStatus { .. } => "not_terminal_status",
            Self::RecordNotFound { .. } => "record_not_found",
            Self::CorrelationMismatch { .. } => "correlation_mismatch",
            Self::Dispatched { .. } => "dispatched",
        }
    }

    pub fn is_dispatched(&self) -> bool {
        matches!(self, Self::Dispatched { .. })
    }
}

//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the record store, queue
//! service and downstream invoker, so both handlers can be exercised end to
//! end without real infrastructure.
//!
//! # Example
//!
//! ```rust,ignore
//! use payflow_core::testing::{fixtures, MockInvoker, MockQueueService, MockRecordStore};
//!
//! let queues = MockQueueService::new();
//! queues.push_message("pfx-ar-invoice.fifo", fixtures::message_body(EXEC).to_string()).await;
//!
//! // Build a DispatchEngine over the mocks, then assert on
//! // invoker.invocations_for("get-payments-ar")...
//! ```

mod mock_invoker;
mod mock_queue;
mod mock_record_store;

pub use mock_invoker::{MockInvoker, RecordedInvocation};
pub use mock_queue::{MockQueueService, QueueCall};
pub use mock_record_store::MockRecordStore;

/// Test fixtures and helper functions.
pub mod fixtures {
    use serde_json::{json, Value};

    use crate::config::{load_config_from_str, Config};
    use crate::dispatch::{ChangeEvent, ChangeKey, DispatchSettings, DrainSignal, TriggerEvent};
    use crate::reconcile::ReconcileSettings;
    use crate::record::{HashId, OperationalRecord};

    /// A complete configuration for country AR, prefix `pfx`, doc types
    /// `invoice` and `receipt`.
    pub const TEST_CONFIG_TOML: &str = r#"
[pipeline]
country_code = "AR"
prefix = "pfx"
not_accepted_statuses = ["PROCESSING", "BLOCKED"]
sql_config_file_pre = "pre.sql"
sql_config_file_post = "post.sql"

[targets]
dispatch = "get-payments-ar"
error_report = "get-errors"
create_queues = "create-queues"
enqueue = "enqueue"
delete_queues = "delete-queues"
create_provisional = "create-provisional-operational"
to_provisional = "to-provisional-operational"
on_error = "to-error"

[doc_types]
invoice = 3
receipt = 1
"#;

    /// Parsed [`TEST_CONFIG_TOML`].
    pub fn test_config() -> Config {
        load_config_from_str(TEST_CONFIG_TOML).expect("test config parses")
    }

    pub fn dispatch_settings() -> DispatchSettings {
        DispatchSettings::from_config(&test_config())
    }

    pub fn reconcile_settings() -> ReconcileSettings {
        ReconcileSettings::from_config(&test_config())
    }

    /// An operational record with a status.
    pub fn record(hash_id: &str, exec_date_time: &str, status: &str) -> OperationalRecord {
        OperationalRecord::new(hash_id, exec_date_time).with_status(status)
    }

    /// Body of a pending `pfx-ar-invoice` message.
    pub fn message_body(exec_date_time: &str) -> Value {
        json!({
            "execDateTime": exec_date_time,
            "countryCode": "AR",
            "docType": "invoice",
            "prefix": "pfx",
            "sqlConfigFilePre": "pre.sql",
            "sqsMaxQueues": "3"
        })
    }

    /// A change notification for `hash_id` at `exec_date_time`.
    pub fn change_event(
        operation: &str,
        hash_id: &str,
        exec_date_time: &str,
        new_image: Option<OperationalRecord>,
    ) -> TriggerEvent {
        TriggerEvent::Change(ChangeEvent {
            operation: operation.to_string().into(),
            key: ChangeKey {
                hash_id: HashId::from(hash_id),
                exec_date_time: exec_date_time.to_string(),
            },
            new_image,
        })
    }

    pub fn drain_signal(queue_url: &str, receipt_handle: &str) -> TriggerEvent {
        TriggerEvent::Drain(DrainSignal {
            queue_url: queue_url.to_string(),
            receipt_handle: receipt_handle.to_string(),
        })
    }
}

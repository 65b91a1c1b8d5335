pub mod config;
pub mod dispatch;
pub mod error_report;
pub mod invoker;
pub mod metrics;
pub mod queue;
pub mod reconcile;
pub mod record;
pub mod staging;
pub mod testing;
pub mod timestamp;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use dispatch::{DispatchEngine, DispatchError, DispatchOutcome, DispatchSettings, TriggerEvent};
pub use error_report::{send_error_report, ErrorReport};
pub use invoker::{HttpInvoker, InvocationAck, Invoker, InvokerError};
pub use queue::{QueueError, QueueService, SqliteQueueService};
pub use reconcile::{QueueReconciler, ReconcileError, ReconcileReport, ReconcileSettings};
pub use record::{HashId, OperationalRecord, RecordStore, RecordStoreError, SqliteRecordStore};
pub use staging::{PaymentStager, SqliteStagingStore, StagingError, StagingStore};

//! Named at-least-once delivery queues.
//!
//! A received message stays hidden for the visibility timeout and comes back
//! unless it is deleted with the receipt handle handed out by that receive.

mod error;
mod sqlite_queue;
mod traits;
mod types;

pub use error::QueueError;
pub use sqlite_queue::SqliteQueueService;
pub use traits::QueueService;
pub use types::{
    doc_type_token, queue_matches_name, queue_name_from_url, QueueMessageBody, ReceivedMessage,
    FIFO_SUFFIX,
};

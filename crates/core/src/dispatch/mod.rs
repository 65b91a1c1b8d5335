//! Status-driven dispatch of pending payment work.
//!
//! The engine reacts to change notifications on the operational table. When
//! a record for a stream becomes eligible it correlates the stream's pending
//! queue message with the operational state, deletes the message and submits
//! an enriched payload downstream. A drain signal simply receives and
//! deletes one message.

mod engine;
mod error;
mod types;

pub use engine::{DispatchEngine, DispatchSettings};
pub use error::DispatchError;
pub use types::{
    ChangeEvent, ChangeKey, ChangeOperation, DispatchOutcome, DispatchPayload, DrainSignal,
    PresetWindow, TriggerEvent,
};

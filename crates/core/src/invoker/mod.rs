//! One-way submission of work to downstream processing targets.
//!
//! An invocation only reports that the target accepted the job. Nothing
//! about the job's completion, ordering or result flows back to the caller.

mod error;
mod http;
mod traits;

pub use error::InvokerError;
pub use http::HttpInvoker;
pub use traits::{InvocationAck, Invoker};

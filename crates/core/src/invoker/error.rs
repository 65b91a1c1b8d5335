//! Error types for the invoker module.

use thiserror::Error;

/// Errors that can occur while submitting a downstream job.
#[derive(Debug, Error)]
pub enum InvokerError {
    /// The target could not be reached.
    #[error("Failed to reach target {target}: {reason}")]
    Transport { target: String, reason: String },

    /// The target answered but refused the job.
    #[error("Target {target} rejected invocation with status {status}")]
    Rejected { target: String, status: u16 },

    /// The payload could not be encoded.
    #[error("Failed to encode payload for {target}: {reason}")]
    Encoding { target: String, reason: String },

    /// The HTTP client could not be built.
    #[error("Invoker setup failed: {0}")]
    Setup(String),
}

impl InvokerError {
    /// Target the failed invocation was addressed to, when known.
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Transport { target, .. }
            | Self::Rejected { target, .. }
            | Self::Encoding { target, .. } => Some(target),
            Self::Setup(_) => None,
        }
    }
}

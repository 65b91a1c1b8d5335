//! Asynchronous error reports.
//!
//! Both handlers report a failed invocation by submitting an `ErrorReport`
//! to the configured error target before failing. A report that cannot be
//! submitted is logged; it never replaces the error being reported.

use serde::{Deserialize, Serialize};
use std::error::Error;
use tracing::error;

use crate::invoker::Invoker;
use crate::metrics::INVOCATIONS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Function that failed.
    #[serde(rename = "lambdaName")]
    pub function_name: String,
    /// Error message followed by its source chain, one cause per line.
    pub message: String,
}

impl ErrorReport {
    pub fn from_error(function_name: &str, err: &(dyn Error + 'static)) -> Self {
        Self {
            function_name: function_name.to_string(),
            message: error_chain(err),
        }
    }
}

/// Render an error and its sources, outermost first.
pub fn error_chain(err: &(dyn Error + 'static)) -> String {
    let mut lines = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        lines.push(format!("caused by: {}", cause));
        source = cause.source();
    }
    lines.join("\n")
}

/// Submit an error report to `target`. Returns whether it was accepted.
pub async fn send_error_report(
    invoker: &dyn Invoker,
    target: &str,
    report: ErrorReport,
) -> bool {
    let payload = match serde_json::to_value(&report) {
        Ok(payload) => payload,
        Err(e) => {
            error!("Failed to encode error report for {}: {}", report.function_name, e);
            return false;
        }
    };

    match invoker.invoke_async(target, payload).await {
        Ok(_) => {
            INVOCATIONS.with_label_values(&["error_report", "accepted"]).inc();
            true
        }
        Err(e) => {
            INVOCATIONS.with_label_values(&["error_report", "failed"]).inc();
            error!(
                "Failed to submit error report for {} to {}: {}",
                report.function_name, target, e
            );
            false
        }
    }
}

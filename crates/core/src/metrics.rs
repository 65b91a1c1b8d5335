//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Dispatch engine (outcomes per trigger)
//! - Downstream invocations (by role and result)
//! - Queue reconciliation (planned actions, runs)
//! - Payment staging

use once_cell::sync::Lazy;
use prometheus::{core::Collector, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Dispatch Engine
// =============================================================================

/// Dispatch engine invocations by outcome.
pub static DISPATCH_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "payflow_dispatch_outcomes_total",
            "Dispatch engine invocations by outcome",
        ),
        &["outcome"], // "dispatched", "drained", "blocked", "no_message", ..., "failed"
    )
    .unwrap()
});

/// Compensating message deletions after a failed invocation.
pub static COMPENSATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "payflow_compensations_total",
            "Best-effort message cleanups after a failed dispatch",
        ),
        &["result"], // "deleted", "nothing_held", "failed"
    )
    .unwrap()
});

// =============================================================================
// Downstream Invocations
// =============================================================================

/// Downstream invocations by role and result.
pub static INVOCATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "payflow_invocations_total",
            "Downstream invocations submitted",
        ),
        &["role", "result"], // role: "dispatch", "create_queues", ...; result: "accepted", "failed"
    )
    .unwrap()
});

// =============================================================================
// Queue Reconciliation
// =============================================================================

/// Reconciliation runs by result.
pub static RECONCILE_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("payflow_reconcile_runs_total", "Queue reconciliation runs"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Planned reconciliation actions by kind.
pub static RECONCILE_ACTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "payflow_reconcile_actions_total",
            "Queue actions planned by reconciliation",
        ),
        &["action"], // "create", "enqueue", "delete"
    )
    .unwrap()
});

// =============================================================================
// Staging
// =============================================================================

/// Payment events appended to the staging table.
pub static PAYMENTS_STAGED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "payflow_payments_staged_total",
        "Payment events appended to the staging table",
    )
    .unwrap()
});

/// Payment events that could not be staged.
pub static PAYMENTS_STAGING_FAILED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "payflow_payments_staging_failed_total",
        "Payment events that failed to stage",
    )
    .unwrap()
});

/// Every core metric, for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn Collector>> {
    vec![
        Box::new(DISPATCH_OUTCOMES.clone()),
        Box::new(COMPENSATIONS.clone()),
        Box::new(INVOCATIONS.clone()),
        Box::new(RECONCILE_RUNS.clone()),
        Box::new(RECONCILE_ACTIONS.clone()),
        Box::new(PAYMENTS_STAGED.clone()),
        Box::new(PAYMENTS_STAGING_FAILED.clone()),
    ]
}

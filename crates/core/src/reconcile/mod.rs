//! Queue reconciliation.
//!
//! Compares the queues a deployment should have (one per configured document
//! type) with the queues it has, and hands three action lists to downstream
//! jobs: queues to create, existing queues to enqueue work into, and stale
//! queues to delete. The reconciler only lists queues itself; every mutation
//! is delegated.

mod error;
mod planner;
mod reconciler;
mod types;

pub use error::ReconcileError;
pub use planner::{canonical_queue_name, desired_configs, plan};
pub use reconciler::{QueueReconciler, ReconcileSettings};
pub use types::{
    CreateBatch, DeleteList, DocTypeConfig, EnqueueEntry, QueueCreation, ReconcilePlan,
    ReconcileReport,
};

//! Reconciliation runs.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info};

use crate::config::{Config, TargetsConfig};
use crate::error_report::{send_error_report, ErrorReport};
use crate::invoker::Invoker;
use crate::metrics::{INVOCATIONS, RECONCILE_ACTIONS, RECONCILE_RUNS};
use crate::queue::QueueService;
use crate::timestamp::now_exec_datetime;

use super::error::ReconcileError;
use super::planner::{desired_configs, plan};
use super::types::ReconcileReport;

/// Settings the reconciler needs from configuration.
#[derive(Debug, Clone)]
pub struct ReconcileSettings {
    pub country_code: String,
    pub prefix: String,
    /// Document type -> queue capacity hint.
    pub doc_types: BTreeMap<String, u32>,
    pub sql_config_file_pre: String,
    pub sql_config_file_post: String,
    pub targets: TargetsConfig,
    /// Name this handler reports itself as.
    pub function_name: String,
}

impl ReconcileSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            country_code: config.pipeline.country_code.clone(),
            prefix: config.pipeline.prefix.clone(),
            doc_types: config.doc_types.clone(),
            sql_config_file_pre: config.pipeline.sql_config_file_pre.clone(),
            sql_config_file_post: config.pipeline.sql_config_file_post.clone(),
            targets: config.targets.clone(),
            function_name: config.pipeline.init_process_function.clone(),
        }
    }

    /// Prefix shared by every queue of this deployment.
    pub fn listing_prefix(&self) -> String {
        format!("{}-{}", self.prefix, self.country_code.to_lowercase())
    }
}

/// Plans queue actions and hands them to downstream jobs.
pub struct QueueReconciler {
    settings: ReconcileSettings,
    queues: Arc<dyn QueueService>,
    invoker: Arc<dyn Invoker>,
}

impl QueueReconciler {
    pub fn new(
        settings: ReconcileSettings,
        queues: Arc<dyn QueueService>,
        invoker: Arc<dyn Invoker>,
    ) -> Self {
        Self {
            settings,
            queues,
            invoker,
        }
    }

    pub fn settings(&self) -> &ReconcileSettings {
        &self.settings
    }

    /// Run one reconciliation.
    ///
    /// The create, enqueue and delete jobs are submitted in that order, even
    /// when their lists are empty. The first failure stops the run and is
    /// reported to the error target.
    pub async fn run(&self) -> Result<ReconcileReport, ReconcileError> {
        match self.reconcile().await {
            Ok(report) => {
                RECONCILE_RUNS.with_label_values(&["success"]).inc();
                info!(
                    "Reconciled queues: {} to create, {} to enqueue, {} to delete",
                    report.created, report.enqueued, report.deleted
                );
                Ok(report)
            }
            Err(err) => {
                RECONCILE_RUNS.with_label_values(&["failed"]).inc();
                error!("Reconciliation failed: {}", err);
                send_error_report(
                    self.invoker.as_ref(),
                    &self.settings.targets.error_report,
                    ErrorReport::from_error(&self.settings.function_name, &err),
                )
                .await;
                Err(err)
            }
        }
    }

    async fn reconcile(&self) -> Result<ReconcileReport, ReconcileError> {
        let prefix = self.settings.listing_prefix();
        let actual = self.queues.list_by_prefix(&prefix).await?;
        debug!("Found {} queues under {}", actual.len(), prefix);

        let exec_date_time = now_exec_datetime();
        let desired = desired_configs(&self.settings, &exec_date_time);
        let plan = plan(desired, &actual, &self.settings.targets);
        let report = ReconcileReport::of(&plan, exec_date_time);

        RECONCILE_ACTIONS
            .with_label_values(&["create"])
            .inc_by(report.created as u64);
        RECONCILE_ACTIONS
            .with_label_values(&["enqueue"])
            .inc_by(report.enqueued as u64);
        RECONCILE_ACTIONS
            .with_label_values(&["delete"])
            .inc_by(report.deleted as u64);

        let targets = &self.settings.targets;
        self.submit("create_queues", &targets.create_queues, &plan.to_create)
            .await?;
        self.submit("enqueue", &targets.enqueue, &plan.to_enqueue)
            .await?;
        self.submit("delete_queues", &targets.delete_queues, &plan.to_delete)
            .await?;

        Ok(report)
    }

    async fn submit<T: Serialize>(
        &self,
        role: &'static str,
        target: &str,
        body: &T,
    ) -> Result<(), ReconcileError> {
        let payload = serde_json::to_value(body).map_err(|e| ReconcileError::Encoding {
            what: role,
            reason: e.to_string(),
        })?;

        match self.invoker.invoke_async(target, payload).await {
            Ok(ack) => {
                INVOCATIONS.with_label_values(&[role, "accepted"]).inc();
                debug!("Submitted {} to {} (request {})", role, target, ack.request_id);
                Ok(())
            }
            Err(e) => {
                INVOCATIONS.with_label_values(&[role, "failed"]).inc();
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::QueueError;
    use crate::testing::{fixtures, MockInvoker, MockQueueService, QueueCall};
    use serde_json::json;

    fn reconciler() -> (QueueReconciler, Arc<MockQueueService>, Arc<MockInvoker>) {
        let queues = Arc::new(MockQueueService::new());
        let invoker = Arc::new(MockInvoker::new());
        let reconciler = QueueReconciler::new(
            fixtures::reconcile_settings(),
            queues.clone(),
            invoker.clone(),
        );
        (reconciler, queues, invoker)
    }

    #[tokio::test]
    async fn test_run_submits_three_jobs_in_order() {
        let (reconciler, queues, invoker) = reconciler();
        queues.add_queue("pfx-ar-invoice.fifo").await;
        queues.add_queue("pfx-ar-legacy.fifo").await;
        queues.add_queue("pfx-cl-invoice.fifo").await;

        let report = reconciler.run().await.unwrap();

        assert_eq!((report.created, report.enqueued, report.deleted), (1, 1, 1));
        assert_eq!(
            queues.calls().await,
            vec![QueueCall::List {
                prefix: "pfx-ar".to_string()
            }]
        );

        let targets: Vec<String> = invoker
            .recorded_invocations()
            .await
            .into_iter()
            .map(|i| i.target)
            .collect();
        assert_eq!(targets, vec!["create-queues", "enqueue", "delete-queues"]);

        let create = &invoker.invocations_for("create-queues").await[0];
        assert_eq!(create["queues"][0]["queueName"], "pfx-ar-receipt");
        assert_eq!(create["queues"][0]["suffix"], ".fifo");

        let enqueue = &invoker.invocations_for("enqueue").await[0];
        assert_eq!(
            enqueue[0]["queueUrl"],
            MockQueueService::url_for("pfx-ar-invoice.fifo")
        );

        let delete = &invoker.invocations_for("delete-queues").await[0];
        assert_eq!(
            delete,
            &json!({"queueUrls": [MockQueueService::url_for("pfx-ar-legacy.fifo")]})
        );
    }

    #[tokio::test]
    async fn test_empty_lists_are_still_submitted() {
        let (reconciler, queues, invoker) = reconciler();
        queues.add_queue("pfx-ar-invoice.fifo").await;
        queues.add_queue("pfx-ar-receipt.fifo").await;

        let report = reconciler.run().await.unwrap();

        assert_eq!((report.created, report.deleted), (0, 0));
        assert_eq!(invoker.invocation_count().await, 3);
        assert_eq!(
            invoker.invocations_for("create-queues").await[0]["queues"],
            json!([])
        );
    }

    #[tokio::test]
    async fn test_failed_submission_stops_run_and_reports() {
        let (reconciler, _queues, invoker) = reconciler();
        invoker.fail_target("enqueue").await;

        let err = reconciler.run().await.unwrap_err();

        assert!(matches!(err, ReconcileError::Invoker(_)));
        assert!(invoker.invocations_for("delete-queues").await.is_empty());
        let reports = invoker.invocations_for("get-errors").await;
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0]["lambdaName"], "init-process");
    }

    #[tokio::test]
    async fn test_listing_failure_is_reported() {
        let (reconciler, queues, invoker) = reconciler();
        queues
            .set_next_error(QueueError::Backend("throttled".to_string()))
            .await;

        let err = reconciler.run().await.unwrap_err();

        assert!(matches!(err, ReconcileError::Queue(_)));
        assert!(invoker.invocations_for("create-queues").await.is_empty());
        assert_eq!(invoker.invocations_for("get-errors").await.len(), 1);
    }
}

use serde::{Deserialize, Serialize};

/// Per-run configuration of one document-type stream, as handed to the
/// downstream queue jobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocTypeConfig {
    pub country_code: String,
    /// Snapshot time of the reconciliation run.
    pub exec_date_time: String,
    pub prefix: String,
    pub lambda_to_call_on_error: String,
    #[serde(rename = "doctype")]
    pub doc_type: String,
    /// Capacity hint, carried as text.
    pub sqs_max_queues: String,
    #[serde(rename = "sqlConfigFile1")]
    pub sql_config_file_pre: String,
    #[serde(rename = "sqlConfigFile2")]
    pub sql_config_file_post: String,
    /// Set only on configs whose queue is being created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lambda_to_call: Option<String>,
}

/// One queue to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueCreation {
    pub data: Vec<DocTypeConfig>,
    pub queue_name: String,
    /// Queue type marker appended to the name by the creator.
    pub suffix: String,
}

/// Payload of the create-queues job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBatch {
    /// Follow-up job once the queues exist.
    pub lambda_to_call: String,
    pub lambda_to_call_on_error: String,
    pub queues: Vec<QueueCreation>,
}

/// Work for one existing queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueEntry {
    pub data: Vec<DocTypeConfig>,
    pub queue_url: String,
    pub lambda_to_call: String,
    pub lambda_to_call_on_error: String,
}

/// Payload of the delete-queues job.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteList {
    pub queue_urls: Vec<String>,
}

/// The three action lists of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcilePlan {
    pub to_create: CreateBatch,
    pub to_enqueue: Vec<EnqueueEntry>,
    pub to_delete: DeleteList,
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub exec_date_time: String,
    pub created: usize,
    pub enqueued: usize,
    pub deleted: usize,
}

impl ReconcileReport {
    pub fn of(plan: &ReconcilePlan, exec_date_time: impl Into<String>) -> Self {
        Self {
            exec_date_time: exec_date_time.into(),
            created: plan.to_create.queues.len(),
            enqueued: plan.to_enqueue.len(),
            deleted: plan.to_delete.queue_urls.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_doc_type_config_wire_names() {
        let config = DocTypeConfig {
            country_code: "AR".to_string(),
            exec_date_time: "2024-01-02 03:04:05.006".to_string(),
            prefix: "pfx".to_string(),
            lambda_to_call_on_error: "to-error".to_string(),
            doc_type: "invoice".to_string(),
            sqs_max_queues: "3".to_string(),
            sql_config_file_pre: "pre.sql".to_string(),
            sql_config_file_post: "post.sql".to_string(),
            lambda_to_call: None,
        };

        assert_eq!(
            serde_json::to_value(&config).unwrap(),
            json!({
                "countryCode": "AR",
                "execDateTime": "2024-01-02 03:04:05.006",
                "prefix": "pfx",
                "lambdaToCallOnError": "to-error",
                "doctype": "invoice",
                "sqsMaxQueues": "3",
                "sqlConfigFile1": "pre.sql",
                "sqlConfigFile2": "post.sql"
            })
        );
    }

    #[test]
    fn test_delete_list_wire_name() {
        let list = DeleteList {
            queue_urls: vec!["local://queues/pfx-ar-old.fifo".to_string()],
        };
        assert_eq!(
            serde_json::to_value(&list).unwrap(),
            json!({"queueUrls": ["local://queues/pfx-ar-old.fifo"]})
        );
    }
}

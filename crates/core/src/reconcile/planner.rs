//! Pure planning: desired configs, queue names and the reconcile plan.

use std::collections::BTreeSet;

use crate::config::TargetsConfig;
use crate::queue::{doc_type_token, queue_matches_name, FIFO_SUFFIX};
use crate::record::HashId;

use super::reconciler::ReconcileSettings;
use super::types::{
    CreateBatch, DeleteList, DocTypeConfig, EnqueueEntry, QueueCreation, ReconcilePlan,
};

/// Queue name of a document-type stream: `{prefix}-{country}-{docType}`,
/// without the queue type suffix.
pub fn canonical_queue_name(prefix: &str, country_code: &str, doc_type: &str) -> String {
    HashId::new(prefix, country_code, doc_type).as_str().to_string()
}

/// One config per configured document type, in doc-type order.
pub fn desired_configs(settings: &ReconcileSettings, exec_date_time: &str) -> Vec<DocTypeConfig> {
    settings
        .doc_types
        .iter()
        .map(|(doc_type, max_queues)| DocTypeConfig {
            country_code: settings.country_code.clone(),
            exec_date_time: exec_date_time.to_string(),
            prefix: settings.prefix.clone(),
            lambda_to_call_on_error: settings.targets.on_error.clone(),
            doc_type: doc_type.clone(),
            sqs_max_queues: max_queues.to_string(),
            sql_config_file_pre: settings.sql_config_file_pre.clone(),
            sql_config_file_post: settings.sql_config_file_post.clone(),
            lambda_to_call: None,
        })
        .collect()
}

/// Compute the create, enqueue and delete lists.
///
/// An actual queue matches a desired config when its name, without the queue
/// type suffix, equals the config's canonical name. An actual queue is stale
/// when its doc-type token names no desired doc type.
pub fn plan(
    desired: Vec<DocTypeConfig>,
    actual_urls: &[String],
    targets: &TargetsConfig,
) -> ReconcilePlan {
    let desired_doc_types: BTreeSet<&str> = desired.iter().map(|c| c.doc_type.as_str()).collect();

    let queue_urls = actual_urls
        .iter()
        .filter(|url| !desired_doc_types.contains(doc_type_token(url)))
        .cloned()
        .collect();
    let to_delete = DeleteList { queue_urls };

    let mut to_create = CreateBatch {
        lambda_to_call: targets.enqueue.clone(),
        lambda_to_call_on_error: targets.on_error.clone(),
        queues: Vec::new(),
    };
    let mut to_enqueue = Vec::new();

    for mut config in desired {
        let queue_name = canonical_queue_name(&config.prefix, &config.country_code, &config.doc_type);
        match actual_urls.iter().find(|url| queue_matches_name(url, &queue_name)) {
            Some(queue_url) => to_enqueue.push(EnqueueEntry {
                data: vec![config],
                queue_url: queue_url.clone(),
                lambda_to_call: targets.to_provisional.clone(),
                lambda_to_call_on_error: targets.on_error.clone(),
            }),
            None => {
                config.lambda_to_call = Some(targets.create_provisional.clone());
                to_create.queues.push(QueueCreation {
                    data: vec![config],
                    queue_name,
                    suffix: FIFO_SUFFIX.to_string(),
                });
            }
        }
    }

    ReconcilePlan {
        to_create,
        to_enqueue,
        to_delete,
    }
}

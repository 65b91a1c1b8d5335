//! Dispatch engine implementation.
//!
//! One call to [`DispatchEngine::handle`] serves exactly one trigger. All
//! collaborator calls are awaited in sequence; there is no fan-out and no
//! internal retry.
//!
//! Ordering guarantees:
//! - The pending message is deleted before the downstream job is submitted.
//!   A failure between the two loses the message; it is never dispatched
//!   twice from the same receive.
//! - The not-accepted status scan is an advisory gate. Two invocations for
//!   the same hashId can both pass it; serialising events per key is the
//!   change feed's job.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error_report::{send_error_report, ErrorReport};
use crate::invoker::Invoker;
use crate::metrics::{COMPENSATIONS, DISPATCH_OUTCOMES, INVOCATIONS};
use crate::queue::{queue_matches_name, QueueMessageBody, QueueService, ReceivedMessage};
use crate::record::{HashId, OperationalRecord, RecordStore};
use crate::timestamp::now_exec_datetime;

use super::error::DispatchError;
use super::types::{
    ChangeEvent, ChangeOperation, DispatchOutcome, DispatchPayload, DrainSignal, PresetWindow,
    TriggerEvent,
};

/// Settings the engine needs from configuration.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub country_code: String,
    pub not_accepted_statuses: Vec<String>,
    pub status_ok: String,
    pub status_error: String,
    /// Target receiving enriched payloads.
    pub dispatch_target: String,
    /// Target receiving error reports.
    pub error_target: String,
    /// Name this handler reports itself as.
    pub function_name: String,
}

impl DispatchSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            country_code: config.pipeline.country_code.clone(),
            not_accepted_statuses: config.pipeline.not_accepted_statuses.clone(),
            status_ok: config.pipeline.status_ok.clone(),
            status_error: config.pipeline.status_error.clone(),
            dispatch_target: config.targets.dispatch.clone(),
            error_target: config.targets.error_report.clone(),
            function_name: config.pipeline.get_payments_function.clone(),
        }
    }
}

/// A message received during the current invocation.
#[derive(Debug)]
struct HeldMessage {
    queue_url: String,
    receipt_handle: String,
    deleted: bool,
}

/// Reacts to change notifications and drain signals.
pub struct DispatchEngine {
    settings: DispatchSettings,
    records: Arc<dyn RecordStore>,
    queues: Arc<dyn QueueService>,
    invoker: Arc<dyn Invoker>,
}

impl DispatchEngine {
    /// Create a new engine.
    pub fn new(
        settings: DispatchSettings,
        records: Arc<dyn RecordStore>,
        queues: Arc<dyn QueueService>,
        invoker: Arc<dyn Invoker>,
    ) -> Self {
        Self {
            settings,
            records,
            queues,
            invoker,
        }
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    /// Serve one trigger.
    ///
    /// Eligibility aborts are successful outcomes. On error the engine
    /// deletes any message it still holds (or, for a drain signal that failed
    /// before receiving, drains one message), submits an error report, and
    /// returns the error.
    pub async fn handle(&self, event: TriggerEvent) -> Result<DispatchOutcome, DispatchError> {
        let mut held = None;
        let result = match &event {
            TriggerEvent::Drain(signal) => self.drain(signal, &mut held).await,
            TriggerEvent::Change(change) => self.handle_change(change, &mut held).await,
        };

        match result {
            Ok(outcome) => {
                DISPATCH_OUTCOMES.with_label_values(&[outcome.label()]).inc();
                Ok(outcome)
            }
            Err(err) => {
                DISPATCH_OUTCOMES.with_label_values(&["failed"]).inc();
                error!("Dispatch failed: {}", err);
                self.compensate(&event, held).await;
                send_error_report(
                    self.invoker.as_ref(),
                    &self.settings.error_target,
                    ErrorReport::from_error(&self.settings.function_name, &err),
                )
                .await;
                Err(err)
            }
        }
    }

    async fn drain(
        &self,
        signal: &DrainSignal,
        held: &mut Option<HeldMessage>,
    ) -> Result<DispatchOutcome, DispatchError> {
        debug!(
            "Draining one message from {} (signal handle {})",
            signal.queue_url, signal.receipt_handle
        );

        let Some(message) = self.queues.receive_one(&signal.queue_url).await? else {
            debug!("Nothing to drain in {}", signal.queue_url);
            return Ok(DispatchOutcome::Drained {
                queue_url: signal.queue_url.clone(),
                deleted: false,
            });
        };

        self.delete_held(hold(held, &signal.queue_url, &message)).await?;
        info!("Drained one message from {}", signal.queue_url);

        Ok(DispatchOutcome::Drained {
            queue_url: signal.queue_url.clone(),
            deleted: true,
        })
    }

    async fn handle_change(
        &self,
        change: &ChangeEvent,
        held: &mut Option<HeldMessage>,
    ) -> Result<DispatchOutcome, DispatchError> {
        let hash_id = &change.key.hash_id;

        if !hash_id.belongs_to_country(&self.settings.country_code) {
            debug!(
                "Ignoring {} for {}: not country {}",
                change.operation, hash_id, self.settings.country_code
            );
            return Ok(DispatchOutcome::ForeignCountry {
                hash_id: hash_id.clone(),
            });
        }

        match &change.operation {
            ChangeOperation::Remove => Ok(DispatchOutcome::Removed),
            ChangeOperation::Modify => Ok(DispatchOutcome::Modified),
            ChangeOperation::Insert => self.on_insert(change, held).await,
            ChangeOperation::Other(tag) => {
                debug!("Status transition ({}) for {}", tag, hash_id);
                self.on_status_transition(change, held).await
            }
        }
    }

    async fn on_insert(
        &self,
        change: &ChangeEvent,
        held: &mut Option<HeldMessage>,
    ) -> Result<DispatchOutcome, DispatchError> {
        let hash_id = &change.key.hash_id;

        for status in &self.settings.not_accepted_statuses {
            if self.records.exists_by_key_and_status(hash_id, status).await? {
                debug!("{} has a record in status {}, not dispatching", hash_id, status);
                return Ok(DispatchOutcome::Blocked {
                    status: status.clone(),
                });
            }
        }

        let last_record = self.records.latest_by_key(hash_id).await?;

        let (queue_url, message) = match self.receive_pending(hash_id).await? {
            Ok(received) => received,
            Err(abort) => return Ok(abort),
        };
        let held_message = hold(held, &queue_url, &message);
        let body = message.parse_body()?;

        self.dispatch(
            held_message,
            body,
            last_record,
            PresetWindow::of(change.new_image.as_ref()),
        )
        .await
    }

    async fn on_status_transition(
        &self,
        change: &ChangeEvent,
        held: &mut Option<HeldMessage>,
    ) -> Result<DispatchOutcome, DispatchError> {
        let hash_id = &change.key.hash_id;
        let new_image = change.new_image.as_ref();
        let status = new_image.and_then(|r| r.is_status.clone());

        let is_ok = status.as_deref() == Some(self.settings.status_ok.as_str());
        let is_error = status.as_deref() == Some(self.settings.status_error.as_str());
        let Some(new_image) = new_image.filter(|_| is_ok || is_error) else {
            debug!("{} moved to {:?}, nothing to dispatch", hash_id, status);
            return Ok(DispatchOutcome::NotTerminalStatus { status });
        };

        let (queue_url, message) = match self.receive_pending(hash_id).await? {
            Ok(received) => received,
            Err(abort) => return Ok(abort),
        };
        let held_message = hold(held, &queue_url, &message);
        let body = message.parse_body()?;

        let resolved = if is_ok {
            self.close_window(&body, new_image).await?
        } else {
            Some(new_image.clone())
        };

        let Some(resolved) = resolved else {
            warn!(
                "No operational record {} at {} for pending message",
                body.hash_id(),
                body.exec_date_time
            );
            return Ok(DispatchOutcome::RecordNotFound {
                exec_date_time: body.exec_date_time,
            });
        };

        if resolved.exec_date_time != body.exec_date_time {
            warn!(
                "Pending message for {} is at {} but record is at {}, not dispatching",
                hash_id, body.exec_date_time, resolved.exec_date_time
            );
            return Ok(DispatchOutcome::CorrelationMismatch {
                record_exec_date_time: resolved.exec_date_time,
                message_exec_date_time: body.exec_date_time,
            });
        }

        self.dispatch(
            held_message,
            body,
            Some(resolved),
            PresetWindow::of(Some(new_image)),
        )
        .await
    }

    /// Look up the record a message points at and, when the change carries a
    /// `toDateTime`, start its window there and end it now.
    async fn close_window(
        &self,
        body: &QueueMessageBody,
        change: &OperationalRecord,
    ) -> Result<Option<OperationalRecord>, DispatchError> {
        let found = self
            .records
            .by_key_and_exec_date_time(&body.hash_id(), &body.exec_date_time)
            .await?;

        Ok(found.map(|mut record| {
            if let Some(to) = &change.to_date_time {
                record.from_date_time = Some(to.clone());
                record.to_date_time = Some(now_exec_datetime());
            }
            record
        }))
    }

    /// Receive the next pending message of a hashId's queue, or the abort
    /// outcome when there is none.
    async fn receive_pending(
        &self,
        hash_id: &HashId,
    ) -> Result<Result<(String, ReceivedMessage), DispatchOutcome>, DispatchError> {
        let resolved = self.queues.resolve_url_by_prefix(hash_id.as_str()).await?;
        let Some(queue_url) = resolved.filter(|url| queue_matches_name(url, hash_id.as_str()))
        else {
            warn!("No queue provisioned for {}", hash_id);
            return Ok(Err(DispatchOutcome::QueueNotFound {
                hash_id: hash_id.clone(),
            }));
        };

        match self.queues.receive_one(&queue_url).await? {
            Some(message) => Ok(Ok((queue_url, message))),
            None => {
                debug!("No pending message in {}", queue_url);
                Ok(Err(DispatchOutcome::NoPendingMessage { queue_url }))
            }
        }
    }

    /// Delete the held message, then submit the payload.
    async fn dispatch(
        &self,
        held: &mut HeldMessage,
        body: QueueMessageBody,
        operational: Option<OperationalRecord>,
        window: PresetWindow,
    ) -> Result<DispatchOutcome, DispatchError> {
        let hash_id = body.hash_id();
        let exec_date_time = body.exec_date_time.clone();
        let payload = DispatchPayload {
            operational,
            sql_config_file: body.sql_config_file_pre.clone(),
            message: body.with_receipt_handle(held.receipt_handle.clone()),
            preset_data: vec![window],
        };
        let payload =
            serde_json::to_value(&payload).map_err(|e| DispatchError::Payload(e.to_string()))?;

        self.delete_held(held).await?;

        let ack = match self
            .invoker
            .invoke_async(&self.settings.dispatch_target, payload)
            .await
        {
            Ok(ack) => {
                INVOCATIONS.with_label_values(&["dispatch", "accepted"]).inc();
                ack
            }
            Err(e) => {
                INVOCATIONS.with_label_values(&["dispatch", "failed"]).inc();
                return Err(e.into());
            }
        };

        info!(
            "Dispatched {} at {} to {} (request {})",
            hash_id, exec_date_time, self.settings.dispatch_target, ack.request_id
        );

        Ok(DispatchOutcome::Dispatched {
            hash_id,
            exec_date_time,
            request_id: ack.request_id,
        })
    }

    async fn delete_held(&self, held: &mut HeldMessage) -> Result<(), DispatchError> {
        self.queues
            .delete_message(&held.queue_url, &held.receipt_handle)
            .await?;
        held.deleted = true;
        Ok(())
    }

    /// Best-effort cleanup after a failure. Errors are logged, not returned.
    async fn compensate(&self, event: &TriggerEvent, held: Option<HeldMessage>) {
        let (queue_url, receipt_handle) = match (held, event) {
            (Some(held), _) if held.deleted => {
                COMPENSATIONS.with_label_values(&["nothing_held"]).inc();
                return;
            }
            (Some(held), _) => (held.queue_url, held.receipt_handle),
            (None, TriggerEvent::Drain(signal)) => {
                match self.queues.receive_one(&signal.queue_url).await {
                    Ok(Some(message)) => (signal.queue_url.clone(), message.receipt_handle),
                    Ok(None) => {
                        COMPENSATIONS.with_label_values(&["nothing_held"]).inc();
                        return;
                    }
                    Err(e) => {
                        COMPENSATIONS.with_label_values(&["failed"]).inc();
                        warn!("Cleanup receive from {} failed: {}", signal.queue_url, e);
                        return;
                    }
                }
            }
            (None, TriggerEvent::Change(_)) => {
                COMPENSATIONS.with_label_values(&["nothing_held"]).inc();
                return;
            }
        };

        match self.queues.delete_message(&queue_url, &receipt_handle).await {
            Ok(()) => {
                COMPENSATIONS.with_label_values(&["deleted"]).inc();
                info!("Deleted in-flight message from {} after failure", queue_url);
            }
            Err(e) => {
                COMPENSATIONS.with_label_values(&["failed"]).inc();
                warn!("Cleanup delete in {} failed: {}", queue_url, e);
            }
        }
    }
}

/// Record a received message as held by this invocation.
fn hold<'a>(
    held: &'a mut Option<HeldMessage>,
    queue_url: &str,
    message: &ReceivedMessage,
) -> &'a mut HeldMessage {
    held.insert(HeldMessage {
        queue_url: queue_url.to_string(),
        receipt_handle: message.receipt_handle.clone(),
        deleted: false,
    })
}

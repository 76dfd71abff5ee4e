//! Message lifecycle orchestration.
//!
//! [`QueueOrchestrator`] drives the receive, process and acknowledge protocol
//! on top of a [`QueueTransport`]:
//!
//! ```text
//! Sent -> Visible -> InFlight(deadline) -> Deleted
//!                                       -> Visible       (deadline passed, receive count + 1)
//!                                       -> DeadLettered  (receive count reached the redrive threshold)
//! ```
//!
//! A message is deleted only after its handler succeeds. When the handler
//! fails the message stays in flight until its visibility deadline passes and
//! the backend redelivers it, or, under [`FailurePolicy::ReleaseImmediately`],
//! is made visible again at once. Dead-lettering is enforced by the backend;
//! the orchestrator only observes it through receive counts.
//!
//! Delivery is at-least-once. A handler that outlives the visibility deadline
//! may see its message processed again by another consumer, so handlers must
//! be idempotent or deduplicate on the message ID.
//!
//! Nothing here retries. Every backend failure is returned to the caller
//! unchanged, and a failed call leaves the registry as it was.

use crate::attributes::{
    QueueAttributes, RedrivePolicy, ATTR_REDRIVE_POLICY, MAX_VISIBILITY_TIMEOUT_SECONDS,
};
use crate::clock::Clock;
use crate::error::{QueueError, ValidationError};
use crate::message::{
    BatchEntry, BatchFailure, BatchSendOutcome, Message, MessageId, QueueHandle, QueueName,
    ReceiptHandle, ReceiveRequest, ReceivedMessage, MAX_BATCH_ENTRIES, MAX_BATCH_PAYLOAD_BYTES,
};
use crate::registry::{QueueRecord, QueueRegistry};
use crate::transport::QueueTransport;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;

// ============================================================================
// Configuration
// ============================================================================

/// What happens to a message whose handler failed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Leave the message in flight; it is redelivered once its deadline passes
    #[default]
    LeaveInFlight,
    /// Reset the visibility timeout to zero so the message is redelivered at once
    ReleaseImmediately,
}

/// Orchestrator settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Long-poll wait for receives
    pub receive_wait_seconds: u32,
    pub failure_policy: FailurePolicy,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            receive_wait_seconds: 0,
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl LifecycleConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.receive_wait_seconds > 20 {
            return Err(ValidationError::OutOfRange {
                field: "receive_wait_seconds".to_string(),
                message: "must be at most 20".to_string(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Failure reported by a message handler
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Processes one received message
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: &ReceivedMessage) -> Result<(), HandlerError>;
}

/// Handler backed by an async closure, see [`handler_fn`]
pub struct FnHandler<F> {
    f: F,
}

/// Wrap an async closure as a [`MessageHandler`]
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(ReceivedMessage) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send,
{
    FnHandler { f }
}

#[async_trait]
impl<F, Fut> MessageHandler for FnHandler<F>
where
    F: Fn(ReceivedMessage) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send,
{
    async fn handle(&self, message: &ReceivedMessage) -> Result<(), HandlerError> {
        (self.f)(message.clone()).await
    }
}

// ============================================================================
// Drain Reports
// ============================================================================

/// What became of one received message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MessageOutcome {
    /// Handler succeeded and the message was deleted
    Deleted,
    /// Handler failed; the message was left in flight
    Retained { reason: String },
    /// Handler failed; the message was made visible again
    Released { reason: String },
    /// Handler succeeded but the delete was rejected, so the message will be redelivered
    AckFailed { error: String },
}

impl MessageOutcome {
    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted)
    }

    /// Whether the handler failed
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Retained { .. } | Self::Released { .. })
    }
}

/// Outcome for one message of a drain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageReport {
    pub message_id: MessageId,
    pub receive_count: u32,
    #[serde(flatten)]
    pub outcome: MessageOutcome,
}

/// Result of one [`QueueOrchestrator::drain_once`] pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    pub queue: QueueName,
    pub received: usize,
    pub messages: Vec<MessageReport>,
}

impl DrainReport {
    /// Number of messages deleted
    pub fn deleted(&self) -> usize {
        self.messages.iter().filter(|m| m.outcome.is_deleted()).count()
    }

    /// Number of messages whose handler failed
    pub fn failed(&self) -> usize {
        self.messages.iter().filter(|m| m.outcome.is_failure()).count()
    }

    /// Number of messages processed but not acknowledged
    pub fn ack_failed(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| matches!(m.outcome, MessageOutcome::AckFailed { .. }))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.received == 0
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Queue lifecycle and message processing on top of a transport
///
/// All methods take `&self`; share one orchestrator behind an `Arc` to drain
/// a queue from several tasks. The registry lock is never held across a
/// transport call.
///
/// # Examples
///
/// ```rust
/// use redrive_runtime::{
///     handler_fn, HandlerError, LifecycleConfig, Message, QueueAttributes, QueueName,
///     QueueOrchestrator, SystemClock, TransportFactory,
/// };
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let orchestrator = QueueOrchestrator::new(
///     TransportFactory::create_test_transport(),
///     LifecycleConfig::default(),
///     Arc::new(SystemClock),
/// );
/// let queue: QueueName = "orders".parse().unwrap();
/// orchestrator
///     .create_queue(queue.clone(), QueueAttributes::default())
///     .await
///     .unwrap();
/// orchestrator
///     .send_single(&queue, &Message::new("hello"))
///     .await
///     .unwrap();
///
/// let handler = handler_fn(|_message| async { Ok::<(), HandlerError>(()) });
/// let report = orchestrator.drain_once(&queue, 10, &handler).await.unwrap();
/// assert_eq!(report.deleted(), 1);
/// # });
/// ```
pub struct QueueOrchestrator {
    transport: Arc<dyn QueueTransport>,
    registry: RwLock<QueueRegistry>,
    config: LifecycleConfig,
    clock: Arc<dyn Clock>,
}

impl QueueOrchestrator {
    pub fn new(
        transport: Arc<dyn QueueTransport>,
        config: LifecycleConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            transport,
            registry: RwLock::new(QueueRegistry::new()),
            config,
            clock,
        }
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Snapshot of every registered queue
    pub async fn registry(&self) -> Vec<QueueRecord> {
        self.registry.read().await.records().cloned().collect()
    }

    /// Snapshot of one registered queue
    pub async fn record(&self, name: &QueueName) -> Result<QueueRecord, QueueError> {
        self.registry.read().await.get(name).cloned()
    }

    async fn handle_of(&self, name: &QueueName) -> Result<QueueHandle, QueueError> {
        self.registry.read().await.handle(name).cloned()
    }

    // ------------------------------------------------------------------------
    // Queue management
    // ------------------------------------------------------------------------

    /// Create a queue and register it
    pub async fn create_queue(
        &self,
        name: QueueName,
        attributes: QueueAttributes,
    ) -> Result<QueueRecord, QueueError> {
        attributes.validate()?;
        if attributes.fifo != name.is_fifo() {
            return Err(ValidationError::InvalidFormat {
                field: "queue_name".to_string(),
                message: format!(
                    "'{}': FIFO queues need the .fifo suffix and only FIFO queues may use it",
                    name
                ),
            }
            .into());
        }

        let location = self.transport.create_queue(&name, &attributes).await?;

        let mut registry = self.registry.write().await;
        let record = registry
            .register_with_attributes(name, location.handle, location.arn, Some(attributes))?
            .clone();

        tracing::info!(
            queue = %record.name,
            handle = %record.handle,
            fifo = record.name.is_fifo(),
            redrive = record.redrive_policy.is_some(),
            "Created queue"
        );
        Ok(record)
    }

    /// Create a queue whose failed messages are redriven to `dead_letter`
    ///
    /// The dead-letter queue must already be registered; its ARN is resolved
    /// before anything is sent to the backend.
    pub async fn create_queue_with_dead_letter(
        &self,
        name: QueueName,
        attributes: QueueAttributes,
        dead_letter: &QueueName,
        max_receive_count: u32,
    ) -> Result<QueueRecord, QueueError> {
        let policy = self
            .registry
            .read()
            .await
            .redrive_policy_for(dead_letter, max_receive_count)?;

        self.create_queue(name, attributes.with_redrive_policy(policy))
            .await
    }

    /// Register a queue that already exists on the backend
    ///
    /// The queue's attributes are read back so that size limits, the
    /// visibility timeout and any redrive policy are known locally.
    pub async fn adopt_queue(&self, name: &QueueName) -> Result<QueueRecord, QueueError> {
        if let Ok(record) = self.record(name).await {
            return Ok(record);
        }

        let location = self.transport.lookup_queue(name).await?;
        let raw = self.transport.get_queue_attributes(&location.handle).await?;
        let attributes = QueueAttributes::from_attribute_map(&raw)?;

        let mut registry = self.registry.write().await;
        let record = registry
            .register_with_attributes(name.clone(), location.handle, location.arn, Some(attributes))?
            .clone();

        tracing::debug!(
            queue = %name,
            handle = %record.handle,
            redrive = record.redrive_policy.is_some(),
            "Adopted existing queue"
        );
        Ok(record)
    }

    /// Route `name`'s failed messages to `target` after `max_receive_count` receives
    pub async fn attach_redrive_policy(
        &self,
        name: &QueueName,
        target: &QueueName,
        max_receive_count: u32,
    ) -> Result<RedrivePolicy, QueueError> {
        let (handle, policy) = {
            let registry = self.registry.read().await;
            let policy = registry.redrive_policy_for(target, max_receive_count)?;
            (registry.handle(name)?.clone(), policy)
        };

        let mut update = HashMap::new();
        update.insert(ATTR_REDRIVE_POLICY.to_string(), policy.to_json()?);
        self.transport.set_queue_attributes(&handle, &update).await?;

        let attached = self
            .registry
            .write()
            .await
            .attach_redrive_policy(name, target, max_receive_count)?
            .clone();

        tracing::info!(
            queue = %name,
            dead_letter_queue = %target,
            max_receive_count,
            "Attached redrive policy"
        );
        Ok(attached)
    }

    /// Delete a queue and forget it
    ///
    /// The backend may refuse to recreate the name for a while afterwards.
    pub async fn delete_queue(&self, name: &QueueName) -> Result<(), QueueError> {
        let (handle, sources) = {
            let registry = self.registry.read().await;
            let sources: Vec<String> = registry
                .dead_letter_sources(name)
                .into_iter()
                .map(ToString::to_string)
                .collect();
            (registry.handle(name)?.clone(), sources)
        };
        if !sources.is_empty() {
            tracing::warn!(
                queue = %name,
                sources = ?sources,
                "Deleting a dead-letter queue that other queues still redrive to"
            );
        }

        self.transport.delete_queue(&handle).await?;
        self.registry.write().await.unregister(name);

        tracing::info!(queue = %name, "Deleted queue");
        Ok(())
    }

    /// Delete several queues, reporting each result
    pub async fn delete_queues(
        &self,
        names: &[QueueName],
    ) -> BTreeMap<QueueName, Result<(), QueueError>> {
        let mut results = BTreeMap::new();
        for name in names {
            let result = self.delete_queue(name).await;
            if let Err(e) = &result {
                tracing::warn!(queue = %name, error = %e, "Failed to delete queue");
            }
            results.insert(name.clone(), result);
        }
        results
    }

    // ------------------------------------------------------------------------
    // Sending
    // ------------------------------------------------------------------------

    /// Send one message
    pub async fn send_single(
        &self,
        name: &QueueName,
        message: &Message,
    ) -> Result<MessageId, QueueError> {
        let record = self.record(name).await?;

        if let Some(max_size) = record.max_message_size() {
            let size = message.payload_size();
            if size > max_size {
                return Err(QueueError::MessageTooLarge { size, max_size });
            }
        }

        let message_id = self.transport.send_message(&record.handle, message).await?;
        tracing::debug!(queue = %name, message_id = %message_id, "Sent message");
        Ok(message_id)
    }

    /// Send up to ten entries; each entry succeeds or fails on its own
    ///
    /// Entries over the queue's size limit, or over the batch payload limit
    /// when the queue's own limit is unknown, are reported as failed without
    /// being sent. An empty batch, one over the entry limit, or one with
    /// repeated entry IDs is rejected before any network call.
    ///
    /// Entries whose combined payload exceeds the batch payload limit are sent
    /// as several backend calls. A call that fails outright then marks only its
    /// own entries as failed.
    pub async fn send_batch(
        &self,
        name: &QueueName,
        entries: &[BatchEntry],
    ) -> Result<BatchSendOutcome, QueueError> {
        let record = self.record(name).await?;
        let max_entries = (self.transport.provider_type().max_batch_size() as usize)
            .min(MAX_BATCH_ENTRIES);

        if entries.is_empty() || entries.len() > max_entries {
            return Err(ValidationError::OutOfRange {
                field: "entries".to_string(),
                message: format!("batch must hold 1-{} entries, got {}", max_entries, entries.len()),
            }
            .into());
        }

        let mut seen = HashSet::new();
        if let Some(duplicate) = entries.iter().find(|e| !seen.insert(&e.id)) {
            return Err(ValidationError::Duplicate {
                field: "batch_entry_id".to_string(),
                value: duplicate.id.to_string(),
            }
            .into());
        }

        let mut outcome = BatchSendOutcome::default();
        let mut forwarded = Vec::with_capacity(entries.len());
        let max_size = record.max_message_size().unwrap_or(MAX_BATCH_PAYLOAD_BYTES);
        for entry in entries {
            let size = entry.message.payload_size();
            if size > max_size {
                let error = QueueError::MessageTooLarge { size, max_size };
                outcome.failed.push(BatchFailure {
                    id: entry.id.clone(),
                    code: "MessageTooLong".to_string(),
                    message: error.to_string(),
                    sender_fault: true,
                });
            } else {
                forwarded.push(entry.clone());
            }
        }

        let chunks = payload_chunks(&forwarded);
        let split = chunks.len() > 1;
        for chunk in chunks {
            match self.transport.send_message_batch(&record.handle, chunk).await {
                Ok(sent) => outcome.merge(sent),
                Err(e) if split => {
                    let code = match &e {
                        QueueError::TransportError { code, .. } => code.clone(),
                        _ => "InternalError".to_string(),
                    };
                    outcome.failed.extend(chunk.iter().map(|entry| BatchFailure {
                        id: entry.id.clone(),
                        code: code.clone(),
                        message: e.to_string(),
                        sender_fault: false,
                    }));
                }
                Err(e) => return Err(e),
            }
        }

        for failure in &outcome.failed {
            tracing::warn!(
                queue = %name,
                entry_id = %failure.id,
                code = %failure.code,
                "Batch entry rejected: {}",
                failure.message
            );
        }
        tracing::debug!(
            queue = %name,
            sent = outcome.successful.len(),
            failed = outcome.failed.len(),
            "Sent message batch"
        );
        Ok(outcome)
    }

    // ------------------------------------------------------------------------
    // Receiving and acknowledging
    // ------------------------------------------------------------------------

    /// Receive up to `max_messages` without processing them
    ///
    /// Zero is rejected and counts above 10 are lowered to 10. The backend may
    /// return fewer messages than are ready, so one call never proves a queue
    /// is empty.
    pub async fn receive(
        &self,
        name: &QueueName,
        max_messages: u32,
    ) -> Result<Vec<ReceivedMessage>, QueueError> {
        let record = self.record(name).await?;
        self.receive_from(&record, max_messages).await
    }

    async fn receive_from(
        &self,
        record: &QueueRecord,
        max_messages: u32,
    ) -> Result<Vec<ReceivedMessage>, QueueError> {
        if max_messages == 0 {
            return Err(ValidationError::OutOfRange {
                field: "max_messages".to_string(),
                message: format!("must be 1-{}, got 0", MAX_BATCH_ENTRIES),
            }
            .into());
        }

        let mut request = ReceiveRequest::new(max_messages.min(MAX_BATCH_ENTRIES as u32))
            .with_wait_time(self.config.receive_wait_seconds);
        // Without a known timeout the backend applies the queue's own.
        if let Some(visibility) = record.visibility_timeout_seconds() {
            request = request.with_visibility_timeout(visibility);
        }

        let messages = self
            .transport
            .receive_messages(&record.handle, &request)
            .await?;

        tracing::debug!(queue = %record.name, received = messages.len(), "Received messages");
        Ok(messages)
    }

    /// Receive once and run `handler` on every message
    ///
    /// Messages are deleted only when their handler succeeds.
    pub async fn drain_once<H>(
        &self,
        name: &QueueName,
        max_messages: u32,
        handler: &H,
    ) -> Result<DrainReport, QueueError>
    where
        H: MessageHandler + ?Sized,
    {
        let record = self.record(name).await?;
        let threshold = record.redrive_policy.as_ref().map(|p| p.max_receive_count);
        let dead_letter = match &record.redrive_policy {
            Some(policy) => self
                .registry
                .read()
                .await
                .find_by_arn(&policy.dead_letter_target_arn)
                .map(|target| target.name.to_string()),
            None => None,
        };
        let messages = self.receive_from(&record, max_messages).await?;

        let mut report = DrainReport {
            queue: record.name.clone(),
            received: messages.len(),
            messages: Vec::with_capacity(messages.len()),
        };

        for message in &messages {
            if message.is_redelivery() {
                tracing::warn!(
                    queue = %name,
                    message_id = %message.message_id,
                    receive_count = message.receive_count,
                    "Processing redelivered message"
                );
            }
            if let Some(max) = threshold.filter(|max| message.is_final_attempt(*max)) {
                tracing::warn!(
                    queue = %name,
                    message_id = %message.message_id,
                    max_receive_count = max,
                    dead_letter_queue = dead_letter.as_deref().unwrap_or("unregistered"),
                    "Final attempt before the message is dead-lettered"
                );
            }

            let outcome = match handler.handle(message).await {
                Ok(()) => self.acknowledge_processed(&record, message).await,
                Err(e) => self.settle_failure(&record, message, e).await,
            };

            report.messages.push(MessageReport {
                message_id: message.message_id.clone(),
                receive_count: message.receive_count,
                outcome,
            });
        }

        tracing::info!(
            queue = %name,
            received = report.received,
            deleted = report.deleted(),
            failed = report.failed(),
            ack_failed = report.ack_failed(),
            "Drained queue"
        );
        Ok(report)
    }

    async fn acknowledge_processed(
        &self,
        record: &QueueRecord,
        message: &ReceivedMessage,
    ) -> MessageOutcome {
        match self
            .transport
            .delete_message(&record.handle, &message.receipt_handle)
            .await
        {
            Ok(()) => {
                tracing::debug!(queue = %record.name, message_id = %message.message_id, "Deleted message");
                MessageOutcome::Deleted
            }
            Err(e) => {
                tracing::warn!(
                    queue = %record.name,
                    message_id = %message.message_id,
                    error = %e,
                    "Processed message could not be deleted and will be redelivered"
                );
                MessageOutcome::AckFailed {
                    error: e.to_string(),
                }
            }
        }
    }

    async fn settle_failure(
        &self,
        record: &QueueRecord,
        message: &ReceivedMessage,
        error: HandlerError,
    ) -> MessageOutcome {
        tracing::warn!(
            queue = %record.name,
            message_id = %message.message_id,
            receive_count = message.receive_count,
            error = %error,
            "Handler failed, message left for redelivery"
        );
        let reason = error.to_string();

        match self.config.failure_policy {
            FailurePolicy::LeaveInFlight => MessageOutcome::Retained { reason },
            FailurePolicy::ReleaseImmediately => {
                match self
                    .transport
                    .change_visibility(&record.handle, &message.receipt_handle, 0)
                    .await
                {
                    Ok(()) => MessageOutcome::Released { reason },
                    Err(e) => {
                        tracing::warn!(
                            queue = %record.name,
                            message_id = %message.message_id,
                            error = %e,
                            "Failed to release message"
                        );
                        MessageOutcome::Retained {
                            reason: format!("{}; release failed: {}", reason, e),
                        }
                    }
                }
            }
        }
    }

    /// Delete a single delivery
    pub async fn acknowledge(
        &self,
        name: &QueueName,
        receipt: &ReceiptHandle,
    ) -> Result<(), QueueError> {
        let handle = self.handle_of(name).await?;
        self.transport.delete_message(&handle, receipt).await
    }

    /// Replace a delivery's visibility deadline with `now + seconds`
    ///
    /// Calls replace rather than stack: extending by 5 and then by 20 leaves
    /// a deadline 20 seconds after the second call. Fails with
    /// [`QueueError::ReceiptExpired`] once the receipt's deadline has passed.
    pub async fn extend_visibility(
        &self,
        name: &QueueName,
        receipt: &ReceiptHandle,
        seconds: u32,
    ) -> Result<ReceiptHandle, QueueError> {
        if seconds > MAX_VISIBILITY_TIMEOUT_SECONDS {
            return Err(ValidationError::OutOfRange {
                field: "visibility_timeout_seconds".to_string(),
                message: format!("{} exceeds {}", seconds, MAX_VISIBILITY_TIMEOUT_SECONDS),
            }
            .into());
        }

        let now = self.clock.now();
        if receipt.is_expired_at(&now) {
            return Err(QueueError::ReceiptExpired {
                receipt: receipt.handle().to_string(),
            });
        }

        let handle = self.handle_of(name).await?;
        self.transport
            .change_visibility(&handle, receipt, seconds)
            .await?;

        tracing::debug!(queue = %name, seconds, "Changed message visibility");
        Ok(receipt.with_deadline(now.plus_seconds(seconds)))
    }

    /// Remove every message from a queue
    ///
    /// Irreversible. Backends allow one purge per cooldown window and the
    /// refusal is returned as [`QueueError::PurgeRateLimited`].
    pub async fn purge(&self, name: &QueueName) -> Result<(), QueueError> {
        let handle = self.handle_of(name).await?;

        match self.transport.purge_queue(&handle).await {
            Ok(()) => {
                tracing::info!(queue = %name, "Purged queue");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(queue = %name, error = %e, "Purge rejected");
                Err(e)
            }
        }
    }
}

/// Split entries into consecutive runs whose combined payload fits one batch call
fn payload_chunks(entries: &[BatchEntry]) -> Vec<&[BatchEntry]> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut total = 0;
    for (i, entry) in entries.iter().enumerate() {
        let size = entry.message.payload_size();
        if i > start && total + size > MAX_BATCH_PAYLOAD_BYTES {
            chunks.push(&entries[start..i]);
            start = i;
            total = 0;
        }
        total += size;
    }
    if start < entries.len() {
        chunks.push(&entries[start..]);
    }
    chunks
}

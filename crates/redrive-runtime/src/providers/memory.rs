//! In-memory queue provider implementation for testing and development.
//!
//! This module provides an in-memory fake of an at-least-once queue backend that:
//! - Leases received messages for a visibility timeout and redelivers them on expiry
//! - Routes messages to a dead-letter queue once their receive count reaches the redrive threshold
//! - Enforces the purge and queue-recreation cooldowns
//! - Supports FIFO queues with message groups and deduplication
//!
//! All time is read from an injected [`Clock`], so tests can step through
//! visibility windows and cooldowns without sleeping. Long-poll waits are
//! accepted but never block.

use crate::attributes::{QueueAttributes, ATTR_QUEUE_ARN, MAX_VISIBILITY_TIMEOUT_SECONDS};
use crate::clock::{Clock, SystemClock};
use crate::error::QueueError;
use crate::message::{
    AttributeValue, BatchEntry, BatchFailure, BatchSendOutcome, BatchSuccess, Message, MessageId,
    QueueArn, QueueHandle, QueueName, ReceiptHandle, ReceiveRequest, ReceivedMessage, Timestamp,
    MAX_BATCH_ENTRIES, MAX_BATCH_PAYLOAD_BYTES,
};
use crate::provider::{InMemoryConfig, ProviderType};
use crate::transport::{QueueLocation, QueueTransport};
use async_trait::async_trait;
use chrono::Duration;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;

const PROVIDER: &str = "InMemory";

/// Longest per-message delay
const MAX_DELAY_SECONDS: u32 = 900;

// ============================================================================
// Internal Storage Structures
// ============================================================================

/// All queues, indexed by handle, name and ARN
#[derive(Default)]
struct QueueStorage {
    queues: HashMap<QueueHandle, InMemoryQueue>,
    by_name: HashMap<QueueName, QueueHandle>,
    by_arn: HashMap<QueueArn, QueueHandle>,
    /// When each name was last deleted
    deleted_at: HashMap<QueueName, Timestamp>,
}

impl QueueStorage {
    fn queue(&self, handle: &QueueHandle) -> Result<&InMemoryQueue, QueueError> {
        self.queues.get(handle).ok_or_else(|| not_found(handle))
    }

    fn queue_mut(&mut self, handle: &QueueHandle) -> Result<&mut InMemoryQueue, QueueError> {
        self.queues.get_mut(handle).ok_or_else(|| not_found(handle))
    }

    /// Apply the passage of time to every queue
    ///
    /// Drops messages past retention and ends expired leases. A message whose
    /// lease ends after it reached its queue's redrive threshold moves to the
    /// dead-letter queue; every other one becomes visible again.
    fn settle(&mut self, now: &Timestamp, config: &InMemoryConfig) {
        let mut dead_lettered: Vec<(QueueArn, StoredMessage)> = Vec::new();

        for queue in self.queues.values_mut() {
            queue.drop_retention_expired(now);
            queue.forget_deduplication_before(&now.plus(-Duration::seconds(i64::from(
                config.deduplication_window_seconds,
            ))));

            let redrive = queue
                .attributes
                .redrive_policy
                .as_ref()
                .map(|p| (p.dead_letter_target_arn.clone(), p.max_receive_count));

            for message in queue.end_expired_leases(now) {
                match &redrive {
                    Some((target, max)) if message.receive_count >= *max => {
                        // Receipts for a message that left the queue name nothing.
                        queue.forget_receipts_of(&message.message_id);
                        dead_lettered.push((target.clone(), message));
                    }
                    _ => queue.insert_visible(message),
                }
            }
        }

        for (target_arn, message) in dead_lettered {
            let target = self
                .by_arn
                .get(&target_arn)
                .and_then(|handle| self.queues.get_mut(handle));

            match target {
                Some(target) => {
                    tracing::debug!(
                        message_id = %message.message_id,
                        receive_count = message.receive_count,
                        dead_letter_queue = %target.name,
                        "Moved message to dead-letter queue"
                    );
                    target.accept_dead_letter(message, now);
                }
                None => {
                    tracing::warn!(
                        message_id = %message.message_id,
                        dead_letter_target = %target_arn,
                        "Dead-letter target no longer exists, message dropped"
                    );
                }
            }
        }
    }
}

/// Internal queue state for a single queue
struct InMemoryQueue {
    name: QueueName,
    arn: QueueArn,
    attributes: QueueAttributes,
    /// Messages not in flight, in send order
    visible: VecDeque<StoredMessage>,
    /// Leased messages by receipt
    in_flight: HashMap<String, InFlightMessage>,
    /// Receipts of deliveries that have ended without being deleted
    stale_receipts: HashMap<String, MessageId>,
    /// Deduplication IDs seen within the window
    deduplication: HashMap<String, (MessageId, Timestamp)>,
    last_purge: Option<Timestamp>,
    next_sequence: u64,
}

impl InMemoryQueue {
    fn new(name: QueueName, arn: QueueArn, attributes: QueueAttributes) -> Self {
        Self {
            name,
            arn,
            attributes,
            visible: VecDeque::new(),
            in_flight: HashMap::new(),
            stale_receipts: HashMap::new(),
            deduplication: HashMap::new(),
            last_purge: None,
            next_sequence: 1,
        }
    }

    fn take_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }

    /// Insert keeping send order
    fn insert_visible(&mut self, message: StoredMessage) {
        let position = self
            .visible
            .partition_point(|m| m.sequence < message.sequence);
        self.visible.insert(position, message);
    }

    fn drop_retention_expired(&mut self, now: &Timestamp) {
        let retention = self.attributes.message_retention_seconds;
        self.visible
            .retain(|m| m.sent_at.plus_seconds(retention) > *now);

        let expired: Vec<String> = self
            .in_flight
            .iter()
            .filter(|(_, m)| m.message.sent_at.plus_seconds(retention) <= *now)
            .map(|(receipt, _)| receipt.clone())
            .collect();
        for receipt in expired {
            if let Some(entry) = self.in_flight.remove(&receipt) {
                self.forget_receipts_of(&entry.message.message_id);
            }
        }
    }

    fn forget_deduplication_before(&mut self, cutoff: &Timestamp) {
        self.deduplication.retain(|_, (_, seen_at)| *seen_at > *cutoff);
    }

    /// Remove leases whose deadline has passed and return their messages
    fn end_expired_leases(&mut self, now: &Timestamp) -> Vec<StoredMessage> {
        let expired: Vec<String> = self
            .in_flight
            .iter()
            .filter(|(_, m)| m.visible_at <= *now)
            .map(|(receipt, _)| receipt.clone())
            .collect();

        let mut returned = Vec::with_capacity(expired.len());
        for receipt in expired {
            if let Some(entry) = self.in_flight.remove(&receipt) {
                self.stale_receipts
                    .insert(receipt, entry.message.message_id.clone());
                returned.push(entry.message);
            }
        }
        returned
    }

    fn accept_dead_letter(&mut self, mut message: StoredMessage, now: &Timestamp) {
        message.sequence = self.take_sequence();
        message.receive_count = 0;
        message.first_received_at = None;
        message.available_at = now.clone();
        self.insert_visible(message);
    }

    fn forget_receipts_of(&mut self, message_id: &MessageId) {
        self.stale_receipts.retain(|_, id| id != message_id);
    }

    fn location(&self, handle: &QueueHandle) -> QueueLocation {
        QueueLocation {
            handle: handle.clone(),
            arn: self.arn.clone(),
        }
    }

    /// Check a message against this queue's rules
    fn check_message(&self, message: &Message) -> Result<(), QueueError> {
        if message.body.is_empty() {
            return Err(invalid_parameter("message body must not be empty"));
        }

        let size = message.payload_size();
        let max_size = self.attributes.max_message_size_bytes as usize;
        if size > max_size {
            return Err(QueueError::MessageTooLarge { size, max_size });
        }

        if let Some(delay) = message.delay_seconds {
            if self.attributes.fifo {
                return Err(invalid_parameter(
                    "FIFO queues do not support per-message delays",
                ));
            }
            if delay > MAX_DELAY_SECONDS {
                return Err(invalid_parameter(&format!(
                    "delay of {} seconds exceeds {}",
                    delay, MAX_DELAY_SECONDS
                )));
            }
        }

        if self.attributes.fifo {
            if message.group_id.is_none() {
                return Err(QueueError::transport(
                    PROVIDER,
                    "MissingParameter",
                    "FIFO queues require a message group ID",
                ));
            }
            if message.deduplication_id.is_none() && !self.attributes.content_based_deduplication
            {
                return Err(invalid_parameter(
                    "FIFO queue requires a deduplication ID or content-based deduplication",
                ));
            }
        }

        Ok(())
    }

    /// Enqueue a checked message, honouring FIFO deduplication
    fn enqueue(&mut self, message: &Message, now: &Timestamp) -> MessageId {
        let deduplication_id = if self.attributes.fifo {
            message
                .deduplication_id
                .clone()
                .or_else(|| Some(content_digest(&message.body)))
        } else {
            None
        };

        if let Some(id) = &deduplication_id {
            if let Some((existing, _)) = self.deduplication.get(id) {
                tracing::debug!(
                    queue = %self.name,
                    deduplication_id = %id,
                    "Duplicate suppressed within deduplication window"
                );
                return existing.clone();
            }
        }

        let message_id = MessageId::new();
        let delay = message
            .delay_seconds
            .unwrap_or(self.attributes.delay_seconds);
        let sequence = self.take_sequence();

        self.insert_visible(StoredMessage {
            message_id: message_id.clone(),
            body: message.body.clone(),
            attributes: message.attributes.clone(),
            group_id: message.group_id.clone(),
            sequence,
            sent_at: now.clone(),
            available_at: now.plus_seconds(delay),
            receive_count: 0,
            first_received_at: None,
        });

        if let Some(id) = deduplication_id {
            self.deduplication
                .insert(id, (message_id.clone(), now.clone()));
        }

        message_id
    }

    /// Lease up to `max` ready messages
    fn lease(&mut self, max: usize, visibility_seconds: u32, now: &Timestamp) -> Vec<ReceivedMessage> {
        let fifo = self.attributes.fifo;
        let mut blocked_groups: HashSet<String> = self
            .in_flight
            .values()
            .filter_map(|m| m.message.group_id.clone())
            .collect();

        let mut taken = Vec::new();
        let mut index = 0;
        while index < self.visible.len() && taken.len() < max {
            let candidate = &self.visible[index];
            let group = candidate.group_id.as_ref().filter(|_| fifo);

            if group.is_some_and(|g| blocked_groups.contains(g)) {
                index += 1;
                continue;
            }
            if candidate.available_at > *now {
                // Later messages of the same group must wait behind this one.
                if let Some(g) = group {
                    blocked_groups.insert(g.clone());
                }
                index += 1;
                continue;
            }

            if let Some(message) = self.visible.remove(index) {
                taken.push(message);
            }
        }

        let visible_at = now.plus_seconds(visibility_seconds);
        taken
            .into_iter()
            .map(|mut message| {
                message.receive_count += 1;
                let first_received_at = message
                    .first_received_at
                    .get_or_insert_with(|| now.clone())
                    .clone();
                let receipt = uuid::Uuid::new_v4().to_string();

                let received = ReceivedMessage {
                    message_id: message.message_id.clone(),
                    body: message.body.clone(),
                    attributes: message.attributes.clone(),
                    receipt_handle: ReceiptHandle::new(receipt.clone(), visible_at.clone()),
                    receive_count: message.receive_count,
                    sent_at: message.sent_at.clone(),
                    first_received_at,
                    group_id: message.group_id.clone(),
                    sequence_number: fifo.then(|| format!("{:020}", message.sequence)),
                };

                self.in_flight.insert(
                    receipt,
                    InFlightMessage {
                        message,
                        visible_at: visible_at.clone(),
                    },
                );
                received
            })
            .collect()
    }

    /// Error for a receipt that names no current delivery
    fn receipt_error(&self, receipt: &ReceiptHandle) -> QueueError {
        if self.stale_receipts.contains_key(receipt.handle()) {
            QueueError::ReceiptExpired {
                receipt: receipt.handle().to_string(),
            }
        } else {
            QueueError::MessageNotFound {
                receipt: receipt.handle().to_string(),
            }
        }
    }
}

/// A message stored in the queue with metadata
#[derive(Clone)]
struct StoredMessage {
    message_id: MessageId,
    body: String,
    attributes: HashMap<String, AttributeValue>,
    group_id: Option<String>,
    sequence: u64,
    sent_at: Timestamp,
    available_at: Timestamp,
    receive_count: u32,
    first_received_at: Option<Timestamp>,
}

/// A message currently leased to a consumer
struct InFlightMessage {
    message: StoredMessage,
    visible_at: Timestamp,
}

fn not_found(handle: &QueueHandle) -> QueueError {
    QueueError::QueueNotFound {
        queue_name: handle.to_string(),
    }
}

fn invalid_parameter(message: &str) -> QueueError {
    QueueError::transport(PROVIDER, "InvalidParameterValue", message)
}

fn content_digest(body: &str) -> String {
    hex::encode(Sha256::digest(body.as_bytes()))
}

/// Failure reported for a batch entry rejected with `error`
fn batch_failure(entry: &BatchEntry, error: &QueueError) -> BatchFailure {
    let code = match error {
        QueueError::MessageTooLarge { .. } => "MessageTooLong".to_string(),
        QueueError::TransportError { code, .. } => code.clone(),
        _ => "InternalError".to_string(),
    };

    BatchFailure {
        id: entry.id.clone(),
        code,
        message: error.to_string(),
        sender_fault: true,
    }
}

// ============================================================================
// InMemoryProvider
// ============================================================================

/// In-memory queue provider implementation
pub struct InMemoryProvider {
    storage: Arc<RwLock<QueueStorage>>,
    config: InMemoryConfig,
    clock: Arc<dyn Clock>,
}

impl InMemoryProvider {
    /// Create new in-memory provider with configuration
    pub fn new(config: InMemoryConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a provider reading time from `clock`
    pub fn with_clock(config: InMemoryConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage: Arc::new(RwLock::new(QueueStorage::default())),
            config,
            clock,
        }
    }

    fn handle_for(&self, name: &QueueName) -> QueueHandle {
        QueueHandle::new(format!(
            "memory://{}/{}/{}",
            self.config.region, self.config.account_id, name
        ))
    }

    fn arn_for(&self, name: &QueueName) -> QueueArn {
        QueueArn::new(format!(
            "arn:aws:sqs:{}:{}:{}",
            self.config.region, self.config.account_id, name
        ))
    }

    /// Check attributes the way the backend would on create or update
    fn check_attributes(
        storage: &QueueStorage,
        name: &QueueName,
        attributes: &QueueAttributes,
    ) -> Result<(), QueueError> {
        attributes
            .validate()
            .map_err(|e| QueueError::transport(PROVIDER, "InvalidAttributeValue", e.to_string()))?;

        if attributes.fifo != name.is_fifo() {
            return Err(invalid_parameter(
                "FIFO queue names must end in .fifo and only FIFO queue names may",
            ));
        }

        if let Some(policy) = &attributes.redrive_policy {
            let target = storage
                .by_arn
                .get(&policy.dead_letter_target_arn)
                .and_then(|handle| storage.queues.get(handle))
                .ok_or_else(|| {
                    invalid_parameter(&format!(
                        "dead-letter target {} does not exist",
                        policy.dead_letter_target_arn
                    ))
                })?;

            if target.attributes.fifo != attributes.fifo {
                return Err(invalid_parameter(
                    "dead-letter queue must be of the same type as its source queue",
                ));
            }
        }

        Ok(())
    }
}

impl Default for InMemoryProvider {
    fn default() -> Self {
        Self::new(InMemoryConfig::default())
    }
}

#[async_trait]
impl QueueTransport for InMemoryProvider {
    async fn create_queue(
        &self,
        name: &QueueName,
        attributes: &QueueAttributes,
    ) -> Result<QueueLocation, QueueError> {
        let now = self.clock.now();
        let mut storage = self.storage.write().await;

        if let Some(handle) = storage.by_name.get(name) {
            let queue = storage.queue(handle)?;
            if queue.attributes == *attributes {
                return Ok(queue.location(handle));
            }
            return Err(QueueError::transport(
                PROVIDER,
                "QueueAlreadyExists",
                format!("queue {} already exists with different attributes", name),
            ));
        }

        if let Some(deleted_at) = storage.deleted_at.get(name) {
            let reusable_at = deleted_at.plus_seconds(self.config.queue_recreation_cooldown_seconds);
            if now < reusable_at {
                return Err(QueueError::RecentlyDeleted {
                    queue_name: name.to_string(),
                });
            }
        }

        Self::check_attributes(&storage, name, attributes)?;

        let handle = self.handle_for(name);
        let arn = self.arn_for(name);
        storage.deleted_at.remove(name);
        storage.by_name.insert(name.clone(), handle.clone());
        storage.by_arn.insert(arn.clone(), handle.clone());
        storage.queues.insert(
            handle.clone(),
            InMemoryQueue::new(name.clone(), arn.clone(), attributes.clone()),
        );

        tracing::debug!(queue = %name, handle = %handle, "Created in-memory queue");
        Ok(QueueLocation { handle, arn })
    }

    async fn lookup_queue(&self, name: &QueueName) -> Result<QueueLocation, QueueError> {
        let storage = self.storage.read().await;
        let handle = storage
            .by_name
            .get(name)
            .ok_or_else(|| QueueError::QueueNotFound {
                queue_name: name.to_string(),
            })?;
        Ok(storage.queue(handle)?.location(handle))
    }

    async fn queue_arn(&self, handle: &QueueHandle) -> Result<QueueArn, QueueError> {
        let storage = self.storage.read().await;
        Ok(storage.queue(handle)?.arn.clone())
    }

    async fn get_queue_attributes(
        &self,
        handle: &QueueHandle,
    ) -> Result<HashMap<String, String>, QueueError> {
        let storage = self.storage.read().await;
        let queue = storage.queue(handle)?;

        let mut map: HashMap<String, String> =
            queue.attributes.to_attribute_map()?.into_iter().collect();
        map.insert(ATTR_QUEUE_ARN.to_string(), queue.arn.to_string());
        Ok(map)
    }

    async fn set_queue_attributes(
        &self,
        handle: &QueueHandle,
        attributes: &HashMap<String, String>,
    ) -> Result<(), QueueError> {
        let mut storage = self.storage.write().await;
        let queue = storage.queue(handle)?;

        let mut updated = queue.attributes.clone();
        updated.apply_attribute_map(attributes).map_err(|e| {
            QueueError::transport(PROVIDER, "InvalidAttributeValue", e.to_string())
        })?;
        if updated.fifo != queue.attributes.fifo {
            return Err(invalid_parameter("FifoQueue cannot be changed after creation"));
        }
        Self::check_attributes(&storage, &queue.name, &updated)?;

        storage.queue_mut(handle)?.attributes = updated;
        Ok(())
    }

    async fn delete_queue(&self, handle: &QueueHandle) -> Result<(), QueueError> {
        let now = self.clock.now();
        let mut storage = self.storage.write().await;

        let queue = storage
            .queues
            .remove(handle)
            .ok_or_else(|| not_found(handle))?;
        storage.by_name.remove(&queue.name);
        storage.by_arn.remove(&queue.arn);
        storage.deleted_at.insert(queue.name.clone(), now);

        tracing::debug!(queue = %queue.name, "Deleted in-memory queue");
        Ok(())
    }

    async fn send_message(
        &self,
        handle: &QueueHandle,
        message: &Message,
    ) -> Result<MessageId, QueueError> {
        let now = self.clock.now();
        let mut storage = self.storage.write().await;
        storage.settle(&now, &self.config);
        let queue = storage.queue_mut(handle)?;

        queue.check_message(message)?;
        Ok(queue.enqueue(message, &now))
    }

    async fn send_message_batch(
        &self,
        handle: &QueueHandle,
        entries: &[BatchEntry],
    ) -> Result<BatchSendOutcome, QueueError> {
        if entries.is_empty() {
            return Err(QueueError::transport(
                PROVIDER,
                "AWS.SimpleQueueService.EmptyBatchRequest",
                "batch must contain at least one entry",
            ));
        }
        if entries.len() > MAX_BATCH_ENTRIES {
            return Err(QueueError::transport(
                PROVIDER,
                "AWS.SimpleQueueService.TooManyEntriesInBatchRequest",
                format!("batch of {} exceeds {} entries", entries.len(), MAX_BATCH_ENTRIES),
            ));
        }
        let mut ids = HashSet::new();
        if let Some(duplicate) = entries.iter().find(|e| !ids.insert(&e.id)) {
            return Err(QueueError::transport(
                PROVIDER,
                "AWS.SimpleQueueService.BatchEntryIdsNotDistinct",
                format!("entry id {} appears more than once", duplicate.id),
            ));
        }
        let total: usize = entries.iter().map(|e| e.message.payload_size()).sum();
        if total > MAX_BATCH_PAYLOAD_BYTES {
            return Err(QueueError::transport(
                PROVIDER,
                "AWS.SimpleQueueService.BatchRequestTooLong",
                format!("batch payload of {} bytes exceeds {}", total, MAX_BATCH_PAYLOAD_BYTES),
            ));
        }

        let now = self.clock.now();
        let mut storage = self.storage.write().await;
        storage.settle(&now, &self.config);
        let queue = storage.queue_mut(handle)?;

        let mut outcome = BatchSendOutcome::default();
        for entry in entries {
            match queue.check_message(&entry.message) {
                Ok(()) => outcome.successful.push(BatchSuccess {
                    id: entry.id.clone(),
                    message_id: queue.enqueue(&entry.message, &now),
                }),
                Err(error) => outcome.failed.push(batch_failure(entry, &error)),
            }
        }
        Ok(outcome)
    }

    async fn receive_messages(
        &self,
        handle: &QueueHandle,
        request: &ReceiveRequest,
    ) -> Result<Vec<ReceivedMessage>, QueueError> {
        if !(1..=MAX_BATCH_ENTRIES as u32).contains(&request.max_messages) {
            return Err(invalid_parameter(&format!(
                "max_messages must be 1-{}, got {}",
                MAX_BATCH_ENTRIES, request.max_messages
            )));
        }
        if request
            .visibility_timeout_seconds
            .is_some_and(|v| v > MAX_VISIBILITY_TIMEOUT_SECONDS)
        {
            return Err(invalid_parameter("visibility timeout exceeds 12 hours"));
        }

        let now = self.clock.now();
        let mut storage = self.storage.write().await;
        storage.settle(&now, &self.config);

        let queue = storage.queue_mut(handle)?;
        let visibility = request
            .visibility_timeout_seconds
            .unwrap_or(queue.attributes.visibility_timeout_seconds);

        Ok(queue.lease(request.max_messages as usize, visibility, &now))
    }

    async fn delete_message(
        &self,
        handle: &QueueHandle,
        receipt: &ReceiptHandle,
    ) -> Result<(), QueueError> {
        let now = self.clock.now();
        let mut storage = self.storage.write().await;
        storage.settle(&now, &self.config);

        let queue = storage.queue_mut(handle)?;
        match queue.in_flight.remove(receipt.handle()) {
            Some(entry) => {
                queue.forget_receipts_of(&entry.message.message_id);
                Ok(())
            }
            None => Err(queue.receipt_error(receipt)),
        }
    }

    async fn change_visibility(
        &self,
        handle: &QueueHandle,
        receipt: &ReceiptHandle,
        timeout_seconds: u32,
    ) -> Result<(), QueueError> {
        if timeout_seconds > MAX_VISIBILITY_TIMEOUT_SECONDS {
            return Err(invalid_parameter("visibility timeout exceeds 12 hours"));
        }

        let now = self.clock.now();
        let mut storage = self.storage.write().await;
        storage.settle(&now, &self.config);

        let queue = storage.queue_mut(handle)?;
        let Some(entry) = queue.in_flight.get_mut(receipt.handle()) else {
            return Err(queue.receipt_error(receipt));
        };
        entry.visible_at = now.plus_seconds(timeout_seconds);

        if timeout_seconds == 0 {
            // The lease is over; settling applies redelivery or dead-lettering.
            storage.settle(&now, &self.config);
        }
        Ok(())
    }

    async fn purge_queue(&self, handle: &QueueHandle) -> Result<(), QueueError> {
        let now = self.clock.now();
        let mut storage = self.storage.write().await;
        storage.settle(&now, &self.config);

        let cooldown = self.config.purge_cooldown_seconds;
        let queue = storage.queue_mut(handle)?;
        if let Some(last) = &queue.last_purge {
            if now < last.plus_seconds(cooldown) {
                return Err(QueueError::PurgeRateLimited {
                    queue_name: queue.name.to_string(),
                });
            }
        }

        queue.visible.clear();
        queue.in_flight.clear();
        queue.stale_receipts.clear();
        queue.last_purge = Some(now);
        Ok(())
    }

    fn provider_type(&self) -> ProviderType {
        ProviderType::InMemory
    }
}

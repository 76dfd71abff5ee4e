//! Message types for queue operations including core domain identifiers.

use crate::error::ValidationError;
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Suffix every FIFO queue name must carry
pub const FIFO_SUFFIX: &str = ".fifo";

/// Maximum number of entries in a single batch send
pub const MAX_BATCH_ENTRIES: usize = 10;

/// Largest total payload of one batch send, which also bounds any single message
pub const MAX_BATCH_PAYLOAD_BYTES: usize = 262_144;

// ============================================================================
// Core Domain Identifiers
// ============================================================================

/// Validated logical queue name
///
/// 1-80 characters of ASCII alphanumerics, hyphens and underscores. FIFO
/// queue names carry a `.fifo` suffix, which counts toward the limit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QueueName(String);

impl QueueName {
    /// Create new queue name with validation
    pub fn new(name: String) -> Result<Self, ValidationError> {
        if name.is_empty() || name.len() > 80 {
            return Err(ValidationError::OutOfRange {
                field: "queue_name".to_string(),
                message: "must be 1-80 characters".to_string(),
            });
        }

        let base = name.strip_suffix(FIFO_SUFFIX).unwrap_or(&name);
        if base.is_empty() {
            return Err(ValidationError::InvalidFormat {
                field: "queue_name".to_string(),
                message: "name must not consist of the .fifo suffix alone".to_string(),
            });
        }

        if !base
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ValidationError::InvalidFormat {
                field: "queue_name".to_string(),
                message: "only ASCII alphanumeric, hyphens, and underscores allowed".to_string(),
            });
        }

        Ok(Self(name))
    }

    /// Whether the name designates a FIFO queue
    pub fn is_fifo(&self) -> bool {
        self.0.ends_with(FIFO_SUFFIX)
    }

    /// Get queue name as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QueueName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for QueueName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

/// Opaque remote handle of a queue (the queue URL on SQS)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueHandle(String);

impl QueueHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QueueHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque resource name of a queue, used as a dead-letter target
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueArn(String);

impl QueueArn {
    pub fn new(arn: impl Into<String>) -> Self {
        Self(arn.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QueueArn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Backend-assigned identifier of a sent message
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(String);

impl MessageId {
    /// Generate new random message ID
    pub fn new() -> Self {
        let id = uuid::Uuid::new_v4();
        Self(id.to_string())
    }

    /// Wrap an identifier returned by a provider
    pub(crate) fn from_provider(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get message ID as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MessageId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ValidationError::Required {
                field: "message_id".to_string(),
            });
        }

        Ok(Self(s.to_string()))
    }
}

/// Producer-assigned identifier correlating a batch entry with its result
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchEntryId(String);

impl BatchEntryId {
    /// Create new entry ID with validation
    pub fn new(id: String) -> Result<Self, ValidationError> {
        if id.is_empty() || id.len() > 80 {
            return Err(ValidationError::OutOfRange {
                field: "batch_entry_id".to_string(),
                message: "must be 1-80 characters".to_string(),
            });
        }

        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ValidationError::InvalidFormat {
                field: "batch_entry_id".to_string(),
                message: "only ASCII alphanumeric, hyphens, and underscores allowed".to_string(),
            });
        }

        Ok(Self(id))
    }

    /// Generate a random entry ID
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BatchEntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BatchEntryId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

/// Timestamp wrapper for consistent time handling
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create timestamp for current time
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Create timestamp from DateTime
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Get underlying DateTime
    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Timestamp shifted by the given duration
    pub fn plus(&self, duration: Duration) -> Self {
        Self(self.0 + duration)
    }

    /// Timestamp shifted by whole seconds
    pub fn plus_seconds(&self, seconds: u32) -> Self {
        self.plus(Duration::seconds(i64::from(seconds)))
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S UTC"))
    }
}

impl FromStr for Timestamp {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let dt = s.parse::<DateTime<Utc>>()?;
        Ok(Self::from_datetime(dt))
    }
}

// ============================================================================
// Message Types
// ============================================================================

/// Typed value of a message attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "data_type", content = "value")]
pub enum AttributeValue {
    String(String),
    /// Numbers travel in their decimal string form
    Number(String),
    Binary(#[serde(with = "bytes_serde")] Bytes),
}

impl AttributeValue {
    /// Backend data type label
    pub fn data_type(&self) -> &'static str {
        match self {
            Self::String(_) => "String",
            Self::Number(_) => "Number",
            Self::Binary(_) => "Binary",
        }
    }

    /// Size of the value in bytes
    pub fn len(&self) -> usize {
        match self {
            Self::String(s) | Self::Number(s) => s.len(),
            Self::Binary(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Custom serialization for Bytes
mod bytes_serde {
    use base64::{engine::general_purpose, Engine as _};
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let encoded = general_purpose::STANDARD.encode(bytes);
        encoded.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Bytes, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        let decoded = general_purpose::STANDARD
            .decode(encoded)
            .map_err(serde::de::Error::custom)?;
        Ok(Bytes::from(decoded))
    }
}

/// A message to be sent through the queue system
///
/// Builder methods consume and return the value, so a message is never
/// shared-and-mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub body: String,
    pub attributes: HashMap<String, AttributeValue>,
    pub delay_seconds: Option<u32>,
    pub group_id: Option<String>,
    pub deduplication_id: Option<String>,
}

impl Message {
    /// Create new message with body
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            attributes: HashMap::new(),
            delay_seconds: None,
            group_id: None,
            deduplication_id: None,
        }
    }

    /// Add message attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Add a string attribute
    pub fn with_string_attribute(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_attribute(key, AttributeValue::String(value.into()))
    }

    /// Override the queue's delivery delay for this message
    pub fn with_delay_seconds(mut self, delay: u32) -> Self {
        self.delay_seconds = Some(delay);
        self
    }

    /// Set the FIFO message group
    pub fn with_group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    /// Set the FIFO deduplication ID
    pub fn with_deduplication_id(mut self, id: impl Into<String>) -> Self {
        self.deduplication_id = Some(id.into());
        self
    }

    /// Size counted against a queue's maximum message size
    ///
    /// Body plus, for each attribute, its name, data type and value.
    pub fn payload_size(&self) -> usize {
        let attributes: usize = self
            .attributes
            .iter()
            .map(|(name, value)| name.len() + value.data_type().len() + value.len())
            .sum();
        self.body.len() + attributes
    }
}

/// One entry of a batch send
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub id: BatchEntryId,
    pub message: Message,
}

impl BatchEntry {
    pub fn new(id: BatchEntryId, message: Message) -> Self {
        Self { id, message }
    }

    /// Entry with a freshly generated ID
    pub fn generated(message: Message) -> Self {
        Self::new(BatchEntryId::generate(), message)
    }
}

/// Successful batch entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSuccess {
    pub id: BatchEntryId,
    pub message_id: MessageId,
}

/// Rejected batch entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub id: BatchEntryId,
    pub code: String,
    pub message: String,
    /// Whether the entry itself was at fault (as opposed to the backend)
    pub sender_fault: bool,
}

/// Per-entry result of a batch send
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSendOutcome {
    pub successful: Vec<BatchSuccess>,
    pub failed: Vec<BatchFailure>,
}

impl BatchSendOutcome {
    /// Whether every entry was accepted
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Total number of entries reported
    pub fn len(&self) -> usize {
        self.successful.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Message ID assigned to an entry, if it succeeded
    pub fn message_id_for(&self, id: &BatchEntryId) -> Option<&MessageId> {
        self.successful
            .iter()
            .find(|s| &s.id == id)
            .map(|s| &s.message_id)
    }

    /// Failure reported for an entry, if it failed
    pub fn failure_for(&self, id: &BatchEntryId) -> Option<&BatchFailure> {
        self.failed.iter().find(|f| &f.id == id)
    }

    /// Merge another outcome into this one
    pub fn merge(&mut self, other: BatchSendOutcome) {
        self.successful.extend(other.successful);
        self.failed.extend(other.failed);
    }
}

/// A message received from the queue with processing metadata
#[derive(Debug, Clone, Serialize)]
pub struct ReceivedMessage {
    pub message_id: MessageId,
    pub body: String,
    pub attributes: HashMap<String, AttributeValue>,
    pub receipt_handle: ReceiptHandle,
    /// Approximate number of times this message has been received, including this one
    pub receive_count: u32,
    pub sent_at: Timestamp,
    pub first_received_at: Timestamp,
    pub group_id: Option<String>,
    pub sequence_number: Option<String>,
}

impl ReceivedMessage {
    /// Convert back to Message (for forwarding/replaying)
    pub fn message(&self) -> Message {
        Message {
            body: self.body.clone(),
            attributes: self.attributes.clone(),
            delay_seconds: None,
            group_id: self.group_id.clone(),
            deduplication_id: None,
        }
    }

    /// Whether this is a redelivery
    pub fn is_redelivery(&self) -> bool {
        self.receive_count > 1
    }

    /// Whether a failure now will route the message to the dead-letter queue
    pub fn is_final_attempt(&self, max_receive_count: u32) -> bool {
        self.receive_count >= max_receive_count
    }
}

/// Opaque token for acknowledging a specific delivery, with its visibility deadline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiptHandle {
    handle: String,
    expires_at: Timestamp,
}

impl ReceiptHandle {
    /// Create new receipt handle
    pub fn new(handle: String, expires_at: Timestamp) -> Self {
        Self { handle, expires_at }
    }

    /// Get handle string
    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// Visibility deadline of this delivery
    pub fn expires_at(&self) -> &Timestamp {
        &self.expires_at
    }

    /// Check if receipt handle is expired at the given instant
    pub fn is_expired_at(&self, now: &Timestamp) -> bool {
        *now >= self.expires_at
    }

    /// Check if receipt handle is expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(&Timestamp::now())
    }

    /// Get time until expiry, measured from `now`
    pub fn time_until_expiry_at(&self, now: &Timestamp) -> Duration {
        if self.is_expired_at(now) {
            Duration::zero()
        } else {
            self.expires_at.as_datetime() - now.as_datetime()
        }
    }

    /// Same token with a replaced deadline
    pub fn with_deadline(&self, expires_at: Timestamp) -> Self {
        Self {
            handle: self.handle.clone(),
            expires_at,
        }
    }
}

// ============================================================================
// Receive Options
// ============================================================================

/// Parameters of a single receive call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiveRequest {
    /// Upper bound on messages returned (1-10); the backend may return fewer
    pub max_messages: u32,
    /// Lease for the received messages; queue default when absent
    pub visibility_timeout_seconds: Option<u32>,
    /// Long-poll wait; queue default when absent
    pub wait_time_seconds: Option<u32>,
}

impl Default for ReceiveRequest {
    fn default() -> Self {
        Self {
            max_messages: 1,
            visibility_timeout_seconds: None,
            wait_time_seconds: None,
        }
    }
}

impl ReceiveRequest {
    pub fn new(max_messages: u32) -> Self {
        Self {
            max_messages,
            ..Self::default()
        }
    }

    pub fn with_visibility_timeout(mut self, seconds: u32) -> Self {
        self.visibility_timeout_seconds = Some(seconds);
        self
    }

    pub fn with_wait_time(mut self, seconds: u32) -> Self {
        self.wait_time_seconds = Some(seconds);
        self
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;

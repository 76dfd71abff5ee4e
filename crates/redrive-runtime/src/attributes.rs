//! Queue creation attributes and the dead-letter redrive policy.

use crate::error::{QueueError, SerializationError, ValidationError};
use crate::message::QueueArn;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub const ATTR_DELAY_SECONDS: &str = "DelaySeconds";
pub const ATTR_MAXIMUM_MESSAGE_SIZE: &str = "MaximumMessageSize";
pub const ATTR_VISIBILITY_TIMEOUT: &str = "VisibilityTimeout";
pub const ATTR_MESSAGE_RETENTION_PERIOD: &str = "MessageRetentionPeriod";
pub const ATTR_RECEIVE_WAIT_TIME: &str = "ReceiveMessageWaitTimeSeconds";
pub const ATTR_FIFO_QUEUE: &str = "FifoQueue";
pub const ATTR_CONTENT_BASED_DEDUPLICATION: &str = "ContentBasedDeduplication";
pub const ATTR_REDRIVE_POLICY: &str = "RedrivePolicy";
pub const ATTR_QUEUE_ARN: &str = "QueueArn";

/// Longest visibility timeout a backend accepts (12 hours)
pub const MAX_VISIBILITY_TIMEOUT_SECONDS: u32 = 43_200;

/// Routes a message to a dead-letter queue after repeated failed receives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedrivePolicy {
    pub dead_letter_target_arn: QueueArn,
    pub max_receive_count: u32,
}

impl RedrivePolicy {
    /// Create a policy; `max_receive_count` must be at least 1
    pub fn new(dead_letter_target_arn: QueueArn, max_receive_count: u32) -> Result<Self, QueueError> {
        if max_receive_count < 1 {
            return Err(QueueError::InvalidPolicy {
                message: "maxReceiveCount must be at least 1".to_string(),
            });
        }

        Ok(Self {
            dead_letter_target_arn,
            max_receive_count,
        })
    }

    /// Render the backend's JSON form
    pub fn to_json(&self) -> Result<String, QueueError> {
        serde_json::to_string(self).map_err(|e| SerializationError::JsonError(e).into())
    }

    /// Parse the backend's JSON form
    ///
    /// `maxReceiveCount` is accepted as a number or a numeric string.
    pub fn from_json(raw: &str) -> Result<Self, QueueError> {
        let value: serde_json::Value = serde_json::from_str(raw).map_err(|e| {
            QueueError::InvalidPolicy {
                message: format!("invalid RedrivePolicy JSON: {}", e),
            }
        })?;

        let arn = value
            .get("deadLetterTargetArn")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| QueueError::InvalidPolicy {
                message: "RedrivePolicy must contain deadLetterTargetArn".to_string(),
            })?;

        let max_receive_count = value
            .get("maxReceiveCount")
            .and_then(|v| v.as_u64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
            .ok_or_else(|| QueueError::InvalidPolicy {
                message: "RedrivePolicy must contain a numeric maxReceiveCount".to_string(),
            })?;

        let max_receive_count =
            u32::try_from(max_receive_count).map_err(|_| QueueError::InvalidPolicy {
                message: format!("maxReceiveCount {} is out of range", max_receive_count),
            })?;

        Self::new(QueueArn::new(arn), max_receive_count)
    }
}

/// Recognised queue attributes, with the backend's defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueAttributes {
    pub fifo: bool,
    pub content_based_deduplication: bool,
    pub delay_seconds: u32,
    pub max_message_size_bytes: u32,
    pub visibility_timeout_seconds: u32,
    pub message_retention_seconds: u32,
    /// Long-poll wait applied to receives that do not specify one
    pub receive_wait_seconds: u32,
    pub redrive_policy: Option<RedrivePolicy>,
}

impl Default for QueueAttributes {
    fn default() -> Self {
        Self {
            fifo: false,
            content_based_deduplication: false,
            delay_seconds: 0,
            max_message_size_bytes: 262_144,
            visibility_timeout_seconds: 30,
            message_retention_seconds: 345_600,
            receive_wait_seconds: 0,
            redrive_policy: None,
        }
    }
}

impl QueueAttributes {
    /// Attributes of a FIFO queue
    pub fn fifo() -> Self {
        Self {
            fifo: true,
            ..Self::default()
        }
    }

    pub fn with_content_based_deduplication(mut self, enabled: bool) -> Self {
        self.content_based_deduplication = enabled;
        self
    }

    pub fn with_delay_seconds(mut self, seconds: u32) -> Self {
        self.delay_seconds = seconds;
        self
    }

    pub fn with_max_message_size(mut self, bytes: u32) -> Self {
        self.max_message_size_bytes = bytes;
        self
    }

    pub fn with_visibility_timeout(mut self, seconds: u32) -> Self {
        self.visibility_timeout_seconds = seconds;
        self
    }

    pub fn with_message_retention(mut self, seconds: u32) -> Self {
        self.message_retention_seconds = seconds;
        self
    }

    pub fn with_receive_wait(mut self, seconds: u32) -> Self {
        self.receive_wait_seconds = seconds;
        self
    }

    pub fn with_redrive_policy(mut self, policy: RedrivePolicy) -> Self {
        self.redrive_policy = Some(policy);
        self
    }

    /// Check every value against the backend's accepted range
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_range("delay_seconds", self.delay_seconds, 0, 900)?;
        check_range(
            "max_message_size_bytes",
            self.max_message_size_bytes,
            1_024,
            262_144,
        )?;
        check_range(
            "visibility_timeout_seconds",
            self.visibility_timeout_seconds,
            0,
            MAX_VISIBILITY_TIMEOUT_SECONDS,
        )?;
        check_range(
            "message_retention_seconds",
            self.message_retention_seconds,
            60,
            1_209_600,
        )?;
        check_range("receive_wait_seconds", self.receive_wait_seconds, 0, 20)?;

        if self.content_based_deduplication && !self.fifo {
            return Err(ValidationError::InvalidFormat {
                field: "content_based_deduplication".to_string(),
                message: "only FIFO queues support content-based deduplication".to_string(),
            });
        }

        Ok(())
    }

    /// Render as the backend's string-keyed attribute map
    ///
    /// `FifoQueue` and `ContentBasedDeduplication` are only emitted when set,
    /// since standard queues reject them.
    pub fn to_attribute_map(&self) -> Result<BTreeMap<String, String>, QueueError> {
        let mut map = BTreeMap::new();
        map.insert(ATTR_DELAY_SECONDS.to_string(), self.delay_seconds.to_string());
        map.insert(
            ATTR_MAXIMUM_MESSAGE_SIZE.to_string(),
            self.max_message_size_bytes.to_string(),
        );
        map.insert(
            ATTR_VISIBILITY_TIMEOUT.to_string(),
            self.visibility_timeout_seconds.to_string(),
        );
        map.insert(
            ATTR_MESSAGE_RETENTION_PERIOD.to_string(),
            self.message_retention_seconds.to_string(),
        );
        map.insert(
            ATTR_RECEIVE_WAIT_TIME.to_string(),
            self.receive_wait_seconds.to_string(),
        );
        if self.fifo {
            map.insert(ATTR_FIFO_QUEUE.to_string(), "true".to_string());
        }
        if self.content_based_deduplication {
            map.insert(
                ATTR_CONTENT_BASED_DEDUPLICATION.to_string(),
                "true".to_string(),
            );
        }
        if let Some(policy) = &self.redrive_policy {
            map.insert(ATTR_REDRIVE_POLICY.to_string(), policy.to_json()?);
        }
        Ok(map)
    }

    /// Apply a string-keyed attribute map on top of these attributes
    ///
    /// Unknown keys are ignored. An empty `RedrivePolicy` value clears the policy.
    pub fn apply_attribute_map(&mut self, map: &HashMap<String, String>) -> Result<(), QueueError> {
        for (key, value) in map {
            match key.as_str() {
                ATTR_DELAY_SECONDS => self.delay_seconds = parse_u32(key, value)?,
                ATTR_MAXIMUM_MESSAGE_SIZE => self.max_message_size_bytes = parse_u32(key, value)?,
                ATTR_VISIBILITY_TIMEOUT => self.visibility_timeout_seconds = parse_u32(key, value)?,
                ATTR_MESSAGE_RETENTION_PERIOD => {
                    self.message_retention_seconds = parse_u32(key, value)?
                }
                ATTR_RECEIVE_WAIT_TIME => self.receive_wait_seconds = parse_u32(key, value)?,
                ATTR_FIFO_QUEUE => self.fifo = parse_bool(key, value)?,
                ATTR_CONTENT_BASED_DEDUPLICATION => {
                    self.content_based_deduplication = parse_bool(key, value)?
                }
                ATTR_REDRIVE_POLICY => {
                    self.redrive_policy = if value.is_empty() {
                        None
                    } else {
                        Some(RedrivePolicy::from_json(value)?)
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Parse a full attribute map, starting from the defaults
    pub fn from_attribute_map(map: &HashMap<String, String>) -> Result<Self, QueueError> {
        let mut attributes = Self::default();
        attributes.apply_attribute_map(map)?;
        Ok(attributes)
    }
}

fn check_range(field: &str, value: u32, min: u32, max: u32) -> Result<(), ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            message: format!("{} is outside {}..={}", value, min, max),
        });
    }
    Ok(())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, QueueError> {
    value.parse().map_err(|_| {
        SerializationError::InvalidQueueAttribute {
            key: key.to_string(),
            value: value.to_string(),
        }
        .into()
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, QueueError> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(SerializationError::InvalidQueueAttribute {
            key: key.to_string(),
            value: value.to_string(),
        }
        .into()),
    }
}

#[cfg(test)]
#[path = "attributes_tests.rs"]
mod tests;

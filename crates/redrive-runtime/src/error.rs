//! Error types for registry, lifecycle and transport operations.

use chrono::Duration;
use thiserror::Error;

/// Comprehensive error type for all queue operations
///
/// Validation failures raised by the registry or the orchestrator are local
/// and recoverable: nothing was mutated and the caller may retry with
/// corrected input. Backend failures are surfaced unchanged and are never
/// retried by this crate.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue not found: {queue_name}")]
    QueueNotFound { queue_name: String },

    #[error("Queue '{queue_name}' is already registered with handle {existing_handle}")]
    DuplicateQueue {
        queue_name: String,
        existing_handle: String,
    },

    #[error("Invalid redrive policy: {message}")]
    InvalidPolicy { message: String },

    #[error("Message too large: {size} bytes (max: {max_size})")]
    MessageTooLarge { size: usize, max_size: usize },

    #[error("Receipt expired: {receipt}")]
    ReceiptExpired { receipt: String },

    #[error("Message not found for receipt: {receipt}")]
    MessageNotFound { receipt: String },

    #[error("Purge of queue '{queue_name}' rejected: a purge ran within the cooldown window")]
    PurgeRateLimited { queue_name: String },

    #[error("Queue '{queue_name}' was deleted recently and cannot be recreated yet")]
    RecentlyDeleted { queue_name: String },

    #[error("Transport error ({provider}): {code} - {message}")]
    TransportError {
        provider: String,
        code: String,
        message: String,
    },

    #[error("Serialization failed: {0}")]
    SerializationError(#[from] SerializationError),

    #[error("Configuration error: {0}")]
    ConfigurationError(#[from] ConfigurationError),

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationError),
}

impl QueueError {
    /// Check if error is transient, i.e. the same call may succeed later
    ///
    /// This is advisory. Sends are not idempotent, so whether to retry is the
    /// caller's decision.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::QueueNotFound { .. } => false,
            Self::DuplicateQueue { .. } => false,
            Self::InvalidPolicy { .. } => false,
            Self::MessageTooLarge { .. } => false,
            Self::ReceiptExpired { .. } => false,
            Self::MessageNotFound { .. } => false,
            Self::PurgeRateLimited { .. } => true,
            Self::RecentlyDeleted { .. } => true,
            Self::TransportError { .. } => true,
            Self::SerializationError(_) => false,
            Self::ConfigurationError(_) => false,
            Self::ValidationError(_) => false,
        }
    }

    /// Get the minimum wait before the same call can succeed, when known
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::PurgeRateLimited { .. } => Some(Duration::seconds(60)),
            Self::RecentlyDeleted { .. } => Some(Duration::seconds(60)),
            _ => None,
        }
    }

    /// Build a transport error for the given provider
    pub fn transport(provider: &str, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransportError {
            provider: provider.to_string(),
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Errors during message or policy serialization/deserialization
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("JSON serialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Message attribute '{key}' has invalid value")]
    InvalidAttribute { key: String },

    #[error("Queue attribute '{key}' could not be parsed: {value}")]
    InvalidQueueAttribute { key: String, value: String },
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },
}

/// Validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    Required { field: String },

    #[error("Invalid format for {field}: {message}")]
    InvalidFormat { field: String, message: String },

    #[error("Value out of range for {field}: {message}")]
    OutOfRange { field: String, message: String },

    #[error("Duplicate value for {field}: {value}")]
    Duplicate { field: String, value: String },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

//! Transport capability: the primitive remote calls of a queuing backend.
//!
//! The orchestrator in [`crate::lifecycle`] only ever talks to a backend
//! through [`QueueTransport`], so it can run against the in-memory fake in
//! tests and against SQS in production.

use crate::attributes::QueueAttributes;
use crate::clock::Clock;
use crate::error::QueueError;
use crate::message::{
    BatchEntry, BatchSendOutcome, Message, MessageId, QueueArn, QueueHandle, QueueName,
    ReceiptHandle, ReceiveRequest, ReceivedMessage,
};
use crate::provider::{ProviderConfig, ProviderType};
use crate::providers::{InMemoryProvider, SqsProvider};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;

/// Where a queue lives on the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueLocation {
    pub handle: QueueHandle,
    pub arn: QueueArn,
}

/// Interface implemented by specific queue backends (SQS, in-memory)
///
/// Every call is a single request/response; implementations never retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueueTransport: Send + Sync {
    /// Create a queue and return its handle and ARN
    async fn create_queue(
        &self,
        name: &QueueName,
        attributes: &QueueAttributes,
    ) -> Result<QueueLocation, QueueError>;

    /// Find an existing queue by name
    async fn lookup_queue(&self, name: &QueueName) -> Result<QueueLocation, QueueError>;

    /// Resolve the ARN of a queue from its handle
    async fn queue_arn(&self, handle: &QueueHandle) -> Result<QueueArn, QueueError>;

    /// Read queue attributes in the backend's string-keyed form
    async fn get_queue_attributes(
        &self,
        handle: &QueueHandle,
    ) -> Result<HashMap<String, String>, QueueError>;

    /// Update queue attributes using the backend's string-keyed form
    async fn set_queue_attributes(
        &self,
        handle: &QueueHandle,
        attributes: &HashMap<String, String>,
    ) -> Result<(), QueueError>;

    /// Delete a queue; irreversible
    async fn delete_queue(&self, handle: &QueueHandle) -> Result<(), QueueError>;

    /// Send single message
    async fn send_message(
        &self,
        handle: &QueueHandle,
        message: &Message,
    ) -> Result<MessageId, QueueError>;

    /// Send up to ten entries; each entry succeeds or fails on its own
    async fn send_message_batch(
        &self,
        handle: &QueueHandle,
        entries: &[BatchEntry],
    ) -> Result<BatchSendOutcome, QueueError>;

    /// Receive up to `request.max_messages` messages; may return fewer than are ready
    async fn receive_messages(
        &self,
        handle: &QueueHandle,
        request: &ReceiveRequest,
    ) -> Result<Vec<ReceivedMessage>, QueueError>;

    /// Delete the delivery identified by a receipt
    async fn delete_message(
        &self,
        handle: &QueueHandle,
        receipt: &ReceiptHandle,
    ) -> Result<(), QueueError>;

    /// Replace the visibility deadline of a delivery
    async fn change_visibility(
        &self,
        handle: &QueueHandle,
        receipt: &ReceiptHandle,
        timeout_seconds: u32,
    ) -> Result<(), QueueError>;

    /// Remove every message from a queue; rate limited by the backend
    async fn purge_queue(&self, handle: &QueueHandle) -> Result<(), QueueError>;

    /// Get provider type
    fn provider_type(&self) -> ProviderType;
}

/// Factory for creating transports from configuration
pub struct TransportFactory;

impl TransportFactory {
    /// Create the transport selected by the configuration
    pub async fn create(
        config: &ProviderConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Arc<dyn QueueTransport>, QueueError> {
        let transport: Arc<dyn QueueTransport> = match config {
            ProviderConfig::InMemory(memory_config) => {
                Arc::new(InMemoryProvider::with_clock(memory_config.clone(), clock))
            }
            ProviderConfig::AwsSqs(aws_config) => {
                Arc::new(SqsProvider::new(aws_config.clone(), clock).await?)
            }
        };

        tracing::debug!(provider = %transport.provider_type(), "Created queue transport");
        Ok(transport)
    }

    /// Create an in-memory transport with default configuration
    pub fn create_test_transport() -> Arc<dyn QueueTransport> {
        Arc::new(InMemoryProvider::default())
    }
}

//! # Redrive Runtime
//!
//! Queue registry and message lifecycle orchestration for at-least-once
//! queues with visibility timeouts and dead-letter redrive, backed by AWS SQS
//! or an in-memory fake with the same semantics.
//!
//! This library provides:
//! - A registry mapping logical queue names to backend handles and ARNs
//! - Redrive policies routing repeatedly failing messages to a dead-letter queue
//! - Receive, process and acknowledge orchestration with visibility extension
//! - Batch sends with per-entry results
//!
//! ## Module Organization
//!
//! - [`error`] - Error types for all queue operations
//! - [`message`] - Names, messages, receipts and batch types
//! - [`attributes`] - Queue attributes and redrive policies
//! - [`registry`] - Name to handle/ARN registry
//! - [`transport`] - The backend capability and its factory
//! - [`providers`] - SQS and in-memory transports
//! - [`lifecycle`] - The orchestrator driving the message lifecycle
//! - [`clock`] - Injectable time source

// Module declarations
pub mod attributes;
pub mod clock;
pub mod error;
pub mod lifecycle;
pub mod message;
pub mod provider;
pub mod providers;
pub mod registry;
pub mod transport;

// Re-export commonly used types at crate root for convenience
pub use attributes::{QueueAttributes, RedrivePolicy};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigurationError, QueueError, SerializationError, ValidationError};
pub use lifecycle::{
    handler_fn, DrainReport, FailurePolicy, HandlerError, LifecycleConfig, MessageHandler,
    MessageOutcome, MessageReport, QueueOrchestrator,
};
pub use message::{
    AttributeValue, BatchEntry, BatchEntryId, BatchFailure, BatchSendOutcome, BatchSuccess,
    Message, MessageId, QueueArn, QueueHandle, QueueName, ReceiptHandle, ReceiveRequest,
    ReceivedMessage, Timestamp,
};
pub use provider::{AwsSqsConfig, InMemoryConfig, ProviderConfig, ProviderType};
pub use providers::{InMemoryProvider, SqsProvider};
pub use registry::{QueueRecord, QueueRegistry};
pub use transport::{QueueLocation, QueueTransport, TransportFactory};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

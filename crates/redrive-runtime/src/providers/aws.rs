//! AWS SQS provider implementation using the AWS SDK.
//!
//! ## Key Features
//!
//! - **Standard and FIFO queues**: FIFO queues carry message groups and deduplication IDs
//! - **Dead letter queues**: native SQS redrive policies, pushed as queue attributes
//! - **Batch sends**: up to 10 entries, with per-entry results
//! - **Error mapping**: SQS error codes become the matching [`QueueError`] variants
//!
//! ## Authentication
//!
//! Credentials are resolved by the standard AWS provider chain (environment
//! variables, shared profile files, container and instance metadata). The
//! configuration only selects region, endpoint and profile.
//!
//! ## Receipt Deadlines
//!
//! SQS does not report a delivery's visibility deadline. Receipts are stamped
//! with the injected clock's time plus the visibility timeout requested on
//! receive, or [`DEFAULT_VISIBILITY_TIMEOUT_SECONDS`] when none was requested.

use crate::attributes::{QueueAttributes, ATTR_QUEUE_ARN};
use crate::clock::Clock;
use crate::error::{ConfigurationError, QueueError};
use crate::message::{
    AttributeValue, BatchEntry, BatchEntryId, BatchFailure, BatchSendOutcome, BatchSuccess,
    Message, MessageId, QueueArn, QueueHandle, QueueName, ReceiptHandle, ReceiveRequest,
    ReceivedMessage, Timestamp,
};
use crate::provider::{AwsSqsConfig, ProviderType};
use crate::transport::{QueueLocation, QueueTransport};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_sqs::config::Region;
use aws_sdk_sqs::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_sqs::primitives::Blob;
use aws_sdk_sqs::types::{
    MessageAttributeValue, MessageSystemAttributeName, QueueAttributeName,
    SendMessageBatchRequestEntry,
};
use aws_sdk_sqs::Client;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[cfg(test)]
#[path = "aws_tests.rs"]
mod tests;

const PROVIDER: &str = "AwsSqs";

/// Visibility timeout assumed when a receive does not request one
pub const DEFAULT_VISIBILITY_TIMEOUT_SECONDS: u32 = 30;

// ============================================================================
// Error Mapping
// ============================================================================

/// Map an SQS error code to a queue error
///
/// `subject` names what the call addressed: the queue handle or the receipt.
pub(crate) fn map_error_code(code: &str, message: &str, subject: &str) -> QueueError {
    let short = code.strip_prefix("AWS.SimpleQueueService.").unwrap_or(code);

    match short {
        "NonExistentQueue" | "QueueDoesNotExist" => QueueError::QueueNotFound {
            queue_name: subject.to_string(),
        },
        "QueueDeletedRecently" => QueueError::RecentlyDeleted {
            queue_name: subject.to_string(),
        },
        "PurgeQueueInProgress" => QueueError::PurgeRateLimited {
            queue_name: subject.to_string(),
        },
        "ReceiptHandleIsInvalid" => QueueError::MessageNotFound {
            receipt: subject.to_string(),
        },
        "MessageNotInflight" => QueueError::ReceiptExpired {
            receipt: subject.to_string(),
        },
        "InvalidParameterValue" if mentions_expired_receipt(message) => QueueError::ReceiptExpired {
            receipt: subject.to_string(),
        },
        _ => QueueError::transport(PROVIDER, code, message),
    }
}

fn mentions_expired_receipt(message: &str) -> bool {
    message
        .to_ascii_lowercase()
        .contains("receipt handle has expired")
}

/// Map an SDK call failure to a queue error
fn map_sdk_error<E, R>(error: SdkError<E, R>, subject: &str) -> QueueError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: fmt::Debug,
{
    match error.code() {
        Some(code) => {
            let message = error.message().unwrap_or_default().to_string();
            map_error_code(code, &message, subject)
        }
        None => {
            let kind = match &error {
                SdkError::DispatchFailure(_) => "DispatchFailure",
                SdkError::TimeoutError(_) => "Timeout",
                SdkError::ResponseError(_) => "ResponseError",
                SdkError::ConstructionFailure(_) => "ConstructionFailure",
                _ => "Unknown",
            };
            QueueError::transport(PROVIDER, kind, DisplayErrorContext(&error).to_string())
        }
    }
}

fn missing_field(field: &str) -> QueueError {
    QueueError::transport(
        PROVIDER,
        "MalformedResponse",
        format!("response did not include {}", field),
    )
}

// ============================================================================
// Conversions
// ============================================================================

/// Convert a message attribute to its SQS form
pub(crate) fn to_sqs_attribute(value: &AttributeValue) -> Result<MessageAttributeValue, QueueError> {
    let builder = MessageAttributeValue::builder().data_type(value.data_type());
    let builder = match value {
        AttributeValue::String(s) | AttributeValue::Number(s) => builder.string_value(s),
        AttributeValue::Binary(b) => builder.binary_value(Blob::new(b.to_vec())),
    };

    builder
        .build()
        .map_err(|e| QueueError::transport(PROVIDER, "InvalidAttribute", e.to_string()))
}

/// Convert an SQS message attribute back, using the base data type
///
/// Custom type suffixes (`Number.float`) are folded into their base type.
pub(crate) fn from_sqs_attribute(value: &MessageAttributeValue) -> Option<AttributeValue> {
    let base = value.data_type().split('.').next().unwrap_or_default();
    match base {
        "String" => value
            .string_value()
            .map(|s| AttributeValue::String(s.to_string())),
        "Number" => value
            .string_value()
            .map(|s| AttributeValue::Number(s.to_string())),
        "Binary" => value
            .binary_value()
            .map(|b| AttributeValue::Binary(bytes::Bytes::copy_from_slice(b.as_ref()))),
        _ => None,
    }
}

fn to_sqs_attributes(
    attributes: &HashMap<String, AttributeValue>,
) -> Result<Option<HashMap<String, MessageAttributeValue>>, QueueError> {
    if attributes.is_empty() {
        return Ok(None);
    }

    attributes
        .iter()
        .map(|(name, value)| to_sqs_attribute(value).map(|v| (name.clone(), v)))
        .collect::<Result<HashMap<_, _>, QueueError>>()
        .map(Some)
}

fn to_queue_attribute_map(
    attributes: impl IntoIterator<Item = (String, String)>,
) -> HashMap<QueueAttributeName, String> {
    attributes
        .into_iter()
        .map(|(key, value)| (QueueAttributeName::from(key.as_str()), value))
        .collect()
}

fn from_queue_attribute_map(
    attributes: Option<&HashMap<QueueAttributeName, String>>,
) -> HashMap<String, String> {
    attributes
        .map(|attrs| {
            attrs
                .iter()
                .map(|(key, value)| (key.as_str().to_string(), value.clone()))
                .collect()
        })
        .unwrap_or_default()
}

fn epoch_millis(raw: Option<&String>) -> Option<Timestamp> {
    raw.and_then(|s| s.parse::<i64>().ok())
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(Timestamp::from_datetime)
}

/// Convert a received SQS message
pub(crate) fn from_sqs_message(
    message: &aws_sdk_sqs::types::Message,
    expires_at: &Timestamp,
    now: &Timestamp,
) -> Result<ReceivedMessage, QueueError> {
    let message_id = message
        .message_id()
        .ok_or_else(|| missing_field("MessageId"))?;
    let receipt = message
        .receipt_handle()
        .ok_or_else(|| missing_field("ReceiptHandle"))?;

    let system = message.attributes();
    let system_attribute = |name: MessageSystemAttributeName| system.and_then(|a| a.get(&name));

    let receive_count = system_attribute(MessageSystemAttributeName::ApproximateReceiveCount)
        .and_then(|s| s.parse().ok())
        .unwrap_or(1);
    let sent_at = epoch_millis(system_attribute(MessageSystemAttributeName::SentTimestamp))
        .unwrap_or_else(|| now.clone());
    let first_received_at = epoch_millis(system_attribute(
        MessageSystemAttributeName::ApproximateFirstReceiveTimestamp,
    ))
    .unwrap_or_else(|| now.clone());

    let attributes = message
        .message_attributes()
        .map(|attrs| {
            attrs
                .iter()
                .filter_map(|(name, value)| from_sqs_attribute(value).map(|v| (name.clone(), v)))
                .collect()
        })
        .unwrap_or_default();

    Ok(ReceivedMessage {
        message_id: MessageId::from_provider(message_id),
        body: message.body().unwrap_or_default().to_string(),
        attributes,
        receipt_handle: ReceiptHandle::new(receipt.to_string(), expires_at.clone()),
        receive_count,
        sent_at,
        first_received_at,
        group_id: system_attribute(MessageSystemAttributeName::MessageGroupId).cloned(),
        sequence_number: system_attribute(MessageSystemAttributeName::SequenceNumber).cloned(),
    })
}

fn to_batch_entry(entry: &BatchEntry) -> Result<SendMessageBatchRequestEntry, QueueError> {
    let message = &entry.message;
    SendMessageBatchRequestEntry::builder()
        .id(entry.id.as_str())
        .message_body(&message.body)
        .set_message_attributes(to_sqs_attributes(&message.attributes)?)
        .set_delay_seconds(message.delay_seconds.map(seconds))
        .set_message_group_id(message.group_id.clone())
        .set_message_deduplication_id(message.deduplication_id.clone())
        .build()
        .map_err(|e| QueueError::transport(PROVIDER, "InvalidBatchEntry", e.to_string()))
}

/// SQS takes seconds as i32; every accepted value fits
fn seconds(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

// ============================================================================
// SqsProvider
// ============================================================================

/// AWS SQS queue provider implementation
pub struct SqsProvider {
    client: Client,
    config: AwsSqsConfig,
    clock: Arc<dyn Clock>,
}

impl SqsProvider {
    /// Create a provider from configuration
    ///
    /// Resolves the AWS configuration but does not contact SQS.
    pub async fn new(config: AwsSqsConfig, clock: Arc<dyn Clock>) -> Result<Self, QueueError> {
        if config.region.as_deref().is_some_and(str::is_empty) {
            return Err(ConfigurationError::Invalid {
                message: "AWS region must not be empty".to_string(),
            }
            .into());
        }

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(profile) = &config.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        tracing::debug!(
            region = ?config.region,
            endpoint = ?config.endpoint_url,
            "Configured SQS client"
        );

        Ok(Self {
            client: Client::new(&sdk_config),
            config,
            clock,
        })
    }

    async fn fetch_arn(&self, handle: &QueueHandle) -> Result<QueueArn, QueueError> {
        let output = self
            .client
            .get_queue_attributes()
            .queue_url(handle.as_str())
            .attribute_names(QueueAttributeName::QueueArn)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, handle.as_str()))?;

        output
            .attributes()
            .and_then(|attrs| attrs.get(&QueueAttributeName::QueueArn))
            .map(|arn| QueueArn::new(arn.as_str()))
            .ok_or_else(|| missing_field(ATTR_QUEUE_ARN))
    }
}

impl fmt::Debug for SqsProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqsProvider")
            .field("config", &self.config)
            .finish()
    }
}

#[async_trait]
impl QueueTransport for SqsProvider {
    async fn create_queue(
        &self,
        name: &QueueName,
        attributes: &QueueAttributes,
    ) -> Result<QueueLocation, QueueError> {
        let output = self
            .client
            .create_queue()
            .queue_name(name.as_str())
            .set_attributes(Some(to_queue_attribute_map(attributes.to_attribute_map()?)))
            .send()
            .await
            .map_err(|e| map_sdk_error(e, name.as_str()))?;

        let handle = QueueHandle::new(output.queue_url().ok_or_else(|| missing_field("QueueUrl"))?);
        let arn = self.fetch_arn(&handle).await?;
        Ok(QueueLocation { handle, arn })
    }

    async fn lookup_queue(&self, name: &QueueName) -> Result<QueueLocation, QueueError> {
        let output = self
            .client
            .get_queue_url()
            .queue_name(name.as_str())
            .send()
            .await
            .map_err(|e| map_sdk_error(e, name.as_str()))?;

        let handle = QueueHandle::new(output.queue_url().ok_or_else(|| missing_field("QueueUrl"))?);
        let arn = self.fetch_arn(&handle).await?;
        Ok(QueueLocation { handle, arn })
    }

    async fn queue_arn(&self, handle: &QueueHandle) -> Result<QueueArn, QueueError> {
        self.fetch_arn(handle).await
    }

    async fn get_queue_attributes(
        &self,
        handle: &QueueHandle,
    ) -> Result<HashMap<String, String>, QueueError> {
        let output = self
            .client
            .get_queue_attributes()
            .queue_url(handle.as_str())
            .attribute_names(QueueAttributeName::All)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, handle.as_str()))?;

        Ok(from_queue_attribute_map(output.attributes()))
    }

    async fn set_queue_attributes(
        &self,
        handle: &QueueHandle,
        attributes: &HashMap<String, String>,
    ) -> Result<(), QueueError> {
        self.client
            .set_queue_attributes()
            .queue_url(handle.as_str())
            .set_attributes(Some(to_queue_attribute_map(attributes.clone())))
            .send()
            .await
            .map_err(|e| map_sdk_error(e, handle.as_str()))?;
        Ok(())
    }

    async fn delete_queue(&self, handle: &QueueHandle) -> Result<(), QueueError> {
        self.client
            .delete_queue()
            .queue_url(handle.as_str())
            .send()
            .await
            .map_err(|e| map_sdk_error(e, handle.as_str()))?;
        Ok(())
    }

    async fn send_message(
        &self,
        handle: &QueueHandle,
        message: &Message,
    ) -> Result<MessageId, QueueError> {
        let output = self
            .client
            .send_message()
            .queue_url(handle.as_str())
            .message_body(&message.body)
            .set_message_attributes(to_sqs_attributes(&message.attributes)?)
            .set_delay_seconds(message.delay_seconds.map(seconds))
            .set_message_group_id(message.group_id.clone())
            .set_message_deduplication_id(message.deduplication_id.clone())
            .send()
            .await
            .map_err(|e| map_sdk_error(e, handle.as_str()))?;

        output
            .message_id()
            .map(MessageId::from_provider)
            .ok_or_else(|| missing_field("MessageId"))
    }

    async fn send_message_batch(
        &self,
        handle: &QueueHandle,
        entries: &[BatchEntry],
    ) -> Result<BatchSendOutcome, QueueError> {
        let request_entries = entries
            .iter()
            .map(to_batch_entry)
            .collect::<Result<Vec<_>, _>>()?;

        let output = self
            .client
            .send_message_batch()
            .queue_url(handle.as_str())
            .set_entries(Some(request_entries))
            .send()
            .await
            .map_err(|e| map_sdk_error(e, handle.as_str()))?;

        let successful = output
            .successful()
            .iter()
            .map(|entry| -> Result<BatchSuccess, QueueError> {
                Ok(BatchSuccess {
                    id: BatchEntryId::new(entry.id().to_string())?,
                    message_id: MessageId::from_provider(entry.message_id()),
                })
            })
            .collect::<Result<Vec<_>, QueueError>>()?;

        let failed = output
            .failed()
            .iter()
            .map(|entry| -> Result<BatchFailure, QueueError> {
                Ok(BatchFailure {
                    id: BatchEntryId::new(entry.id().to_string())?,
                    code: entry.code().to_string(),
                    message: entry.message().unwrap_or_default().to_string(),
                    sender_fault: entry.sender_fault(),
                })
            })
            .collect::<Result<Vec<_>, QueueError>>()?;

        Ok(BatchSendOutcome { successful, failed })
    }

    async fn receive_messages(
        &self,
        handle: &QueueHandle,
        request: &ReceiveRequest,
    ) -> Result<Vec<ReceivedMessage>, QueueError> {
        let visibility = request
            .visibility_timeout_seconds
            .unwrap_or(DEFAULT_VISIBILITY_TIMEOUT_SECONDS);

        let output = self
            .client
            .receive_message()
            .queue_url(handle.as_str())
            .max_number_of_messages(seconds(request.max_messages))
            .set_visibility_timeout(request.visibility_timeout_seconds.map(seconds))
            .set_wait_time_seconds(request.wait_time_seconds.map(seconds))
            .message_attribute_names("All")
            .message_system_attribute_names(MessageSystemAttributeName::All)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, handle.as_str()))?;

        let now = self.clock.now();
        let expires_at = now.plus_seconds(visibility);
        output
            .messages()
            .iter()
            .map(|message| from_sqs_message(message, &expires_at, &now))
            .collect()
    }

    async fn delete_message(
        &self,
        handle: &QueueHandle,
        receipt: &ReceiptHandle,
    ) -> Result<(), QueueError> {
        self.client
            .delete_message()
            .queue_url(handle.as_str())
            .receipt_handle(receipt.handle())
            .send()
            .await
            .map_err(|e| map_sdk_error(e, receipt.handle()))?;
        Ok(())
    }

    async fn change_visibility(
        &self,
        handle: &QueueHandle,
        receipt: &ReceiptHandle,
        timeout_seconds: u32,
    ) -> Result<(), QueueError> {
        self.client
            .change_message_visibility()
            .queue_url(handle.as_str())
            .receipt_handle(receipt.handle())
            .visibility_timeout(seconds(timeout_seconds))
            .send()
            .await
            .map_err(|e| map_sdk_error(e, receipt.handle()))?;
        Ok(())
    }

    async fn purge_queue(&self, handle: &QueueHandle) -> Result<(), QueueError> {
        self.client
            .purge_queue()
            .queue_url(handle.as_str())
            .send()
            .await
            .map_err(|e| map_sdk_error(e, handle.as_str()))?;
        Ok(())
    }

    fn provider_type(&self) -> ProviderType {
        ProviderType::AwsSqs
    }
}

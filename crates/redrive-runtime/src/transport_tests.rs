//! Tests for the transport factory.

use super::*;
use crate::clock::SystemClock;
use crate::provider::{AwsSqsConfig, InMemoryConfig};

#[tokio::test]
async fn test_factory_creates_in_memory_transport() {
    let config = ProviderConfig::InMemory(InMemoryConfig::default());
    let transport = TransportFactory::create(&config, Arc::new(SystemClock))
        .await
        .expect("in-memory transport should build");

    assert_eq!(transport.provider_type(), ProviderType::InMemory);
}

#[tokio::test]
async fn test_factory_creates_sqs_transport_without_network() {
    let config = ProviderConfig::AwsSqs(AwsSqsConfig {
        region: Some("us-east-1".to_string()),
        endpoint_url: Some("http://localhost:4566".to_string()),
        profile: None,
    });

    let transport = TransportFactory::create(&config, Arc::new(SystemClock))
        .await
        .expect("SQS transport should build without contacting the backend");

    assert_eq!(transport.provider_type(), ProviderType::AwsSqs);
}

#[tokio::test]
async fn test_test_transport_round_trip() {
    let transport = TransportFactory::create_test_transport();
    let name: QueueName = "factory-queue".parse().unwrap();

    let location = transport
        .create_queue(&name, &QueueAttributes::default())
        .await
        .unwrap();
    let looked_up = transport.lookup_queue(&name).await.unwrap();

    assert_eq!(location, looked_up);
    assert_eq!(transport.queue_arn(&location.handle).await.unwrap(), location.arn);
}

//! Tests for error types.

use super::*;

#[test]
fn test_error_transience() {
    assert!(QueueError::PurgeRateLimited {
        queue_name: "test".to_string(),
    }
    .is_transient());

    assert!(!QueueError::QueueNotFound {
        queue_name: "test".to_string(),
    }
    .is_transient());

    assert!(QueueError::transport("AwsSqs", "ServiceUnavailable", "try later").is_transient());

    assert!(!QueueError::ReceiptExpired {
        receipt: "r-1".to_string(),
    }
    .is_transient());

    assert!(!QueueError::MessageTooLarge {
        size: 1000,
        max_size: 500
    }
    .is_transient());
}

#[test]
fn test_retry_suggestions() {
    let purge = QueueError::PurgeRateLimited {
        queue_name: "test".to_string(),
    };
    assert_eq!(purge.retry_after(), Some(Duration::seconds(60)));

    let deleted = QueueError::RecentlyDeleted {
        queue_name: "test".to_string(),
    };
    assert_eq!(deleted.retry_after(), Some(Duration::seconds(60)));

    let not_found = QueueError::QueueNotFound {
        queue_name: "test".to_string(),
    };
    assert_eq!(not_found.retry_after(), None);
}

#[test]
fn test_receipt_expired_is_distinct_from_not_found() {
    let expired = QueueError::ReceiptExpired {
        receipt: "abc".to_string(),
    };
    let missing = QueueError::MessageNotFound {
        receipt: "abc".to_string(),
    };

    assert_ne!(expired.to_string(), missing.to_string());
    assert!(matches!(expired, QueueError::ReceiptExpired { .. }));
    assert!(matches!(missing, QueueError::MessageNotFound { .. }));
}

#[test]
fn test_transport_error_carries_backend_code() {
    let error = QueueError::transport("InMemory", "QueueAlreadyExists", "attributes differ");
    match error {
        QueueError::TransportError {
            provider,
            code,
            message,
        } => {
            assert_eq!(provider, "InMemory");
            assert_eq!(code, "QueueAlreadyExists");
            assert_eq!(message, "attributes differ");
        }
        other => panic!("Expected TransportError, got: {:?}", other),
    }
}

#[test]
fn test_validation_error_converts_into_queue_error() {
    let error: QueueError = ValidationError::Required {
        field: "body".to_string(),
    }
    .into();

    assert!(matches!(error, QueueError::ValidationError(_)));
    assert!(!error.is_transient());
}

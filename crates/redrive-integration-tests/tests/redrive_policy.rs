//! Integration tests for dead-letter redrive
//!
//! These tests verify:
//! - Redrive policies attach only to resolved targets with a positive threshold
//! - Dependent queues can only be created after their dead-letter queue
//! - Messages failing `maxReceiveCount` times leave the source queue for the dead-letter queue

mod common;

use common::{name, AlwaysFails, Harness, RecordingHandler};
use redrive_runtime::{
    FailurePolicy, LifecycleConfig, Message, MessageOutcome, QueueAttributes, QueueError,
};

/// Verify that attaching fails exactly when the target is unresolved or the threshold is below one
#[tokio::test]
async fn test_attach_fails_iff_target_unresolved_or_threshold_below_one() {
    for target_registered in [true, false] {
        for max_receive_count in [0, 1, 3, 1000] {
            let h = Harness::new();
            h.queue("main").await;
            if target_registered {
                h.queue("dead").await;
            }

            let result = h
                .orchestrator
                .attach_redrive_policy(&name("main"), &name("dead"), max_receive_count)
                .await;

            let should_fail = !target_registered || max_receive_count < 1;
            assert_eq!(
                result.is_err(),
                should_fail,
                "target registered: {}, max receive count: {}",
                target_registered,
                max_receive_count
            );

            let record = h.orchestrator.record(&name("main")).await.unwrap();
            assert_eq!(record.redrive_policy.is_some(), !should_fail);
        }
    }
}

/// Verify that a dependent queue cannot be created before its dead-letter queue
#[tokio::test]
async fn test_dependent_queue_requires_dead_letter_queue_first() {
    let h = Harness::new();

    let too_early = h
        .orchestrator
        .create_queue_with_dead_letter(name("main"), QueueAttributes::default(), &name("dead"), 3)
        .await;
    assert!(matches!(too_early, Err(QueueError::QueueNotFound { .. })));
    assert!(h.orchestrator.registry().await.is_empty());

    h.redriven_pair("main", "dead", 3).await;

    let main = h.orchestrator.record(&name("main")).await.unwrap();
    let dead = h.orchestrator.record(&name("dead")).await.unwrap();
    assert_eq!(main.redrive_policy.unwrap().dead_letter_target_arn, dead.arn);
}

/// Verify that a deleted dead-letter queue can no longer be targeted
#[tokio::test]
async fn test_unregistered_target_cannot_be_attached() {
    let h = Harness::new();
    h.queue("main").await;
    h.queue("dead").await;

    h.orchestrator.delete_queue(&name("dead")).await.unwrap();
    let result = h
        .orchestrator
        .attach_redrive_policy(&name("main"), &name("dead"), 3)
        .await;

    assert!(matches!(result, Err(QueueError::QueueNotFound { .. })));
}

/// Verify the three-strikes scenario: a message failing three times moves to the dead-letter queue
#[tokio::test]
async fn test_message_failing_max_receive_count_times_is_dead_lettered() {
    let h = Harness::new();
    h.redriven_pair("main", "dead", 3).await;
    let sent = h
        .orchestrator
        .send_single(&name("main"), &Message::new("M"))
        .await
        .unwrap();

    for attempt in 1..=3u32 {
        let report = h
            .orchestrator
            .drain_once(&name("main"), 10, &AlwaysFails)
            .await
            .unwrap();

        assert_eq!(report.received, 1, "attempt {}", attempt);
        assert_eq!(report.messages[0].message_id, sent);
        assert_eq!(report.messages[0].receive_count, attempt);
        assert_eq!(report.deleted(), 0);
        h.expire_leases();
    }

    let fourth = h
        .orchestrator
        .drain_once(&name("main"), 10, &AlwaysFails)
        .await
        .unwrap();
    assert!(fourth.is_empty(), "M must no longer be returned by main");

    let handler = RecordingHandler::new();
    let dead = h
        .orchestrator
        .drain_once(&name("dead"), 10, &handler)
        .await
        .unwrap();
    assert_eq!(dead.deleted(), 1);
    assert_eq!(handler.bodies(), vec!["M".to_string()]);
    assert_eq!(handler.deliveries()[0].message_id, sent);
}

/// Verify that releasing failures immediately reaches the dead-letter queue without waiting out leases
#[tokio::test]
async fn test_release_immediately_dead_letters_without_waiting() {
    let h = Harness::with_config(LifecycleConfig {
        failure_policy: FailurePolicy::ReleaseImmediately,
        ..LifecycleConfig::default()
    });
    h.redriven_pair("main", "dead", 3).await;
    h.orchestrator
        .send_single(&name("main"), &Message::new("M"))
        .await
        .unwrap();

    for _ in 0..3 {
        let report = h
            .orchestrator
            .drain_once(&name("main"), 10, &AlwaysFails)
            .await
            .unwrap();
        assert!(matches!(
            report.messages[0].outcome,
            MessageOutcome::Released { .. }
        ));
    }

    assert!(h.orchestrator.receive(&name("main"), 10).await.unwrap().is_empty());
    let dead = h.orchestrator.receive(&name("dead"), 10).await.unwrap();
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].body, "M");
}

/// Verify that only failing messages are dead-lettered while their neighbours are processed
#[tokio::test]
async fn test_only_poison_messages_are_dead_lettered() {
    let h = Harness::new();
    h.redriven_pair("main", "dead", 2).await;
    for body in ["good-1", "poison", "good-2"] {
        h.orchestrator
            .send_single(&name("main"), &Message::new(body))
            .await
            .unwrap();
    }
    let handler = RecordingHandler::failing_on(&["poison"]);

    let first = h
        .orchestrator
        .drain_once(&name("main"), 10, &handler)
        .await
        .unwrap();
    assert_eq!(first.deleted(), 2);
    assert_eq!(first.failed(), 1);

    h.expire_leases();
    let second = h
        .orchestrator
        .drain_once(&name("main"), 10, &handler)
        .await
        .unwrap();
    assert_eq!(second.received, 1);
    assert_eq!(second.messages[0].receive_count, 2);

    h.expire_leases();
    assert!(h.orchestrator.receive(&name("main"), 10).await.unwrap().is_empty());
    let dead = h.orchestrator.receive(&name("dead"), 10).await.unwrap();
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].body, "poison");
}

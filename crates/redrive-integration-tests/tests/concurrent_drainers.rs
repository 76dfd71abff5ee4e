//! Integration tests for concurrent consumers of one queue
//!
//! These tests verify:
//! - In-flight messages are invisible to every other drainer
//! - Failed messages are not redelivered before their lease ends

mod common;

use common::{name, AlwaysFails, Harness, RecordingHandler};
use redrive_runtime::{BatchEntry, Message, MessageHandler, QueueOrchestrator};
use std::sync::Arc;

const DRAINERS: usize = 4;
const MESSAGES: usize = 30;

async fn fill(h: &Harness, queue: &str, count: usize) {
    let entries: Vec<BatchEntry> = (0..count)
        .map(|i| BatchEntry::generated(Message::new(format!("message {}", i))))
        .collect();
    for chunk in entries.chunks(10) {
        let outcome = h
            .orchestrator
            .send_batch(&name(queue), chunk)
            .await
            .unwrap();
        assert!(outcome.is_complete_success());
    }
}

/// Run drainers until each sees an empty receive, returning how many messages each handled
async fn drain_concurrently<H>(
    orchestrator: Arc<QueueOrchestrator>,
    handler: Arc<H>,
    queue: &str,
) -> Vec<usize>
where
    H: MessageHandler + 'static,
{
    let tasks: Vec<_> = (0..DRAINERS)
        .map(|_| {
            let orchestrator = orchestrator.clone();
            let handler = handler.clone();
            let queue = name(queue);
            tokio::spawn(async move {
                let mut handled = 0;
                loop {
                    let report = orchestrator
                        .drain_once(&queue, 3, handler.as_ref())
                        .await
                        .unwrap();
                    if report.is_empty() {
                        return handled;
                    }
                    handled += report.received;
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    let mut counts = Vec::with_capacity(tasks.len());
    for task in tasks {
        counts.push(task.await.unwrap());
    }
    counts
}

/// Verify that concurrent drainers deliver every message exactly once while time stands still
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_each_message_is_delivered_once_across_drainers() {
    let h = Harness::new();
    h.queue("orders").await;
    fill(&h, "orders", MESSAGES).await;
    let handler = Arc::new(RecordingHandler::new());

    let counts = drain_concurrently(h.orchestrator.clone(), handler.clone(), "orders").await;

    assert_eq!(counts.iter().sum::<usize>(), MESSAGES);
    let deliveries = handler.delivery_counts();
    assert_eq!(deliveries.len(), MESSAGES);
    assert!(deliveries.values().all(|count| *count == 1));
    assert!(h.orchestrator.receive(&name("orders"), 10).await.unwrap().is_empty());
}

/// Verify that failed messages stay hidden from all drainers until their lease ends
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failed_messages_wait_for_lease_expiry() {
    let h = Harness::new();
    h.queue("orders").await;
    fill(&h, "orders", MESSAGES).await;
    let failing = Arc::new(AlwaysFails);

    let first = drain_concurrently(h.orchestrator.clone(), failing.clone(), "orders").await;
    assert_eq!(first.iter().sum::<usize>(), MESSAGES);

    let again = drain_concurrently(h.orchestrator.clone(), failing.clone(), "orders").await;
    assert_eq!(again.iter().sum::<usize>(), 0);

    h.expire_leases();
    let handler = Arc::new(RecordingHandler::new());
    let after_expiry = drain_concurrently(h.orchestrator.clone(), handler.clone(), "orders").await;

    assert_eq!(after_expiry.iter().sum::<usize>(), MESSAGES);
    assert!(handler
        .deliveries()
        .iter()
        .all(|message| message.receive_count == 2));
}

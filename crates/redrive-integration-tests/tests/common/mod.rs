//! Common test utilities for redrive integration tests
//!
//! This module provides:
//! - A harness wiring the orchestrator to the in-memory backend and a manual clock
//! - Scriptable message handlers
//! - Queue fixtures

#![allow(dead_code)]

use async_trait::async_trait;
use redrive_runtime::{
    Clock, HandlerError, InMemoryConfig, InMemoryProvider, LifecycleConfig, ManualClock,
    MessageHandler, MessageId, QueueAttributes, QueueName, QueueOrchestrator, QueueRecord,
    ReceivedMessage,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Orchestrator over a fresh in-memory backend whose time only moves when told to
pub struct Harness {
    pub orchestrator: Arc<QueueOrchestrator>,
    pub transport: Arc<InMemoryProvider>,
    pub clock: ManualClock,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(LifecycleConfig::default())
    }

    pub fn with_config(config: LifecycleConfig) -> Self {
        let clock = ManualClock::starting_now();
        let shared_clock: Arc<dyn Clock> = Arc::new(clock.clone());
        let transport = Arc::new(InMemoryProvider::with_clock(
            InMemoryConfig::default(),
            shared_clock.clone(),
        ));
        let orchestrator = Arc::new(QueueOrchestrator::new(
            transport.clone(),
            config,
            shared_clock,
        ));

        Self {
            orchestrator,
            transport,
            clock,
        }
    }

    /// Create a queue with default attributes
    pub async fn queue(&self, raw: &str) -> QueueRecord {
        self.orchestrator
            .create_queue(name(raw), QueueAttributes::default())
            .await
            .expect("queue creation should succeed")
    }

    /// Create `main` redriven to `dead` after `max_receive_count` receives
    pub async fn redriven_pair(&self, main: &str, dead: &str, max_receive_count: u32) {
        self.queue(dead).await;
        self.orchestrator
            .create_queue_with_dead_letter(
                name(main),
                QueueAttributes::default(),
                &name(dead),
                max_receive_count,
            )
            .await
            .expect("redriven queue creation should succeed");
    }

    /// Let every current lease expire
    pub fn expire_leases(&self) {
        self.clock.advance_seconds(31);
    }
}

pub fn name(raw: &str) -> QueueName {
    raw.parse().expect("test queue names are valid")
}

/// Handler failing every delivery
pub struct AlwaysFails;

#[async_trait]
impl MessageHandler for AlwaysFails {
    async fn handle(&self, _message: &ReceivedMessage) -> Result<(), HandlerError> {
        Err(HandlerError::new("processing failed"))
    }
}

/// Handler recording every delivery it sees, failing those whose body is listed
#[derive(Default)]
pub struct RecordingHandler {
    fail_bodies: Vec<String>,
    deliveries: Mutex<Vec<ReceivedMessage>>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(bodies: &[&str]) -> Self {
        Self {
            fail_bodies: bodies.iter().map(|b| b.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn deliveries(&self) -> Vec<ReceivedMessage> {
        self.deliveries.lock().unwrap().clone()
    }

    pub fn bodies(&self) -> Vec<String> {
        self.deliveries().into_iter().map(|m| m.body).collect()
    }

    /// Number of deliveries per message ID
    pub fn delivery_counts(&self) -> HashMap<MessageId, usize> {
        let mut counts = HashMap::new();
        for delivery in self.deliveries() {
            *counts.entry(delivery.message_id).or_insert(0) += 1;
        }
        counts
    }
}

#[async_trait]
impl MessageHandler for RecordingHandler {
    async fn handle(&self, message: &ReceivedMessage) -> Result<(), HandlerError> {
        self.deliveries.lock().unwrap().push(message.clone());
        if self.fail_bodies.contains(&message.body) {
            return Err(HandlerError::new(format!("rejected '{}'", message.body)));
        }
        Ok(())
    }
}

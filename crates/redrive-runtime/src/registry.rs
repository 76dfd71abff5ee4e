//! Queue registry: logical name to handle, ARN and redrive policy.
//!
//! The registry is a local cache, not the authority on what exists
//! remotely. It performs no I/O; ARNs are resolved by the transport and
//! handed in at registration time. Its one job beyond bookkeeping is to
//! make the dead-letter ordering explicit: a redrive policy can only be
//! built once its target queue has been registered.

use crate::attributes::{QueueAttributes, RedrivePolicy};
use crate::error::QueueError;
use crate::message::{QueueArn, QueueHandle, QueueName};
use serde::Serialize;
use std::collections::BTreeMap;

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;

/// A known queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueRecord {
    pub name: QueueName,
    pub handle: QueueHandle,
    pub arn: QueueArn,
    /// Attributes the queue was created with, when known
    pub attributes: Option<QueueAttributes>,
    pub redrive_policy: Option<RedrivePolicy>,
}

impl QueueRecord {
    /// Maximum message size, when the queue's attributes are known
    pub fn max_message_size(&self) -> Option<usize> {
        self.attributes
            .as_ref()
            .map(|a| a.max_message_size_bytes as usize)
    }

    /// Visibility timeout, when the queue's attributes are known
    pub fn visibility_timeout_seconds(&self) -> Option<u32> {
        self.attributes.as_ref().map(|a| a.visibility_timeout_seconds)
    }
}

/// In-memory map of known queues
#[derive(Debug, Default, Clone)]
pub struct QueueRegistry {
    queues: BTreeMap<QueueName, QueueRecord>,
}

impl QueueRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a queue
    ///
    /// Registering the same name with the same handle again is a no-op that
    /// returns the existing record. A different handle is a conflict.
    pub fn register(
        &mut self,
        name: QueueName,
        handle: QueueHandle,
        arn: QueueArn,
    ) -> Result<&QueueRecord, QueueError> {
        self.register_with_attributes(name, handle, arn, None)
    }

    /// Register a queue together with the attributes it was created with
    pub fn register_with_attributes(
        &mut self,
        name: QueueName,
        handle: QueueHandle,
        arn: QueueArn,
        attributes: Option<QueueAttributes>,
    ) -> Result<&QueueRecord, QueueError> {
        if let Some(existing) = self.queues.get(&name) {
            if existing.handle != handle {
                return Err(QueueError::DuplicateQueue {
                    queue_name: name.to_string(),
                    existing_handle: existing.handle.to_string(),
                });
            }
        }

        let redrive_policy = attributes.as_ref().and_then(|a| a.redrive_policy.clone());
        let record = self.queues.entry(name.clone()).or_insert(QueueRecord {
            name,
            handle,
            arn,
            attributes: None,
            redrive_policy: None,
        });

        // Re-registration may fill in what an earlier adoption did not know.
        if attributes.is_some() {
            record.attributes = attributes;
            record.redrive_policy = redrive_policy;
        }

        Ok(record)
    }

    /// Resolve a queue's ARN
    pub fn resolve_arn(&self, name: &QueueName) -> Result<&QueueArn, QueueError> {
        self.get(name).map(|record| &record.arn)
    }

    /// Resolve a queue's handle
    pub fn handle(&self, name: &QueueName) -> Result<&QueueHandle, QueueError> {
        self.get(name).map(|record| &record.handle)
    }

    /// Get a queue's record
    pub fn get(&self, name: &QueueName) -> Result<&QueueRecord, QueueError> {
        self.queues.get(name).ok_or_else(|| QueueError::QueueNotFound {
            queue_name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &QueueName) -> bool {
        self.queues.contains_key(name)
    }

    /// Current redrive policy of a queue, if any
    pub fn redrive_policy(&self, name: &QueueName) -> Result<Option<&RedrivePolicy>, QueueError> {
        self.get(name).map(|record| record.redrive_policy.as_ref())
    }

    /// Build a policy routing to `target` without attaching it anywhere
    pub fn redrive_policy_for(
        &self,
        target: &QueueName,
        max_receive_count: u32,
    ) -> Result<RedrivePolicy, QueueError> {
        if max_receive_count < 1 {
            return Err(QueueError::InvalidPolicy {
                message: format!(
                    "maxReceiveCount must be at least 1, got {}",
                    max_receive_count
                ),
            });
        }

        let arn = self.resolve_arn(target)?.clone();
        RedrivePolicy::new(arn, max_receive_count)
    }

    /// Attach a redrive policy to `name`, routing to `target`
    ///
    /// Nothing is mutated unless every check passes.
    pub fn attach_redrive_policy(
        &mut self,
        name: &QueueName,
        target: &QueueName,
        max_receive_count: u32,
    ) -> Result<&RedrivePolicy, QueueError> {
        let policy = self.redrive_policy_for(target, max_receive_count)?;

        let record = self
            .queues
            .get_mut(name)
            .ok_or_else(|| QueueError::QueueNotFound {
                queue_name: name.to_string(),
            })?;

        if let Some(attributes) = record.attributes.as_mut() {
            attributes.redrive_policy = Some(policy.clone());
        }
        Ok(record.redrive_policy.insert(policy))
    }

    /// Find the queue owning an ARN
    pub fn find_by_arn(&self, arn: &QueueArn) -> Option<&QueueRecord> {
        self.queues.values().find(|record| &record.arn == arn)
    }

    /// Queues whose redrive policy routes to `target`
    pub fn dead_letter_sources(&self, target: &QueueName) -> Vec<&QueueName> {
        let Some(target_arn) = self.queues.get(target).map(|r| &r.arn) else {
            return Vec::new();
        };

        self.queues
            .values()
            .filter(|record| {
                record
                    .redrive_policy
                    .as_ref()
                    .is_some_and(|p| &p.dead_letter_target_arn == target_arn)
            })
            .map(|record| &record.name)
            .collect()
    }

    /// Forget a queue; says nothing about whether the backend deleted it
    pub fn unregister(&mut self, name: &QueueName) -> Option<QueueRecord> {
        self.queues.remove(name)
    }

    /// Registered names, in order
    pub fn names(&self) -> impl Iterator<Item = &QueueName> {
        self.queues.keys()
    }

    /// Registered records, in name order
    pub fn records(&self) -> impl Iterator<Item = &QueueRecord> {
        self.queues.values()
    }

    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}

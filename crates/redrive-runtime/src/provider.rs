//! Provider types and configuration.

use serde::{Deserialize, Serialize};

/// Enumeration of supported queue providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderType {
    AwsSqs,
    InMemory,
}

impl ProviderType {
    /// Name used in logs and transport errors
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwsSqs => "AwsSqs",
            Self::InMemory => "InMemory",
        }
    }

    /// Get maximum number of entries accepted in one batch
    pub fn max_batch_size(&self) -> u32 {
        match self {
            Self::AwsSqs => 10,
            Self::InMemory => 10,
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider-specific configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    AwsSqs(AwsSqsConfig),
    InMemory(InMemoryConfig),
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::InMemory(InMemoryConfig::default())
    }
}

impl ProviderConfig {
    pub fn provider_type(&self) -> ProviderType {
        match self {
            Self::AwsSqs(_) => ProviderType::AwsSqs,
            Self::InMemory(_) => ProviderType::InMemory,
        }
    }
}

/// AWS SQS configuration
///
/// Credentials come from the standard AWS provider chain (environment,
/// profile, instance metadata); only routing is configured here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsSqsConfig {
    /// Region override; the provider chain decides when absent
    pub region: Option<String>,
    /// Endpoint override, e.g. a LocalStack URL
    pub endpoint_url: Option<String>,
    /// Named profile from the shared AWS config files
    pub profile: Option<String>,
}

/// In-memory provider configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InMemoryConfig {
    /// Region used when minting queue ARNs and handles
    pub region: String,
    /// Account used when minting queue ARNs and handles
    pub account_id: String,
    /// Seconds before a deleted queue's name may be reused
    pub queue_recreation_cooldown_seconds: u32,
    /// Seconds between two purges of the same queue
    pub purge_cooldown_seconds: u32,
    /// Seconds a FIFO deduplication ID suppresses repeats
    pub deduplication_window_seconds: u32,
}

impl Default for InMemoryConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            account_id: "000000000000".to_string(),
            queue_recreation_cooldown_seconds: 60,
            purge_cooldown_seconds: 60,
            deduplication_window_seconds: 300,
        }
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;

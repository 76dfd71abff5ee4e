//! Layered configuration.
//!
//! Sources, later overriding earlier:
//!  1. serde defaults on every field
//!  2. `/etc/redrive/redrive.yaml`
//!  3. `./config/redrive.yaml`
//!  4. the file given by `--config` / `REDRIVE_CONFIG` (required when given)
//!  5. environment variables prefixed `REDRIVE__`, e.g.
//!     `REDRIVE__LIFECYCLE__FAILURE_POLICY=release_immediately`
//!
//! Missing optional files are skipped. A malformed file or a value that cannot
//! be coerced to its field type is an error.

use redrive_runtime::{
    AwsSqsConfig, InMemoryConfig, LifecycleConfig, ProviderConfig, ProviderType, ValidationError,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

const SYSTEM_CONFIG: &str = "/etc/redrive/redrive";
const LOCAL_CONFIG: &str = "config/redrive";
const ENV_PREFIX: &str = "REDRIVE";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    #[error("Failed to initialize logging: {message}")]
    Logging { message: String },
}

/// Resolved CLI configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedriveConfig {
    pub provider: ProviderConfig,
    pub lifecycle: LifecycleConfig,
    pub logging: LoggingConfig,
}

impl RedriveConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.lifecycle.validate()?;
        Ok(())
    }

    /// Switch backends, keeping the configured settings when the type already matches
    pub fn override_provider(&mut self, provider: ProviderType) {
        if self.provider.provider_type() == provider {
            return;
        }

        self.provider = match provider {
            ProviderType::AwsSqs => ProviderConfig::AwsSqs(AwsSqsConfig::default()),
            ProviderType::InMemory => ProviderConfig::InMemory(InMemoryConfig::default()),
        };
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Load configuration from every source
pub fn load_configuration(explicit: Option<&Path>) -> Result<RedriveConfig, ConfigError> {
    let mut builder = config::Config::builder()
        .add_source(
            config::File::with_name(SYSTEM_CONFIG)
                .required(false)
                .format(config::FileFormat::Yaml),
        )
        .add_source(
            config::File::with_name(LOCAL_CONFIG)
                .required(false)
                .format(config::FileFormat::Yaml),
        );

    if let Some(path) = explicit {
        // Format follows the file extension
        builder = builder.add_source(config::File::from(path).required(true));
        tracing::debug!(path = %path.display(), "Loading configuration from explicit path");
    }

    let config: RedriveConfig = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()?;

    config.validate()?;
    Ok(config)
}

//! # Redrive CLI
//!
//! Command-line driver for the redrive queue orchestrator.
//!
//! This module provides CLI commands for:
//! - Walking through the whole queue lifecycle (`demo`)
//! - Creating, deleting and purging queues, with dead-letter redrive
//! - Sending, draining and extending the visibility of messages
//! - Showing the resolved configuration
//!
//! Every response is written to stdout as one JSON line; logs go to stderr.

pub mod commands;
pub mod config;

use crate::config::{load_configuration, ConfigError, LogFormat, LoggingConfig, RedriveConfig};
use clap::{CommandFactory, Parser, Subcommand};
use redrive_runtime::{
    Clock, ProviderType, QueueError, QueueName, QueueOrchestrator, QueueTransport, SystemClock,
    TransportFactory,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

// ============================================================================
// CLI Structure
// ============================================================================

/// Redrive CLI - queue lifecycle orchestration with dead-letter redrive
#[derive(Parser, Debug)]
#[command(name = "redrive")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Queue lifecycle orchestration with dead-letter redrive")]
#[command(
    long_about = "Redrive creates queues, routes repeatedly failing messages to dead-letter queues, and drains messages with at-least-once delivery"
)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "REDRIVE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Logging level, overriding the configured one
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Queue backend, overriding the configured one
    #[arg(short, long, value_enum, global = true)]
    pub provider: Option<ProviderChoice>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create queues, send messages, drain once, then delete everything created
    Demo {
        /// Purge the standard queue after draining it
        #[arg(long)]
        purge: bool,

        /// Leave the created queues in place
        #[arg(long)]
        keep_queues: bool,
    },

    /// Create a queue
    Create {
        #[arg(value_parser = parse_queue_name)]
        name: QueueName,

        /// Create a FIFO queue; the name must end in .fifo
        #[arg(long)]
        fifo: bool,

        /// Deduplicate FIFO messages by body digest
        #[arg(long)]
        content_based_deduplication: bool,

        /// Visibility timeout in seconds
        #[arg(long)]
        visibility_timeout: Option<u32>,

        /// Queue receiving messages that keep failing
        #[arg(long, value_parser = parse_queue_name)]
        dead_letter: Option<QueueName>,

        /// Receives before a message is moved to the dead-letter queue
        #[arg(long, default_value_t = 3)]
        max_receive_count: u32,
    },

    /// Send one message
    Send {
        #[arg(value_parser = parse_queue_name)]
        queue: QueueName,

        body: String,

        /// String attribute as key=value; repeatable
        #[arg(short, long = "attribute", value_parser = parse_attribute)]
        attributes: Vec<(String, String)>,

        /// Delay before the message becomes visible, in seconds
        #[arg(long)]
        delay: Option<u32>,

        /// Message group (FIFO queues)
        #[arg(long)]
        group_id: Option<String>,

        /// Deduplication ID (FIFO queues)
        #[arg(long)]
        deduplication_id: Option<String>,
    },

    /// Receive once, print each message and acknowledge it
    Drain {
        #[arg(value_parser = parse_queue_name)]
        queue: QueueName,

        /// Maximum number of messages (1-10)
        #[arg(short, long, default_value_t = 10)]
        max: u32,
    },

    /// Replace the visibility timeout of a received message
    Extend {
        #[arg(value_parser = parse_queue_name)]
        queue: QueueName,

        /// Receipt handle from a previous receive
        receipt: String,

        /// New timeout, counted from now (0 releases the message)
        seconds: u32,
    },

    /// Remove every message from a queue
    Purge {
        #[arg(value_parser = parse_queue_name)]
        queue: QueueName,
    },

    /// Delete one or more queues
    Delete {
        #[arg(required = true, value_parser = parse_queue_name)]
        queues: Vec<QueueName>,
    },

    /// Print a queue's ARN and handle
    Arn {
        #[arg(value_parser = parse_queue_name)]
        queue: QueueName,
    },

    /// Show the resolved configuration
    Config {
        /// Output format for configuration
        #[arg(short = 'f', long, value_enum, default_value = "yaml")]
        format: ConfigFormat,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Backend selectable on the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ProviderChoice {
    /// In-memory fake; state lasts for one invocation
    Memory,
    /// AWS SQS
    Sqs,
}

impl From<ProviderChoice> for ProviderType {
    fn from(choice: ProviderChoice) -> Self {
        match choice {
            ProviderChoice::Memory => ProviderType::InMemory,
            ProviderChoice::Sqs => ProviderType::AwsSqs,
        }
    }
}

/// Configuration format options
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ConfigFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
    /// TOML format
    Toml,
}

fn parse_queue_name(raw: &str) -> Result<QueueName, String> {
    raw.parse::<QueueName>().map_err(|e| e.to_string())
}

fn parse_attribute(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", raw)),
    }
}

// ============================================================================
// CLI Error Types
// ============================================================================

/// CLI-specific errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Command failed: {message}")]
    CommandFailed { message: String },

    #[error("Invalid argument: {arg} - {message}")]
    InvalidArgument { arg: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl CliError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) => 1,
            Self::Queue(_) => 2,
            Self::CommandFailed { .. } => 3,
            Self::InvalidArgument { .. } => 4,
            Self::Io(_) => 5,
            Self::Serialization { .. } => 6,
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization {
            message: e.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: e.to_string(),
        }
    }
}

impl From<toml::ser::Error> for CliError {
    fn from(e: toml::ser::Error) -> Self {
        Self::Serialization {
            message: e.to_string(),
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

/// Parse arguments, load configuration, initialize logging and run the command
pub async fn run_cli() -> Result<(), CliError> {
    let cli = Cli::parse();

    let mut config = match load_configuration(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            initialize_logging(&cli, &LoggingConfig::default())?;
            return Err(e.into());
        }
    };
    initialize_logging(&cli, &config.logging)?;

    if let Some(choice) = cli.provider {
        config.override_provider(choice.into());
    }

    run(cli.command, &config, &mut std::io::stdout().lock()).await
}

/// Run one command against the configured backend
pub async fn run<W: Write>(
    command: Commands,
    config: &RedriveConfig,
    out: &mut W,
) -> Result<(), CliError> {
    match command {
        Commands::Config { format } => print_config(config, format, out),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "redrive", out);
            Ok(())
        }
        command => {
            let clock: Arc<dyn Clock> = Arc::new(SystemClock);
            let transport = TransportFactory::create(&config.provider, clock.clone()).await?;
            tracing::info!(provider = %transport.provider_type(), "Connected to queue backend");

            let orchestrator = QueueOrchestrator::new(transport, config.lifecycle.clone(), clock);
            commands::execute(command, &orchestrator, out).await
        }
    }
}

/// Install the tracing subscriber
///
/// `RUST_LOG` wins over `--log-level`, which wins over the configured level.
pub fn initialize_logging(cli: &Cli, logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = cli.log_level.as_deref().unwrap_or(&logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let json = cli.json_logs || logging.format == LogFormat::Json;

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    result.map_err(|e| ConfigError::Logging {
        message: e.to_string(),
    })
}

fn print_config<W: Write>(
    config: &RedriveConfig,
    format: ConfigFormat,
    out: &mut W,
) -> Result<(), CliError> {
    let rendered = match format {
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string(config)?,
    };

    writeln!(out, "{}", rendered.trim_end())?;
    Ok(())
}

//! # simpleq CLI
//!
//! Command-line interface for simpleq job queues.
//!
//! This module provides CLI commands for:
//! - Publishing a job with a JSON payload
//! - Retrieving one batch of jobs, optionally acknowledging them
//! - Deleting a queue
//! - Showing the resolved configuration
//!
//! Configuration is layered: built-in defaults, then an optional file, then
//! `SIMPLEQ__` environment variables, then command-line flags.

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use simpleq::{Job, Queue, QueueError, QueueServiceClient, SqsClient, SqsConfig};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Prefix of configuration environment variables, e.g. `SIMPLEQ__SQS__REGION`
pub const ENV_PREFIX: &str = "SIMPLEQ";

// ============================================================================
// CLI Structure
// ============================================================================

/// simpleq - cheap, lazy job queues on AWS SQS
#[derive(Debug, Parser)]
#[command(name = "simpleq")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Publish and consume jobs on AWS SQS queues")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "SIMPLEQ_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging level, overrides the configured level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long)]
    pub json_logs: bool,

    /// AWS region, overrides the configured region
    #[arg(long)]
    pub region: Option<String>,

    /// Service endpoint, e.g. http://localhost:4566 for LocalStack
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Publish a job
    Add {
        /// Queue name
        queue: String,

        /// Job payload as JSON
        payload: String,
    },

    /// Retrieve one batch of jobs and print each as a JSON line
    Jobs {
        /// Queue name
        queue: String,

        /// Acknowledge each job after printing it
        #[arg(short, long)]
        remove: bool,
    },

    /// Delete a queue and every job in it
    Delete {
        /// Queue name
        queue: String,

        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Show the resolved configuration
    Config {
        /// Output format
        #[arg(short, long, default_value = "toml")]
        format: ConfigFormat,
    },
}

/// Configuration output formats
#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ConfigFormat {
    Toml,
    Json,
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

    #[error("Queue service error: {0}")]
    Service(#[from] simpleq::ServiceError),

    #[error("Invalid argument: {arg} - {message}")]
    InvalidArgument { arg: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logging initialization failed: {0}")]
    Logging(String),
}

impl CliError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) => 1,
            Self::Queue(_) => 2,
            Self::Service(_) => 3,
            Self::InvalidArgument { .. } => 4,
            Self::Io(_) => 5,
            Self::Logging(_) => 6,
        }
    }
}

/// Configuration-related errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Validation(#[from] simpleq::ConfigurationError),

    #[error("Failed to render configuration: {message}")]
    Render { message: String },
}

// ============================================================================
// Configuration Types
// ============================================================================

/// CLI configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CliConfig {
    /// Queue service settings
    pub sqs: SqsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
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

/// Log format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum LogFormat {
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "json")]
    Json,
}

impl CliConfig {
    /// Apply command-line overrides on top of the loaded configuration
    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(region) = &cli.region {
            self.sqs.region = region.clone();
        }
        if let Some(endpoint) = &cli.endpoint {
            self.sqs.endpoint = Some(endpoint.clone());
        }
        if let Some(level) = &cli.log_level {
            self.logging.level = level.clone();
        }
        if cli.json_logs {
            self.logging.format = LogFormat::Json;
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

/// Main CLI entry point
pub async fn run_cli() -> Result<(), CliError> {
    run(Cli::parse()).await
}

/// Run a parsed command line
pub async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = load_configuration(cli.config.as_deref())?;
    config.apply_overrides(&cli);
    config.sqs.validate().map_err(ConfigError::from)?;

    initialize_logging(&config.logging)?;
    debug!(config = ?config, "Resolved configuration");

    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Commands::Config { format } => execute_config_command(&config, &format, &mut stdout),
        Commands::Add { queue, payload } => {
            let queue = open_queue(&queue, &config)?;
            execute_add_command(&queue, &payload, &mut stdout).await
        }
        Commands::Jobs { queue, remove } => {
            let queue = open_queue(&queue, &config)?;
            execute_jobs_command(&queue, remove, &mut stdout).await
        }
        Commands::Delete { queue, yes } => {
            let queue = open_queue(&queue, &config)?;
            execute_delete_command(&queue, yes, &mut stdout).await
        }
    }
}

/// Initialize logging
///
/// `RUST_LOG` takes precedence over the configured level. Logs go to stderr
/// so command output on stdout stays machine-readable.
pub fn initialize_logging(logging: &LoggingConfig) -> Result<(), CliError> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&logging.level))
        .map_err(|e| CliError::Logging(e.to_string()))?;

    let json = logging.format == LogFormat::Json;
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .try_init()
        .map_err(|e| CliError::Logging(e.to_string()))
}

/// Load configuration from defaults, an optional file and the environment
///
/// Environment variables use the `SIMPLEQ__` prefix with `__` between levels,
/// e.g. `SIMPLEQ__SQS__REGION=eu-west-1` sets `sqs.region`.
pub fn load_configuration(config_path: Option<&Path>) -> Result<CliConfig, ConfigError> {
    let mut builder = config::Config::builder();

    if let Some(path) = config_path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        builder = builder.add_source(config::File::from(path).required(true));
    }

    let config = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(config.try_deserialize()?)
}

fn open_queue(name: &str, config: &CliConfig) -> Result<Queue, CliError> {
    let client: Arc<dyn QueueServiceClient> = Arc::new(SqsClient::new(config.sqs.clone())?);
    Ok(Queue::with_client(name, client)?)
}

// ============================================================================
// Command Implementations
// ============================================================================

/// Execute add command
pub async fn execute_add_command(
    queue: &Queue,
    payload: &str,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let payload: serde_json::Value =
        serde_json::from_str(payload).map_err(|e| CliError::InvalidArgument {
            arg: "payload".to_string(),
            message: format!("not valid JSON: {}", e),
        })?;

    let job = Job::new(payload);
    let message_id = queue.add_job(&job).await?;
    info!(queue = %queue.name(), job_id = %job.id(), "Job published");

    let line = serde_json::json!({
        "job_id": job.id(),
        "message_id": message_id,
    });
    writeln!(out, "{}", line)?;
    Ok(())
}

/// Execute jobs command
///
/// Messages that cannot be decoded are logged and skipped; they stay on the
/// queue and reappear after the visibility timeout.
pub async fn execute_jobs_command(
    queue: &Queue,
    remove: bool,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let mut printed = 0usize;
    let mut malformed = 0usize;

    for item in queue.jobs().await? {
        let job = match item {
            Ok(job) => job,
            Err(e) => {
                warn!(queue = %queue.name(), error = %e, "Skipping undecodable message");
                malformed += 1;
                continue;
            }
        };

        let line = serde_json::json!({
            "id": job.id(),
            "message_id": job.message_id(),
            "receive_count": job.receive_count(),
            "payload": job.payload(),
        });
        writeln!(out, "{}", line)?;
        printed += 1;

        if remove {
            queue.remove_job(&job).await?;
        }
    }

    info!(
        queue = %queue.name(),
        jobs = printed,
        malformed = malformed,
        removed = remove,
        "Retrieved jobs"
    );
    Ok(())
}

/// Execute delete command
pub async fn execute_delete_command(
    queue: &Queue,
    yes: bool,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    if !yes {
        return Err(CliError::InvalidArgument {
            arg: "--yes".to_string(),
            message: format!(
                "deleting '{}' removes every job in it; pass --yes to confirm",
                queue.name()
            ),
        });
    }

    queue.delete().await?;
    writeln!(out, "Deleted queue {}", queue.name())?;
    Ok(())
}

/// Execute config command
///
/// The secret access key is never printed.
pub fn execute_config_command(
    config: &CliConfig,
    format: &ConfigFormat,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let rendered = match format {
        ConfigFormat::Toml => toml::to_string_pretty(config).map_err(|e| ConfigError::Render {
            message: e.to_string(),
        })?,
        ConfigFormat::Json => {
            serde_json::to_string_pretty(config).map_err(|e| ConfigError::Render {
                message: e.to_string(),
            })?
        }
    };

    writeln!(out, "{}", rendered.trim_end())?;
    Ok(())
}

//! Error types for queue and job operations.

use crate::message::{JobId, MessageId};
use thiserror::Error;

/// Errors surfaced by [`Queue`](crate::Queue) and [`Job`](crate::Job) operations.
///
/// Nothing in this crate retries. Every variant is handed to the caller, who
/// owns retry and backoff policy; [`QueueError::is_transient`] is a hint for
/// that policy.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue '{queue_name}' could not be resolved or created: {source}")]
    ResourceUnavailable {
        queue_name: String,
        source: ServiceError,
    },

    #[error("Queue not found: {queue_name}")]
    QueueNotFound { queue_name: String },

    #[error("Failed to publish job to queue '{queue_name}': {source}")]
    PublishFailed {
        queue_name: String,
        source: ServiceError,
    },

    #[error("Delete failed on queue '{queue_name}': {source}")]
    DeleteFailed {
        queue_name: String,
        source: ServiceError,
    },

    #[error("Failed to fetch jobs from queue '{queue_name}': {source}")]
    FetchFailed {
        queue_name: String,
        source: ServiceError,
    },

    #[error("Job {job_id} has no receipt handle; only retrieved jobs can be removed")]
    InvalidJobHandle { job_id: JobId },

    #[error("Message {message_id} could not be decoded into a job: {reason}")]
    MalformedMessage { message_id: MessageId, reason: String },

    #[error("Serialization failed: {0}")]
    Serialization(#[from] SerializationError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl QueueError {
    /// Check if error is transient and the operation may succeed on retry
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ResourceUnavailable { source, .. }
            | Self::PublishFailed { source, .. }
            | Self::DeleteFailed { source, .. }
            | Self::FetchFailed { source, .. } => source.is_transient(),
            Self::QueueNotFound { .. } => false,
            Self::InvalidJobHandle { .. } => false,
            Self::MalformedMessage { .. } => false,
            Self::Serialization(_) => false,
            Self::Configuration(_) => false,
            Self::Validation(_) => false,
        }
    }

    /// Get the service-level cause, if the failure came from the queue service
    pub fn service_error(&self) -> Option<&ServiceError> {
        match self {
            Self::ResourceUnavailable { source, .. }
            | Self::PublishFailed { source, .. }
            | Self::DeleteFailed { source, .. }
            | Self::FetchFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Errors reported by a [`QueueServiceClient`](crate::QueueServiceClient)
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Queue service error: {0}")]
    ServiceError(String),

    #[error("Queue does not exist: {0}")]
    QueueNotFound(String),

    #[error("Invalid receipt handle: {0}")]
    InvalidReceipt(String),

    #[error("Message too large: {size} bytes (max: {max_size})")]
    MessageTooLarge { size: usize, max_size: usize },

    #[error("Invalid configuration: {0}")]
    ConfigurationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ServiceError {
    /// Check if error is transient and should be retried
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Authentication(_) => false,
            Self::NetworkError(_) => true,
            Self::ServiceError(_) => true, // Most service-side failures clear up on their own
            Self::QueueNotFound(_) => false,
            Self::InvalidReceipt(_) => false,
            Self::MessageTooLarge { .. } => false,
            Self::ConfigurationError(_) => false,
            Self::SerializationError(_) => false,
        }
    }
}

/// Errors while converting typed payloads to and from JSON
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("JSON serialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Message body is not valid UTF-8")]
    InvalidUtf8,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },
}

/// Validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    Required { field: String },

    #[error("Invalid format for {field}: {message}")]
    InvalidFormat { field: String, message: String },

    #[error("Value out of range for {field}: {message}")]
    OutOfRange { field: String, message: String },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

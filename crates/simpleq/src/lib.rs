//! # simpleq
//!
//! A small job queue on top of a managed message queue service (AWS SQS).
//!
//! A [`Queue`] is a named remote queue that is created on first use. Jobs
//! carry an arbitrary JSON payload; they are published with
//! [`Queue::add_job`], retrieved in batches with [`Queue::jobs`] and
//! acknowledged with [`Queue::remove_job`]. A job that is retrieved but never
//! removed becomes visible again after the service's visibility timeout, so
//! delivery is at-least-once.
//!
//! ## Module Organization
//!
//! - [`queue`] - Queue handle, lazy resource resolution and batch retrieval
//! - [`job`] - Jobs and their wire envelope
//! - [`client`] - The service client seam
//! - [`providers`] - SQS over HTTP and an in-memory service for tests
//! - [`provider`] - Client configuration
//! - [`message`] - Identifiers and wire types
//! - [`error`] - Error types
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use simpleq::{InMemoryQueueService, Job, Queue};
//!
//! # async fn example() -> Result<(), simpleq::QueueError> {
//! let queue = Queue::with_client("thumbnails", Arc::new(InMemoryQueueService::default()))?;
//! queue.add_job(&Job::new(serde_json::json!({"image": "cat.png"}))).await?;
//!
//! for job in queue.jobs().await? {
//!     let job = job?;
//!     println!("processing {}", job.payload());
//!     queue.remove_job(&job).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod job;
pub mod message;
pub mod provider;
pub mod providers;
pub mod queue;

pub use client::QueueServiceClient;
pub use error::{
    ConfigurationError, QueueError, SerializationError, ServiceError, ValidationError,
};
pub use job::Job;
pub use message::{JobId, MessageId, QueueName, QueueResource, ReceiptHandle, WireMessage};
pub use provider::{InMemoryConfig, SqsConfig, DEFAULT_REGION, SQS_MAX_MESSAGE_SIZE};
pub use providers::{InMemoryQueueService, SqsClient};
pub use queue::{Jobs, Queue, BATCH_SIZE, WAIT_SECONDS};

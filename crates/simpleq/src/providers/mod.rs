//! Queue service client implementations.
//!
//! This module contains concrete implementations of the `QueueServiceClient`
//! trait: AWS SQS over HTTP and an in-memory service for tests.

pub mod aws;
pub mod memory;

pub use aws::SqsClient;
pub use memory::{CallCounts, FetchRequest, InMemoryQueueService, ServiceOperation};

//! The queue service client seam.
//!
//! [`Queue`](crate::Queue) never talks to the network itself. Everything it
//! needs from the remote service goes through this trait, so any compliant
//! implementation can be substituted: the HTTP-based
//! [`SqsClient`](crate::providers::SqsClient) in production and
//! [`InMemoryQueueService`](crate::providers::InMemoryQueueService) in tests.

use crate::error::ServiceError;
use crate::message::{MessageId, QueueName, QueueResource, ReceiptHandle, WireMessage};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Duration;

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

/// Capabilities required from a remote queue service
///
/// Implementations may retry transient transport failures internally. Callers
/// of this trait must not retry on top of that.
#[async_trait]
pub trait QueueServiceClient: Send + Sync {
    /// Look up a queue by name, returning `None` if it does not exist
    async fn get_queue(&self, name: &QueueName) -> Result<Option<QueueResource>, ServiceError>;

    /// Create a queue, or return the existing one with the same name
    async fn create_queue(&self, name: &QueueName) -> Result<QueueResource, ServiceError>;

    /// Delete a queue and every message in it
    async fn delete_queue(&self, resource: &QueueResource) -> Result<(), ServiceError>;

    /// Publish a message body
    async fn publish(
        &self,
        resource: &QueueResource,
        body: Bytes,
    ) -> Result<MessageId, ServiceError>;

    /// Fetch up to `max_messages`, waiting up to `wait` for any to arrive
    ///
    /// An empty result after the wait elapses is not an error.
    async fn fetch_batch(
        &self,
        resource: &QueueResource,
        max_messages: u32,
        wait: Duration,
    ) -> Result<Vec<WireMessage>, ServiceError>;

    /// Delete (acknowledge) a received message
    async fn delete_message(
        &self,
        resource: &QueueResource,
        receipt: &ReceiptHandle,
    ) -> Result<(), ServiceError>;

    /// Region the client is bound to
    fn region(&self) -> &str;
}

//! In-memory queue service for testing and development.
//!
//! This module provides a fully functional in-memory stand-in for SQS that:
//! - Implements get-or-create queue semantics
//! - Long-polls: fetches wait until a message is published or the wait elapses
//! - Hides received messages for a visibility timeout and redelivers them if
//!   they are not deleted in time
//! - Enforces the SQS batch and wait limits
//!
//! For tests it also counts calls per operation, records every fetch request
//! and can fail the next call of a chosen operation.
//!
//! Time is measured with `tokio::time`, so tests running with a paused clock
//! see long polls and visibility timeouts elapse instantly.

use crate::client::QueueServiceClient;
use crate::error::ServiceError;
use crate::message::{MessageId, QueueName, QueueResource, ReceiptHandle, WireMessage};
use crate::provider::InMemoryConfig;
use crate::queue::{BATCH_SIZE, WAIT_SECONDS};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Duration;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tokio::time::Instant;

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;

// ============================================================================
// Internal Storage Structures
// ============================================================================

/// Internal queue state for a single queue
struct InMemoryQueue {
    url: String,
    messages: VecDeque<StoredMessage>,
    /// Woken whenever a message is published or the queue is deleted
    notify: Arc<Notify>,
}

impl InMemoryQueue {
    fn new(url: String) -> Self {
        Self {
            url,
            messages: VecDeque::new(),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Receive up to `max` visible messages, hiding them for `visibility`
    fn take_visible(&mut self, max: usize, visibility: std::time::Duration) -> Vec<WireMessage> {
        let now = Instant::now();
        let mut batch = Vec::new();

        for stored in self.messages.iter_mut() {
            if batch.len() >= max {
                break;
            }
            if stored.visible_at > now {
                continue;
            }

            let receipt = uuid::Uuid::new_v4().to_string();
            stored.receive_count += 1;
            stored.visible_at = now + visibility;
            stored.receipt = Some(receipt.clone());

            batch.push(WireMessage {
                message_id: stored.message_id.clone(),
                body: stored.body.clone(),
                receipt_handle: ReceiptHandle::new(receipt),
                receive_count: stored.receive_count,
            });
        }

        batch
    }

    /// Earliest moment an in-flight message becomes visible again
    fn next_visible_at(&self) -> Option<Instant> {
        let now = Instant::now();
        self.messages
            .iter()
            .map(|m| m.visible_at)
            .filter(|at| *at > now)
            .min()
    }
}

/// A message stored in a queue with delivery metadata
struct StoredMessage {
    message_id: MessageId,
    body: Bytes,
    receive_count: u32,
    visible_at: Instant,
    /// Receipt issued by the most recent delivery
    receipt: Option<String>,
}

/// Operations of the service, used for call counting and failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceOperation {
    GetQueue,
    CreateQueue,
    DeleteQueue,
    Publish,
    FetchBatch,
    DeleteMessage,
}

/// Number of calls received per operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub get_queue: usize,
    pub create_queue: usize,
    pub delete_queue: usize,
    pub publish: usize,
    pub fetch_batch: usize,
    pub delete_message: usize,
}

impl CallCounts {
    fn record(&mut self, operation: ServiceOperation) {
        match operation {
            ServiceOperation::GetQueue => self.get_queue += 1,
            ServiceOperation::CreateQueue => self.create_queue += 1,
            ServiceOperation::DeleteQueue => self.delete_queue += 1,
            ServiceOperation::Publish => self.publish += 1,
            ServiceOperation::FetchBatch => self.fetch_batch += 1,
            ServiceOperation::DeleteMessage => self.delete_message += 1,
        }
    }
}

/// Parameters of a recorded fetch call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRequest {
    pub max_messages: u32,
    pub wait: Duration,
}

struct ServiceState {
    queues: HashMap<String, InMemoryQueue>,
    calls: CallCounts,
    fetches: Vec<FetchRequest>,
    failures: HashMap<ServiceOperation, ServiceError>,
}

// ============================================================================
// InMemoryQueueService
// ============================================================================

/// In-memory queue service implementation
pub struct InMemoryQueueService {
    config: InMemoryConfig,
    state: Mutex<ServiceState>,
}

impl InMemoryQueueService {
    /// Create new in-memory service with configuration
    pub fn new(config: InMemoryConfig) -> Self {
        Self {
            config,
            state: Mutex::new(ServiceState {
                queues: HashMap::new(),
                calls: CallCounts::default(),
                fetches: Vec::new(),
                failures: HashMap::new(),
            }),
        }
    }

    /// Snapshot of the calls received so far
    pub fn call_counts(&self) -> CallCounts {
        self.lock().calls
    }

    /// Every fetch request received, in order
    pub fn fetch_requests(&self) -> Vec<FetchRequest> {
        self.lock().fetches.clone()
    }

    /// Make the next call of `operation` fail with `error`
    pub fn fail_next(&self, operation: ServiceOperation, error: ServiceError) {
        self.lock().failures.insert(operation, error);
    }

    pub fn queue_exists(&self, name: &str) -> bool {
        self.lock().queues.contains_key(name)
    }

    /// Number of messages in a queue, in flight or not
    pub fn message_count(&self, name: &str) -> usize {
        self.lock()
            .queues
            .get(name)
            .map_or(0, |queue| queue.messages.len())
    }

    fn lock(&self) -> MutexGuard<'_, ServiceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count the call and consume any failure injected for it
    fn begin(
        &self,
        operation: ServiceOperation,
    ) -> Result<MutexGuard<'_, ServiceState>, ServiceError> {
        let mut state = self.lock();
        state.calls.record(operation);
        match state.failures.remove(&operation) {
            Some(error) => Err(error),
            None => Ok(state),
        }
    }

    fn resource_for(&self, name: &QueueName, queue: &InMemoryQueue) -> QueueResource {
        QueueResource::new(name.clone(), queue.url.clone())
    }
}

impl Default for InMemoryQueueService {
    fn default() -> Self {
        Self::new(InMemoryConfig::default())
    }
}

fn queue_missing(resource: &QueueResource) -> ServiceError {
    ServiceError::QueueNotFound(resource.name().to_string())
}

#[async_trait]
impl QueueServiceClient for InMemoryQueueService {
    async fn get_queue(&self, name: &QueueName) -> Result<Option<QueueResource>, ServiceError> {
        let state = self.begin(ServiceOperation::GetQueue)?;
        Ok(state
            .queues
            .get(name.as_str())
            .map(|queue| self.resource_for(name, queue)))
    }

    async fn create_queue(&self, name: &QueueName) -> Result<QueueResource, ServiceError> {
        let mut state = self.begin(ServiceOperation::CreateQueue)?;
        let url = format!("memory://{}/{}", self.config.region, name);
        let queue = state
            .queues
            .entry(name.as_str().to_string())
            .or_insert_with(|| InMemoryQueue::new(url));
        Ok(self.resource_for(name, queue))
    }

    async fn delete_queue(&self, resource: &QueueResource) -> Result<(), ServiceError> {
        let mut state = self.begin(ServiceOperation::DeleteQueue)?;
        let queue = state
            .queues
            .remove(resource.name().as_str())
            .ok_or_else(|| queue_missing(resource))?;
        queue.notify.notify_waiters();
        Ok(())
    }

    async fn publish(
        &self,
        resource: &QueueResource,
        body: Bytes,
    ) -> Result<MessageId, ServiceError> {
        let mut state = self.begin(ServiceOperation::Publish)?;
        if body.len() > self.config.max_message_size {
            return Err(ServiceError::MessageTooLarge {
                size: body.len(),
                max_size: self.config.max_message_size,
            });
        }

        let queue = state
            .queues
            .get_mut(resource.name().as_str())
            .ok_or_else(|| queue_missing(resource))?;

        let message_id = MessageId::new();
        queue.messages.push_back(StoredMessage {
            message_id: message_id.clone(),
            body,
            receive_count: 0,
            visible_at: Instant::now(),
            receipt: None,
        });
        queue.notify.notify_waiters();

        Ok(message_id)
    }

    async fn fetch_batch(
        &self,
        resource: &QueueResource,
        max_messages: u32,
        wait: Duration,
    ) -> Result<Vec<WireMessage>, ServiceError> {
        let notify = {
            let mut state = self.begin(ServiceOperation::FetchBatch)?;
            state.fetches.push(FetchRequest { max_messages, wait });

            if max_messages == 0 || max_messages > BATCH_SIZE {
                return Err(ServiceError::ServiceError(format!(
                    "InvalidParameterValue: MaxNumberOfMessages must be 1-{}",
                    BATCH_SIZE
                )));
            }
            if wait < Duration::zero() || wait > Duration::seconds(WAIT_SECONDS as i64) {
                return Err(ServiceError::ServiceError(format!(
                    "InvalidParameterValue: WaitTimeSeconds must be 0-{}",
                    WAIT_SECONDS
                )));
            }

            let queue = state
                .queues
                .get(resource.name().as_str())
                .ok_or_else(|| queue_missing(resource))?;
            Arc::clone(&queue.notify)
        };

        let deadline = Instant::now() + wait.to_std().unwrap_or_default();

        loop {
            // Register for wake-ups before looking, so a publish that lands
            // between the check and the wait is not missed.
            let notified = notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let next_visible = {
                let mut state = self.lock();
                let queue = state
                    .queues
                    .get_mut(resource.name().as_str())
                    .ok_or_else(|| queue_missing(resource))?;

                let batch = queue.take_visible(max_messages as usize, self.config.visibility_timeout());
                if !batch.is_empty() {
                    return Ok(batch);
                }
                queue.next_visible_at()
            };

            if Instant::now() >= deadline {
                return Ok(Vec::new());
            }

            let wake_at = next_visible.map_or(deadline, |at| at.min(deadline));
            let _ = tokio::time::timeout_at(wake_at, notified).await;
        }
    }

    async fn delete_message(
        &self,
        resource: &QueueResource,
        receipt: &ReceiptHandle,
    ) -> Result<(), ServiceError> {
        let mut state = self.begin(ServiceOperation::DeleteMessage)?;
        let queue = state
            .queues
            .get_mut(resource.name().as_str())
            .ok_or_else(|| queue_missing(resource))?;

        let position = queue
            .messages
            .iter()
            .position(|m| m.receipt.as_deref() == Some(receipt.handle()))
            .ok_or_else(|| ServiceError::InvalidReceipt(receipt.handle().to_string()))?;
        queue.messages.remove(position);

        Ok(())
    }

    fn region(&self) -> &str {
        &self.config.region
    }
}

//! Named queues and the batched long-polling retrieval protocol.

use crate::client::QueueServiceClient;
use crate::error::{ConfigurationError, QueueError, ServiceError};
use crate::job::Job;
use crate::message::{MessageId, QueueName, QueueResource};
use crate::provider::SqsConfig;
use crate::providers::SqsClient;
use chrono::Duration;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;

/// Messages requested per fetch; the SQS maximum
pub const BATCH_SIZE: u32 = 10;

/// Long-poll wait per fetch in seconds; the SQS maximum
pub const WAIT_SECONDS: u64 = 20;

/// Lifecycle of the remote queue behind a [`Queue`]
enum ResourceState {
    Unresolved,
    Ready(QueueResource),
    Deleted,
}

/// A named remote queue
///
/// The remote queue is resolved lazily: nothing touches the network until the
/// first operation, which looks the queue up and creates it if it is missing.
/// The result is cached for the lifetime of this value. Concurrent first use
/// is single-flight, so at most one lookup and one create are ever issued.
///
/// After [`Queue::delete`] every operation fails with
/// [`QueueError::QueueNotFound`]; the queue is never recreated implicitly.
/// Construct a new `Queue` to start over.
pub struct Queue {
    name: QueueName,
    client: Arc<dyn QueueServiceClient>,
    state: Mutex<ResourceState>,
}

impl Queue {
    /// Create a queue handle backed by an SQS client for the default region
    ///
    /// Credentials come from `AWS_ACCESS_KEY_ID` and `AWS_SECRET_ACCESS_KEY`
    /// (see [`SqsConfig::from_env`]). Without them the handle still
    /// constructs, but every operation fails with an authentication error.
    /// Use [`Queue::with_client`] for any other region or credential source.
    pub fn new(name: &str) -> Result<Self, QueueError> {
        let client = SqsClient::new(SqsConfig::from_env()).map_err(|e| {
            ConfigurationError::Invalid {
                message: e.to_string(),
            }
        })?;
        Self::with_client(name, Arc::new(client))
    }

    /// Create a queue handle using the given service client
    pub fn with_client(
        name: &str,
        client: Arc<dyn QueueServiceClient>,
    ) -> Result<Self, QueueError> {
        let name = QueueName::new(name.to_string())?;
        Ok(Self {
            name,
            client,
            state: Mutex::new(ResourceState::Unresolved),
        })
    }

    pub fn name(&self) -> &QueueName {
        &self.name
    }

    /// Region of the underlying service client
    pub fn region(&self) -> &str {
        self.client.region()
    }

    /// Resolve the remote queue, creating it if necessary
    ///
    /// Only the first call reaches the service; later calls return the cached
    /// resource.
    pub async fn resource(&self) -> Result<QueueResource, QueueError> {
        let mut state = self.state.lock().await;
        match &*state {
            ResourceState::Ready(resource) => return Ok(resource.clone()),
            ResourceState::Deleted => return Err(self.not_found()),
            ResourceState::Unresolved => {}
        }

        // The lock is held across resolution so concurrent callers wait for
        // this attempt instead of issuing their own create.
        let resource = self.resolve().await?;
        *state = ResourceState::Ready(resource.clone());
        Ok(resource)
    }

    #[instrument(skip(self), fields(queue = %self.name))]
    async fn resolve(&self) -> Result<QueueResource, QueueError> {
        let existing = self
            .client
            .get_queue(&self.name)
            .await
            .map_err(|e| self.unavailable(e))?;

        if let Some(resource) = existing {
            debug!(url = %resource.url(), "Resolved existing queue");
            return Ok(resource);
        }

        let resource = self
            .client
            .create_queue(&self.name)
            .await
            .map_err(|e| self.unavailable(e))?;
        info!(url = %resource.url(), "Created queue");
        Ok(resource)
    }

    /// Delete the remote queue and every job in it
    ///
    /// In-flight jobs are deleted too. This cannot be undone. If the queue was
    /// never resolved and does not exist remotely, nothing is created; the
    /// handle simply moves to the deleted state.
    #[instrument(skip(self), fields(queue = %self.name))]
    pub async fn delete(&self) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        let resource = match &*state {
            ResourceState::Ready(resource) => resource.clone(),
            ResourceState::Deleted => return Err(self.not_found()),
            ResourceState::Unresolved => {
                let existing = self
                    .client
                    .get_queue(&self.name)
                    .await
                    .map_err(|e| self.unavailable(e))?;
                match existing {
                    Some(resource) => resource,
                    None => {
                        debug!("Queue does not exist remotely; nothing to delete");
                        *state = ResourceState::Deleted;
                        return Ok(());
                    }
                }
            }
        };

        self.client
            .delete_queue(&resource)
            .await
            .map_err(|e| self.delete_failed(e))?;

        *state = ResourceState::Deleted;
        info!("Deleted queue");
        Ok(())
    }

    /// Publish a job
    #[instrument(skip(self, job), fields(queue = %self.name, job_id = %job.id()))]
    pub async fn add_job(&self, job: &Job) -> Result<MessageId, QueueError> {
        let resource = self.resource().await?;
        let body = job.to_wire()?;

        let message_id = self
            .client
            .publish(&resource, body)
            .await
            .map_err(|source| QueueError::PublishFailed {
                queue_name: self.name.to_string(),
                source,
            })?;

        debug!(message_id = %message_id, "Published job");
        Ok(message_id)
    }

    /// Remove (acknowledge) a job previously returned by [`Queue::jobs`]
    #[instrument(skip(self, job), fields(queue = %self.name, job_id = %job.id()))]
    pub async fn remove_job(&self, job: &Job) -> Result<(), QueueError> {
        let receipt = job.handle().ok_or_else(|| QueueError::InvalidJobHandle {
            job_id: job.id().clone(),
        })?;
        let resource = self.resource().await?;

        self.client
            .delete_message(&resource, receipt)
            .await
            .map_err(|e| self.delete_failed(e))?;

        debug!("Removed job");
        Ok(())
    }

    /// Retrieve currently available jobs
    ///
    /// Issues exactly one fetch asking for [`BATCH_SIZE`] messages and waiting
    /// up to [`WAIT_SECONDS`] for any to arrive, which keeps the number of
    /// billed requests low at the cost of latency on an empty queue. An empty
    /// result means "try again later" and is not an error.
    ///
    /// Each item is decoded independently; a message that cannot be decoded
    /// yields [`QueueError::MalformedMessage`] without hiding the rest of the
    /// batch. Jobs that are not removed become visible again once the
    /// service's visibility timeout expires.
    #[instrument(skip(self), fields(queue = %self.name))]
    pub async fn jobs(&self) -> Result<Jobs, QueueError> {
        let resource = self.resource().await?;

        let messages = self
            .client
            .fetch_batch(
                &resource,
                BATCH_SIZE,
                Duration::seconds(WAIT_SECONDS as i64),
            )
            .await
            .map_err(|source| QueueError::FetchFailed {
                queue_name: self.name.to_string(),
                source,
            })?;

        debug!(count = messages.len(), "Fetched messages");

        let jobs = messages
            .into_iter()
            .map(|message| {
                Job::from_wire(message).inspect_err(|e| {
                    warn!(error = %e, "Message could not be decoded into a job");
                })
            })
            .collect::<Vec<_>>();

        Ok(Jobs {
            inner: jobs.into_iter(),
        })
    }

    fn not_found(&self) -> QueueError {
        QueueError::QueueNotFound {
            queue_name: self.name.to_string(),
        }
    }

    fn unavailable(&self, source: ServiceError) -> QueueError {
        QueueError::ResourceUnavailable {
            queue_name: self.name.to_string(),
            source,
        }
    }

    fn delete_failed(&self, source: ServiceError) -> QueueError {
        QueueError::DeleteFailed {
            queue_name: self.name.to_string(),
            source,
        }
    }
}

impl fmt::Display for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Queue(name={}, region={})", self.name, self.client.region())
    }
}

impl fmt::Debug for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue")
            .field("name", &self.name)
            .field("region", &self.client.region())
            .finish()
    }
}

/// Jobs produced by a single [`Queue::jobs`] call
///
/// Consumed once; call [`Queue::jobs`] again for the next batch.
#[derive(Debug)]
pub struct Jobs {
    inner: std::vec::IntoIter<Result<Job, QueueError>>,
}

impl Jobs {
    pub fn is_empty(&self) -> bool {
        self.inner.len() == 0
    }
}

impl Iterator for Jobs {
    type Item = Result<Job, QueueError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Jobs {}

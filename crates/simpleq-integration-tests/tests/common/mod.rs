//! Common test utilities for simpleq integration tests
//!
//! This module provides:
//! - Fixtures pairing a `Queue` with the in-memory service behind it
//! - Payload builders shared across test files
//! - Helpers for draining a queue batch by batch

use serde::{Deserialize, Serialize};
use simpleq::{InMemoryConfig, InMemoryQueueService, Job, Queue, QueueServiceClient};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Fixtures
// ============================================================================

/// A queue handle together with the service it talks to
#[allow(dead_code)]
pub struct TestQueue {
    pub service: Arc<InMemoryQueueService>,
    pub queue: Queue,
}

impl TestQueue {
    /// Fresh service with default settings
    #[allow(dead_code)]
    pub fn new(name: &str) -> Self {
        Self::with_service(name, Arc::new(InMemoryQueueService::default()))
    }

    /// Fresh service with a custom visibility timeout
    #[allow(dead_code)]
    pub fn with_visibility_timeout(name: &str, timeout: Duration) -> Self {
        let service = InMemoryQueueService::new(InMemoryConfig {
            visibility_timeout_seconds: timeout.as_secs(),
            ..InMemoryConfig::default()
        });
        Self::with_service(name, Arc::new(service))
    }

    /// Queue handle on an existing service
    #[allow(dead_code)]
    pub fn with_service(name: &str, service: Arc<InMemoryQueueService>) -> Self {
        let client: Arc<dyn QueueServiceClient> = service.clone();
        let queue = Queue::with_client(name, client).expect("test queue names are valid");
        Self { service, queue }
    }

    /// Another handle on the same remote queue
    #[allow(dead_code)]
    pub fn second_handle(&self) -> Queue {
        Queue::with_client(self.queue.name().as_str(), self.service.clone())
            .expect("test queue names are valid")
    }
}

// ============================================================================
// Payloads
// ============================================================================

/// Typed payload used by producer/consumer tests
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResizeTask {
    pub image: String,
    pub width: u32,
    pub formats: Vec<String>,
}

#[allow(dead_code)]
pub fn resize_task(n: u32) -> ResizeTask {
    ResizeTask {
        image: format!("image-{}.png", n),
        width: 64 * (n + 1),
        formats: vec!["webp".to_string(), "avif".to_string()],
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Retrieve and remove jobs until a fetch comes back empty
///
/// Tests using this should run with a paused clock, since the final empty
/// fetch waits out the full long poll.
#[allow(dead_code)]
pub async fn drain(queue: &Queue) -> Vec<Job> {
    let mut drained = Vec::new();
    loop {
        let jobs = queue.jobs().await.expect("fetch should succeed");
        if jobs.is_empty() {
            return drained;
        }
        for job in jobs {
            let job = job.expect("test jobs are well formed");
            queue.remove_job(&job).await.expect("remove should succeed");
            drained.push(job);
        }
    }
}

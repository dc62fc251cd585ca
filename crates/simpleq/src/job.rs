//! Jobs and their wire format.
//!
//! A job travels as a small JSON envelope:
//!
//! ```json
//! {"id": "7b0c...", "payload": {"task": "resize", "id": 42}}
//! ```
//!
//! The payload is arbitrary JSON and opaque to the queue. The receipt handle
//! is never part of the body; it is attached by the queue service on delivery.

use crate::error::{QueueError, SerializationError};
use crate::message::{JobId, MessageId, ReceiptHandle, WireMessage};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;

/// One unit of work
///
/// Producers create jobs with [`Job::new`]; such a job has no receipt handle
/// and cannot be removed from a queue. Jobs returned by
/// [`Queue::jobs`](crate::Queue::jobs) always carry one.
#[derive(Debug, Clone)]
pub struct Job {
    id: JobId,
    payload: Value,
    delivery: Option<Delivery>,
}

/// Service metadata attached to a retrieved job
#[derive(Debug, Clone)]
struct Delivery {
    receipt_handle: ReceiptHandle,
    message_id: MessageId,
    receive_count: u32,
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    id: &'a JobId,
    payload: &'a Value,
}

#[derive(Deserialize)]
struct Envelope {
    id: JobId,
    payload: Value,
}

impl Job {
    /// Create a new job for publishing
    pub fn new(payload: impl Into<Value>) -> Self {
        Self {
            id: JobId::new(),
            payload: payload.into(),
            delivery: None,
        }
    }

    /// Create a job from any serializable payload
    pub fn from_serializable<T: Serialize>(payload: &T) -> Result<Self, SerializationError> {
        Ok(Self::new(serde_json::to_value(payload)?))
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn into_payload(self) -> Value {
        self.payload
    }

    /// Deserialize the payload into a concrete type
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, SerializationError> {
        Ok(serde_json::from_value(self.payload.clone())?)
    }

    /// Receipt handle for acknowledgment, present only on retrieved jobs
    pub fn handle(&self) -> Option<&ReceiptHandle> {
        self.delivery.as_ref().map(|d| &d.receipt_handle)
    }

    /// Service-assigned message ID, present only on retrieved jobs
    pub fn message_id(&self) -> Option<&MessageId> {
        self.delivery.as_ref().map(|d| &d.message_id)
    }

    /// Approximate number of deliveries so far; zero for unpublished jobs
    pub fn receive_count(&self) -> u32 {
        self.delivery.as_ref().map_or(0, |d| d.receive_count)
    }

    /// Serialize into a message body
    pub fn to_wire(&self) -> Result<Bytes, SerializationError> {
        let envelope = EnvelopeRef {
            id: &self.id,
            payload: &self.payload,
        };
        Ok(Bytes::from(serde_json::to_vec(&envelope)?))
    }

    /// Rebuild a job from a delivered message, capturing its receipt handle
    pub fn from_wire(message: WireMessage) -> Result<Self, QueueError> {
        let malformed = |reason: String| QueueError::MalformedMessage {
            message_id: message.message_id.clone(),
            reason,
        };

        let body = std::str::from_utf8(&message.body)
            .map_err(|_| malformed(SerializationError::InvalidUtf8.to_string()))?;
        let envelope: Envelope =
            serde_json::from_str(body).map_err(|e| malformed(e.to_string()))?;

        Ok(Self {
            id: envelope.id,
            payload: envelope.payload,
            delivery: Some(Delivery {
                receipt_handle: message.receipt_handle,
                message_id: message.message_id,
                receive_count: message.receive_count,
            }),
        })
    }
}

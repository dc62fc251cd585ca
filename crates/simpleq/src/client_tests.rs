//! Contract tests for `QueueServiceClient` implementations.
//!
//! Each contract is a generic helper so any implementation can be checked
//! against it. They run here against the in-memory service.

use super::*;
use crate::providers::InMemoryQueueService;

fn queue_name(name: &str) -> QueueName {
    QueueName::new(name.to_string()).unwrap()
}

// ============================================================================
// Contract Helpers
// ============================================================================

/// `get_queue` reports absence as `None`, and `create_queue` is idempotent
async fn contract_get_or_create<C: QueueServiceClient + ?Sized>(client: &C) {
    let name = queue_name("contract-create");

    assert!(client.get_queue(&name).await.unwrap().is_none());

    let created = client.create_queue(&name).await.unwrap();
    assert_eq!(created.name(), &name);
    assert!(!created.url().is_empty());

    let found = client.get_queue(&name).await.unwrap();
    assert_eq!(found, Some(created.clone()));

    let again = client.create_queue(&name).await.unwrap();
    assert_eq!(again, created);
}

/// A published body comes back byte for byte with a usable receipt
async fn contract_publish_fetch_delete<C: QueueServiceClient + ?Sized>(client: &C) {
    let resource = client.create_queue(&queue_name("contract-io")).await.unwrap();
    let body = Bytes::from_static(b"\x00binary\xffbody");

    let message_id = client.publish(&resource, body.clone()).await.unwrap();
    let batch = client
        .fetch_batch(&resource, 10, Duration::zero())
        .await
        .unwrap();

    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].message_id, message_id);
    assert_eq!(batch[0].body, body);
    assert!(batch[0].receive_count >= 1);

    client
        .delete_message(&resource, &batch[0].receipt_handle)
        .await
        .unwrap();
}

/// Operations on a deleted queue report `QueueNotFound`
async fn contract_deleted_queue<C: QueueServiceClient + ?Sized>(client: &C) {
    let resource = client
        .create_queue(&queue_name("contract-delete"))
        .await
        .unwrap();
    client.delete_queue(&resource).await.unwrap();

    assert!(client
        .get_queue(resource.name())
        .await
        .unwrap()
        .is_none());
    assert!(matches!(
        client.publish(&resource, Bytes::from_static(b"x")).await,
        Err(ServiceError::QueueNotFound(_))
    ));
}

// ============================================================================
// In-Memory Service
// ============================================================================

mod in_memory {
    use super::*;

    #[tokio::test]
    async fn test_get_or_create_contract() {
        contract_get_or_create(&InMemoryQueueService::default()).await;
    }

    #[tokio::test]
    async fn test_publish_fetch_delete_contract() {
        contract_publish_fetch_delete(&InMemoryQueueService::default()).await;
    }

    #[tokio::test]
    async fn test_deleted_queue_contract() {
        contract_deleted_queue(&InMemoryQueueService::default()).await;
    }

    #[tokio::test]
    async fn test_usable_as_trait_object() {
        let client: std::sync::Arc<dyn QueueServiceClient> =
            std::sync::Arc::new(InMemoryQueueService::default());

        contract_get_or_create(&*client).await;
        assert_eq!(client.region(), "local");
    }
}

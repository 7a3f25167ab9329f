//! Tests for the mq-runtime library module.

use super::*;
use std::sync::Arc;

#[test]
fn test_default_config_is_valid() {
    let config = QueueConfig::default();

    assert!(config.validate().is_ok());
    assert_eq!(config.queue_name.as_str(), "DEV.QUEUE.1");
    assert_eq!(config.consumption, ConsumptionMode::Destructive);
    assert_eq!(config.default_message, DEFAULT_MESSAGE);
    assert_eq!(config.backend.kind(), BackendKind::InMemory);
}

#[test]
fn test_error_transience() {
    assert!(QueueError::Backend(BackendError::ConnectionLost {
        message: "network error".to_string(),
    })
    .is_transient());

    assert!(!QueueError::NotFound {
        message_id: "414D51".to_string(),
    }
    .is_transient());

    assert!(!QueueError::Validation(ValidationError::Required {
        field: "quantity".to_string(),
    })
    .is_transient());
}

#[tokio::test]
async fn test_put_then_get_round_trip_through_public_api() {
    let backend = InMemoryBackend::default();
    let client: Arc<dyn QueueClient> = Arc::new(StandardQueueClient::with_backend(
        Arc::new(backend.clone()),
        QueueConfig::default(),
    ));

    let outcome = client
        .put(Some("hello".to_string()), Some("2".to_string()))
        .await
        .unwrap();
    let first = client.get(None).await.unwrap();
    let rest = client.get(Some("5".to_string())).await.unwrap();

    assert_eq!(outcome.message_ids.len(), 2);
    assert_eq!(first.len(), 1);
    assert_eq!(rest.len(), 1);
    assert_eq!(first[0].id, outcome.message_ids[0]);
    assert_eq!(rest[0].id, outcome.message_ids[1]);
}

#[tokio::test]
async fn test_client_is_shareable_across_tasks() {
    let backend = InMemoryBackend::default();
    let client: Arc<dyn QueueClient> = Arc::new(StandardQueueClient::with_backend(
        Arc::new(backend.clone()),
        QueueConfig::default(),
    ));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let client = Arc::clone(&client);
            tokio::spawn(async move {
                client
                    .put(Some("concurrent".to_string()), Some("3".to_string()))
                    .await
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }

    assert_eq!(backend.put_count(), 12);
    assert_eq!(backend.connect_count(), 1);
}

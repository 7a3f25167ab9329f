//! Tests for queue client configuration.

use super::*;

#[test]
fn test_default_config_is_valid_in_memory() {
    let config = QueueConfig::default();

    assert_eq!(config.queue_name.as_str(), "DEV.QUEUE.1");
    assert_eq!(config.consumption, ConsumptionMode::Destructive);
    assert_eq!(config.backend.kind(), BackendKind::InMemory);
    assert_eq!(config.cleanup_timeout(), Duration::from_secs(5));
    assert_eq!(config.max_quantity, DEFAULT_MAX_QUANTITY);
    assert!(config.validate().is_ok());
}

#[test]
fn test_zero_max_quantity_is_rejected() {
    let config = QueueConfig {
        max_quantity: 0,
        ..Default::default()
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigurationError::Invalid { .. })
    ));
}

#[test]
fn test_zero_timeouts_are_rejected() {
    let config = QueueConfig {
        cleanup_timeout_ms: 0,
        ..Default::default()
    };
    assert!(config.validate().is_err());

    let config = QueueConfig {
        connect_timeout_ms: 0,
        ..Default::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_backend_config_deserializes_from_tagged_json() {
    let json = r#"{
        "queue_name": "ORDERS.IN",
        "consumption": "browse",
        "backend": {
            "type": "rest",
            "base_url": "https://mq.example.com:9443",
            "queue_manager": "QM2",
            "username": "app",
            "password": "secret"
        }
    }"#;

    let config: QueueConfig = serde_json::from_str(json).unwrap();

    assert_eq!(config.queue_name.as_str(), "ORDERS.IN");
    assert_eq!(config.consumption, ConsumptionMode::Browse);
    assert_eq!(config.cleanup_timeout_ms, 5_000);
    match &config.backend {
        BackendConfig::Rest(rest) => {
            assert_eq!(rest.queue_manager, "QM2");
            assert!(rest.verify_on_connect);
        }
        other => panic!("Expected REST backend, got: {:?}", other),
    }
    assert!(config.validate().is_ok());
}

#[test]
fn test_rest_config_requires_password_with_username() {
    let rest = RestBackendConfig {
        username: Some("app".to_string()),
        password: None,
        ..Default::default()
    };

    assert!(matches!(
        rest.validate(),
        Err(ConfigurationError::Missing { .. })
    ));
}

#[test]
fn test_rest_config_rejects_bad_url() {
    let rest = RestBackendConfig {
        base_url: "not a url".to_string(),
        ..Default::default()
    };
    assert!(rest.validate().is_err());

    let rest = RestBackendConfig {
        base_url: "ftp://mq.example.com".to_string(),
        ..Default::default()
    };
    assert!(rest.validate().is_err());
}

#[test]
fn test_rest_config_debug_redacts_password() {
    let rest = RestBackendConfig {
        username: Some("app".to_string()),
        password: Some("hunter2".to_string()),
        ..Default::default()
    };

    let debug = format!("{:?}", rest);
    assert!(!debug.contains("hunter2"));
    assert!(debug.contains("<REDACTED>"));
}

#[test]
fn test_backend_kind_browse_support() {
    assert!(BackendKind::InMemory.supports_multi_browse());
    assert!(!BackendKind::Rest.supports_multi_browse());
}

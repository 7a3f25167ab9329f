//! Tests for [`ServiceConfig`] loading and validation.

use super::*;
use mq_runtime::{BackendConfig, ConsumptionMode};
use serial_test::serial;
use std::path::PathBuf;

/// Write `contents` to a uniquely named YAML file in the temp directory
fn write_config_file(contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("mq-gateway-{}.yaml", uuid::Uuid::new_v4()));
    std::fs::write(&path, contents).unwrap();
    path
}

// ============================================================================
// Defaults
// ============================================================================

mod default_tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServiceConfig::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.shutdown_timeout(), Duration::from_secs(30));
        assert!(config.server.enable_cors);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json_format);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bind_address_joins_host_and_port() {
        let server = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 9090,
            ..ServerConfig::default()
        };

        assert_eq!(server.bind_address(), "127.0.0.1:9090");
    }
}

// ============================================================================
// Validation
// ============================================================================

mod validate_tests {
    use super::*;

    #[test]
    fn test_zero_shutdown_timeout_is_rejected() {
        let mut config = ServiceConfig::default();
        config.server.shutdown_timeout_seconds = 0;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_blank_host_is_missing() {
        let mut config = ServiceConfig::default();
        config.server.host = "  ".to_string();

        match config.validate() {
            Err(ConfigError::Missing { key }) => assert_eq!(key, "server.host"),
            other => panic!("Expected Missing, got: {:?}", other),
        }
    }

    #[test]
    fn test_log_level_is_case_insensitive() {
        let mut config = ServiceConfig::default();
        config.logging.level = "DEBUG".to_string();
        assert!(config.validate().is_ok());

        config.logging.level = "verbose".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_invalid_queue_settings_are_reported() {
        let mut config = ServiceConfig::default();
        config.queue.connect_timeout_ms = 0;

        match config.validate() {
            Err(ConfigError::Invalid { message }) => {
                assert!(message.starts_with("queue:"), "message: {}", message)
            }
            other => panic!("Expected Invalid, got: {:?}", other),
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

mod load_tests {
    use super::*;

    #[test]
    #[serial]
    fn test_load_from_yaml_file() {
        // Arrange
        let path = write_config_file(
            r#"
server:
  port: 9191
  enable_cors: false
logging:
  level: debug
  json_format: true
queue:
  queue_name: APP.ORDERS
  consumption: browse
  backend:
    type: rest
    base_url: "https://mq.example.com:9443"
    queue_manager: QM2
"#,
        );

        // Act
        let config = ServiceConfig::load_from(path.to_str()).unwrap();
        std::fs::remove_file(&path).ok();

        // Assert
        assert_eq!(config.server.port, 9191);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(!config.server.enable_cors);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json_format);
        assert_eq!(config.queue.queue_name.as_str(), "APP.ORDERS");
        assert_eq!(config.queue.consumption, ConsumptionMode::Browse);
        match &config.queue.backend {
            BackendConfig::Rest(rest) => {
                assert_eq!(rest.base_url, "https://mq.example.com:9443");
                assert_eq!(rest.queue_manager, "QM2");
            }
            other => panic!("Expected REST backend, got: {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_missing_explicit_file_is_an_error() {
        let path = std::env::temp_dir().join(format!("absent-{}.yaml", uuid::Uuid::new_v4()));

        let result = ServiceConfig::load_from(path.to_str());

        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    #[serial]
    fn test_invalid_queue_name_in_file_is_an_error() {
        let path = write_config_file("queue:\n  queue_name: \"not a queue\"\n");

        let result = ServiceConfig::load_from(path.to_str());
        std::fs::remove_file(&path).ok();

        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_environment_overrides_file() {
        // Arrange
        let path = write_config_file("server:\n  port: 9191\n");
        std::env::set_var("MQG__SERVER__PORT", "9292");
        std::env::set_var("MQG__LOGGING__LEVEL", "warn");

        // Act
        let result = ServiceConfig::load_from(path.to_str());
        std::env::remove_var("MQG__SERVER__PORT");
        std::env::remove_var("MQG__LOGGING__LEVEL");
        std::fs::remove_file(&path).ok();

        // Assert
        let config = result.unwrap();
        assert_eq!(config.server.port, 9292);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    #[serial]
    fn test_invalid_override_fails_validation() {
        std::env::set_var("MQG__SERVER__SHUTDOWN_TIMEOUT_SECONDS", "0");

        let result = ServiceConfig::load_from(None);
        std::env::remove_var("MQG__SERVER__SHUTDOWN_TIMEOUT_SECONDS");

        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    #[serial]
    fn test_load_reads_path_from_environment() {
        let path = write_config_file("server:\n  port: 9393\n");
        std::env::set_var(CONFIG_FILE_ENV, path.to_str().unwrap());

        let result = ServiceConfig::load();
        std::env::remove_var(CONFIG_FILE_ENV);
        std::fs::remove_file(&path).ok();

        assert_eq!(result.unwrap().server.port, 9393);
    }
}

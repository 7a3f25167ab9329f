//! Tests for error types.

use super::*;

#[test]
fn test_error_transience() {
    assert!(QueueError::Backend(BackendError::ConnectionLost {
        message: "socket reset".to_string(),
    })
    .is_transient());

    assert!(!QueueError::Backend(BackendError::Rejected {
        status: 400,
        message: "bad request".to_string(),
    })
    .is_transient());

    assert!(QueueError::Connection(ConnectionError::ConnectFailed {
        message: "refused".to_string(),
    })
    .is_transient());

    assert!(!QueueError::Connection(ConnectionError::Closed).is_transient());

    assert!(!QueueError::NotFound {
        message_id: "abc".to_string(),
    }
    .is_transient());

    assert!(QueueError::Timeout {
        operation: "cleanup".to_string(),
        duration: Duration::from_secs(5),
    }
    .is_transient());
}

#[test]
fn test_validation_errors_are_never_transient() {
    let err = QueueError::from(ValidationError::Required {
        field: "quantity".to_string(),
    });

    assert!(err.is_validation());
    assert!(!err.is_transient());
}

#[test]
fn test_connection_failure_classification() {
    assert!(BackendError::Closed.is_connection_failure());
    assert!(BackendError::Unavailable {
        message: "down".to_string()
    }
    .is_connection_failure());
    assert!(!BackendError::Protocol {
        message: "missing header".to_string()
    }
    .is_connection_failure());
}

#[test]
fn test_error_display_includes_cause() {
    let err = QueueError::from(BackendError::Rejected {
        status: 403,
        message: "not authorised".to_string(),
    });

    let text = err.to_string();
    assert!(text.contains("403"));
    assert!(text.contains("not authorised"));
}

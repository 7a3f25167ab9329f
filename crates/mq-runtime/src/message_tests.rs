//! Tests for message types and input normalization.

use super::*;

// ============================================================================
// QueueName Tests
// ============================================================================

mod queue_name_tests {
    use super::*;

    #[test]
    fn test_valid_queue_names() {
        assert!(QueueName::new("DEV.QUEUE.1".to_string()).is_ok());
        assert!(QueueName::new("orders_in".to_string()).is_ok());
        assert!(QueueName::new("Q".to_string()).is_ok());
    }

    #[test]
    fn test_invalid_queue_names() {
        assert!(QueueName::new(String::new()).is_err());
        assert!(QueueName::new("a".repeat(49)).is_err());
        assert!(QueueName::new("has space".to_string()).is_err());
        assert!(QueueName::new("dash-name".to_string()).is_err());
    }

    #[test]
    fn test_queue_name_deserialization_validates() {
        let ok: Result<QueueName, _> = serde_json::from_str("\"DEV.QUEUE.1\"");
        assert!(ok.is_ok());

        let bad: Result<QueueName, _> = serde_json::from_str("\"bad name\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_default_queue_name_is_valid() {
        let name = QueueName::default();
        assert!(QueueName::new(name.as_str().to_string()).is_ok());
    }
}

// ============================================================================
// MessageId Tests
// ============================================================================

mod message_id_tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = MessageId::generate();
        let b = MessageId::generate();
        assert_ne!(a, b);
        assert!(!a.as_str().is_empty());
    }

    #[test]
    fn test_empty_id_is_rejected() {
        let err = "".parse::<MessageId>().unwrap_err();
        assert_eq!(
            err,
            ValidationError::Required {
                field: "msgid".to_string()
            }
        );
    }

    #[test]
    fn test_whitespace_id_is_kept_verbatim() {
        let id: MessageId = "   ".parse().unwrap();
        assert_eq!(id.as_str(), "   ");
    }

    #[test]
    fn test_message_serializes_flat_fields() {
        let message = Message::new(
            "414d5120".parse().unwrap(),
            "hello",
            "2024-01-02T03:04:05Z".parse().unwrap(),
        );

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["id"], "414d5120");
        assert_eq!(json["body"], "hello");
        assert_eq!(json["enqueued_at"], "2024-01-02T03:04:05Z");
    }
}

// ============================================================================
// PutRequest Normalization Tests
// ============================================================================

mod put_request_tests {
    use super::*;

    fn quantity_of(raw: &str) -> Result<u32, ValidationError> {
        PutRequest::parse(Some("hello"), Some(raw), DEFAULT_MESSAGE, u32::MAX)
            .map(|r| r.quantity())
    }

    #[test]
    fn test_positive_quantity_passes_through() {
        assert_eq!(quantity_of("3").unwrap(), 3);
        assert_eq!(quantity_of("+7").unwrap(), 7);
    }

    #[test]
    fn test_negative_quantity_is_negated() {
        assert_eq!(quantity_of("-5").unwrap(), 5);
        assert_eq!(quantity_of("-2").unwrap(), 2);
    }

    #[test]
    fn test_zero_quantity_becomes_one() {
        assert_eq!(quantity_of("0").unwrap(), 1);
        assert_eq!(quantity_of("-0").unwrap(), 1);
    }

    #[test]
    fn test_non_numeric_quantity_is_rejected() {
        assert!(matches!(
            quantity_of("abc"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(quantity_of("").is_err());
        assert!(quantity_of("-").is_err());
        assert!(quantity_of("  ").is_err());
    }

    #[test]
    fn test_missing_quantity_is_rejected() {
        let result = PutRequest::parse(Some("hello"), None, DEFAULT_MESSAGE, u32::MAX);
        assert!(result.is_err());
    }

    #[test]
    fn test_leading_integer_is_used() {
        assert_eq!(quantity_of("12abc").unwrap(), 12);
        assert_eq!(quantity_of("3.7").unwrap(), 3);
        assert_eq!(quantity_of("  4").unwrap(), 4);
    }

    #[test]
    fn test_oversized_quantity_is_rejected() {
        assert!(matches!(
            quantity_of("4294967296"),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(matches!(
            quantity_of("99999999999999999999999"),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_quantity_above_configured_maximum_is_rejected() {
        // Arrange
        let max_quantity = 100;

        // Act
        let at_limit = PutRequest::parse(Some("m"), Some("100"), DEFAULT_MESSAGE, max_quantity);
        let negated_over =
            PutRequest::parse(Some("m"), Some("-101"), DEFAULT_MESSAGE, max_quantity);
        let over = PutRequest::parse(Some("m"), Some("1000000000"), DEFAULT_MESSAGE, max_quantity);

        // Assert
        assert_eq!(at_limit.unwrap().quantity(), 100);
        assert!(matches!(
            negated_over,
            Err(ValidationError::OutOfRange { .. })
        ));
        match over {
            Err(ValidationError::OutOfRange { field, message }) => {
                assert_eq!(field, "quantity");
                assert_eq!(message, "must not exceed 100");
            }
            other => panic!("Expected OutOfRange, got: {:?}", other),
        }
    }

    #[test]
    fn test_normalized_quantity_is_always_positive() {
        for raw in ["-100", "-1", "0", "1", "100", "7xyz", "-3.9"] {
            let quantity = quantity_of(raw).unwrap();
            assert!(quantity >= 1, "quantity for {:?} was {}", raw, quantity);
        }
    }

    #[test]
    fn test_missing_message_uses_default() {
        let request = PutRequest::parse(None, Some("1"), DEFAULT_MESSAGE, u32::MAX).unwrap();
        assert_eq!(request.message(), DEFAULT_MESSAGE);

        let request = PutRequest::parse(Some(""), Some("1"), "custom default", u32::MAX).unwrap();
        assert_eq!(request.message(), "custom default");
    }

    #[test]
    fn test_message_is_kept_verbatim() {
        let request = PutRequest::parse(Some("  spaced  "), Some("1"), DEFAULT_MESSAGE, u32::MAX)
            .unwrap();
        assert_eq!(request.message(), "  spaced  ");
    }

    #[test]
    fn test_new_rejects_zero_quantity() {
        assert!(PutRequest::new("hello", 0).is_err());
        assert_eq!(PutRequest::new("hello", 2).unwrap().quantity(), 2);
    }
}

// ============================================================================
// GetLimit Tests
// ============================================================================

mod get_limit_tests {
    use super::*;

    #[test]
    fn test_missing_limit_defaults_to_one() {
        assert_eq!(GetLimit::parse(None).unwrap().get(), 1);
        assert_eq!(GetLimit::parse(Some("")).unwrap().get(), 1);
        assert_eq!(GetLimit::default().get(), DEFAULT_LIMIT);
    }

    #[test]
    fn test_positive_limit_is_accepted() {
        assert_eq!(GetLimit::parse(Some("5")).unwrap().get(), 5);
        assert_eq!(GetLimit::parse(Some("2abc")).unwrap().get(), 2);
    }

    #[test]
    fn test_non_positive_limit_is_rejected() {
        assert!(GetLimit::parse(Some("0")).is_err());
        assert!(GetLimit::parse(Some("-1")).is_err());
        assert!(GetLimit::new(0).is_err());
    }

    #[test]
    fn test_non_numeric_limit_is_rejected() {
        assert!(matches!(
            GetLimit::parse(Some("many")),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }
}

use super::*;
use serde_json::json;

mod customer_id_tests {
    use super::*;

    #[test]
    fn test_customer_id_trims_whitespace() {
        let id = CustomerId::new("  acme-corp ").unwrap();
        assert_eq!(id.as_str(), "acme-corp");
        assert_eq!(id.to_string(), "acme-corp");
    }

    #[test]
    fn test_blank_customer_id_is_required_error() {
        assert_eq!(
            CustomerId::new("   "),
            Err(ValidationError::Required {
                field: "customer_id".to_string()
            })
        );
    }

    #[test]
    fn test_overlong_customer_id_is_rejected() {
        let long = "x".repeat(CustomerId::MAX_LENGTH + 1);
        assert!(matches!(
            CustomerId::new(long),
            Err(ValidationError::TooLong { max_length, .. }) if max_length == CustomerId::MAX_LENGTH
        ));
    }
}

mod installation_id_tests {
    use super::*;

    #[test]
    fn test_number_and_numeric_string_are_equivalent() {
        let from_number = parse_installation_id(&json!(12345)).unwrap();
        let from_string = parse_installation_id(&json!("12345")).unwrap();
        assert_eq!(from_number, from_string);
    }

    #[test]
    fn test_rejects_non_positive_and_non_integer_values() {
        for value in [
            json!(0),
            json!(-3),
            json!(4.5),
            json!("0"),
            json!("12abc"),
            json!(""),
            json!(null),
            json!(true),
            json!([42]),
        ] {
            assert_eq!(
                parse_installation_id(&value),
                Err(ValidationError::InvalidInstallationId),
                "value {value} should be rejected"
            );
        }
    }
}

#[test]
fn test_missing_fields_message_lists_every_field() {
    let error = ValidationError::MissingFields {
        fields: vec!["owner".to_string(), "body".to_string()],
    };
    assert_eq!(error.to_string(), "Missing required fields: owner, body");
}

#[test]
fn test_github_validation_errors_convert() {
    let converted: ValidationError = hud_bridge_github::ValidationError::InvalidFormat {
        field: "installation_id".to_string(),
        message: "must be a positive integer".to_string(),
    }
    .into();

    assert_eq!(
        converted,
        ValidationError::InvalidFormat {
            field: "installation_id".to_string(),
            message: "must be a positive integer".to_string(),
        }
    );
}

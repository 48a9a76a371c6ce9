//! Resource configuration checks backed by `jsonschema`.

use serde_json::Value;

use crate::error::AppError;

/// Rejects anything but a JSON object.
pub fn ensure_object(configuration: &Value) -> Result<(), AppError> {
    if configuration.is_object() {
        Ok(())
    } else {
        Err(AppError::validation("configuration: must be a JSON object"))
    }
}

/// Validates a request configuration against a resource type's JSON Schema.
///
/// A schema that does not compile is a catalog defect and surfaces as an
/// internal error, not a caller mistake.
pub fn validate_configuration(schema: &Value, configuration: &Value) -> Result<(), AppError> {
    ensure_object(configuration)?;
    let validator = jsonschema::validator_for(schema)
        .map_err(|err| AppError::internal(format!("invalid resource type schema: {}", err)))?;

    let mut errors: Vec<String> = validator
        .iter_errors(configuration)
        .map(|err| format!("configuration: {}", err))
        .collect();
    if errors.is_empty() {
        return Ok(());
    }
    errors.sort();
    Err(AppError::Validation(errors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn redis_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "memory_size_gb": {"type": "integer", "minimum": 1, "maximum": 16},
                "tier": {"type": "string", "enum": ["BASIC", "STANDARD_HA"]}
            },
            "required": ["memory_size_gb", "tier"]
        })
    }

    #[test]
    fn valid_configuration_passes() {
        let config = json!({"memory_size_gb": 4, "tier": "BASIC"});
        assert!(validate_configuration(&redis_schema(), &config).is_ok());
    }

    #[test]
    fn every_violation_is_reported() {
        let config = json!({"memory_size_gb": 64});
        let err = validate_configuration(&redis_schema(), &config).unwrap_err();
        match err {
            AppError::Validation(errors) => {
                assert_eq!(errors.len(), 2, "{errors:?}");
                assert!(errors.iter().all(|e| e.starts_with("configuration: ")));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_object_configuration_is_rejected() {
        let err = validate_configuration(&redis_schema(), &json!([1, 2])).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(ensure_object(&json!("text")).is_err());
        assert!(ensure_object(&json!({})).is_ok());
    }

    #[test]
    fn broken_schema_is_internal() {
        let schema = json!({"type": "no-such-type"});
        let err = validate_configuration(&schema, &json!({})).unwrap_err();
        assert!(matches!(err, AppError::InternalServerError(_)));
    }
}

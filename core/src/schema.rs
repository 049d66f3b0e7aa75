//! JSON Schema contract validation.
//!
//! A failed validation reports every violation rather than a bare "invalid",
//! so schema drift can be diagnosed from the error message alone.

use std::fmt;
use std::path::{Path, PathBuf};

use jsonschema::{validator_for, Validator};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("schema violation: {}", .violations.join("; "))]
    Violation { violations: Vec<String> },
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    #[error("failed to read schema {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("schema is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

impl SchemaError {
    /// The individual violation messages, empty for non-violation errors.
    pub fn violations(&self) -> &[String] {
        match self {
            SchemaError::Violation { violations } => violations,
            _ => &[],
        }
    }
}

/// A compiled schema. Compile once, validate any number of instances.
pub struct SchemaValidator {
    validator: Validator,
}

impl SchemaValidator {
    pub fn new(schema: &Value) -> Result<Self, SchemaError> {
        let validator = validator_for(schema).map_err(|e| SchemaError::InvalidSchema(e.to_string()))?;
        Ok(Self { validator })
    }

    pub fn from_str(schema: &str) -> Result<Self, SchemaError> {
        let schema: Value = serde_json::from_str(schema)?;
        Self::new(&schema)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let schema = load_schema(path)?;
        Self::new(&schema)
    }

    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validator.is_valid(instance)
    }

    pub fn validate(&self, instance: &Value) -> Result<(), SchemaError> {
        let violations: Vec<String> = self
            .validator
            .iter_errors(instance)
            .map(|error| error.to_string())
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::Violation { violations })
        }
    }
}

impl fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaValidator").finish_non_exhaustive()
    }
}

/// Read and parse a schema document from disk.
pub fn load_schema(path: impl AsRef<Path>) -> Result<Value, SchemaError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| SchemaError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&raw)?)
}

/// Validate `instance` against `schema` in one step.
pub fn validate(instance: &Value, schema: &Value) -> Result<(), SchemaError> {
    SchemaValidator::new(schema)?.validate(instance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_schema() -> Value {
        json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "type": "object",
            "required": ["data"],
            "properties": {
                "data": {
                    "type": "object",
                    "required": ["id", "email"],
                    "properties": {
                        "id": { "type": "integer" },
                        "email": { "type": "string" }
                    }
                }
            }
        })
    }

    #[test]
    fn conforming_instance_passes() {
        let instance = json!({"data": {"id": 2, "email": "janet.weaver@reqres.in"}});
        validate(&instance, &user_schema()).unwrap();
    }

    #[test]
    fn missing_field_is_named() {
        let instance = json!({"data": {"id": 2}});
        let err = validate(&instance, &user_schema()).unwrap_err();
        assert!(matches!(err, SchemaError::Violation { .. }));
        let message = err.to_string();
        assert!(message.contains("email"), "message should name the field: {message}");
    }

    #[test]
    fn every_violation_is_reported() {
        let instance = json!({"data": {"id": "two"}});
        let err = validate(&instance, &user_schema()).unwrap_err();
        assert_eq!(err.violations().len(), 2, "{err}");
    }

    #[test]
    fn inputs_are_not_mutated() {
        let instance = json!({"data": {"id": 2}});
        let schema = user_schema();
        let (before_i, before_s) = (instance.clone(), schema.clone());
        let _ = validate(&instance, &schema);
        assert_eq!(instance, before_i);
        assert_eq!(schema, before_s);
    }

    #[test]
    fn compiled_validator_is_reusable() {
        let validator = SchemaValidator::new(&user_schema()).unwrap();
        assert!(validator.validate(&json!({"data": {"id": 1}})).is_err());
        assert!(validator.validate(&json!({"data": {"id": 1, "email": "a@b"}})).is_ok());
        assert!(validator.is_valid(&json!({"data": {"id": 3, "email": "c@d"}})));
    }

    #[test]
    fn malformed_schema_is_rejected() {
        let err = SchemaValidator::new(&json!({"type": 12})).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidSchema(_)));
    }

    #[test]
    fn schema_text_must_be_json() {
        let err = SchemaValidator::from_str("{not json").unwrap_err();
        assert!(matches!(err, SchemaError::Parse(_)));
    }

    #[test]
    fn missing_schema_file() {
        let err = SchemaValidator::from_file("/nonexistent/user.schema.json").unwrap_err();
        assert!(matches!(err, SchemaError::Read { .. }));
    }
}

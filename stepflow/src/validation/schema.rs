//! The parse-or-fail schema contract.

use super::ValidationError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;

/// Parses one request facet, producing its validated value.
///
/// Any `Fn(&Value) -> Result<Value, ValidationError>` closure is a schema.
pub trait Schema: Send + Sync {
    /// Parses `input`.
    ///
    /// # Errors
    ///
    /// Returns the issues found when the input does not conform.
    fn parse(&self, input: &Value) -> Result<Value, ValidationError>;
}

impl<F> Schema for F
where
    F: Fn(&Value) -> Result<Value, ValidationError> + Send + Sync,
{
    fn parse(&self, input: &Value) -> Result<Value, ValidationError> {
        self(input)
    }
}

/// Schema backed by a typed `serde` model.
///
/// The facet is deserialized into `T` and serialized back, so the
/// validated value carries `T`'s defaults and drops unknown fields.
pub struct SerdeSchema<T> {
    _model: PhantomData<fn() -> T>,
}

impl<T> SerdeSchema<T> {
    /// Creates the schema.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _model: PhantomData,
        }
    }
}

impl<T> Default for SerdeSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SerdeSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerdeSchema")
            .field("model", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> Schema for SerdeSchema<T>
where
    T: DeserializeOwned + Serialize,
{
    fn parse(&self, input: &Value) -> Result<Value, ValidationError> {
        let model: T = serde_json::from_value(input.clone())
            .map_err(|err| ValidationError::single("", err.to_string()))?;
        serde_json::to_value(model).map_err(|err| ValidationError::single("", err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize)]
    struct CreateTask {
        title: String,
        #[serde(default)]
        priority: u8,
    }

    #[test]
    fn test_serde_schema_applies_defaults() {
        let schema = SerdeSchema::<CreateTask>::new();
        let parsed = schema
            .parse(&json!({"title": "Write docs", "ignored": true}))
            .unwrap();
        assert_eq!(parsed, json!({"title": "Write docs", "priority": 0}));
    }

    #[test]
    fn test_serde_schema_rejects() {
        let err = SerdeSchema::<CreateTask>::new()
            .parse(&json!({"priority": 1}))
            .unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert!(err.issues[0].message.contains("title"));
    }

    #[test]
    fn test_closure_is_schema() {
        let upper = |input: &Value| -> Result<Value, ValidationError> {
            input
                .as_str()
                .map(|s| Value::String(s.to_uppercase()))
                .ok_or_else(|| ValidationError::single("", "Expected string"))
        };
        assert_eq!(upper.parse(&json!("abc")).unwrap(), json!("ABC"));
        assert!(upper.parse(&json!(1)).is_err());
    }
}

//! Rule-based object schema for request facets.

use super::{Issue, Schema, ValidationError};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

#[allow(clippy::unwrap_used)]
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldType {
    String,
    Email,
    Boolean,
    Integer,
}

/// Rules for one field of an [`ObjectSchema`].
#[derive(Debug, Clone)]
pub struct FieldRule {
    ty: FieldType,
    optional: bool,
    default: Option<Value>,
    min_len: Option<usize>,
    max_len: Option<usize>,
    one_of: Option<Vec<String>>,
    message: Option<String>,
}

impl FieldRule {
    const fn of(ty: FieldType) -> Self {
        Self {
            ty,
            optional: false,
            default: None,
            min_len: None,
            max_len: None,
            one_of: None,
            message: None,
        }
    }

    /// A string field.
    #[must_use]
    pub const fn string() -> Self {
        Self::of(FieldType::String)
    }

    /// A string field holding an email address.
    #[must_use]
    pub const fn email() -> Self {
        Self::of(FieldType::Email)
    }

    /// A boolean field. `"true"` and `"false"` strings are accepted.
    #[must_use]
    pub const fn boolean() -> Self {
        Self::of(FieldType::Boolean)
    }

    /// An integer field. Numeric strings are accepted.
    #[must_use]
    pub const fn integer() -> Self {
        Self::of(FieldType::Integer)
    }

    /// The field may be absent.
    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Value used when the field is absent.
    #[must_use]
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Minimum string length in characters.
    #[must_use]
    pub const fn min_len(mut self, len: usize) -> Self {
        self.min_len = Some(len);
        self
    }

    /// Maximum string length in characters.
    #[must_use]
    pub const fn max_len(mut self, len: usize) -> Self {
        self.max_len = Some(len);
        self
    }

    /// Restricts a string field to the given values.
    #[must_use]
    pub fn one_of<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.one_of = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Replaces the message of every check except presence.
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn fail(&self, default_message: String) -> String {
        self.message.clone().unwrap_or(default_message)
    }

    fn check(&self, value: &Value) -> Result<Value, String> {
        match self.ty {
            FieldType::String | FieldType::Email => self.check_string(value),
            FieldType::Boolean => match value {
                Value::Bool(_) => Ok(value.clone()),
                Value::String(s) if s == "true" => Ok(Value::Bool(true)),
                Value::String(s) if s == "false" => Ok(Value::Bool(false)),
                _ => Err(self.fail("Expected boolean".into())),
            },
            FieldType::Integer => match value {
                Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value.clone()),
                Value::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(Value::from)
                    .map_err(|_| self.fail("Expected integer".into())),
                _ => Err(self.fail("Expected integer".into())),
            },
        }
    }

    fn check_string(&self, value: &Value) -> Result<Value, String> {
        let Some(s) = value.as_str() else {
            return Err(self.fail("Expected string".into()));
        };

        if self.ty == FieldType::Email && !EMAIL_RE.is_match(s) {
            return Err(self.fail("Invalid email format".into()));
        }

        let len = s.chars().count();
        if let Some(min) = self.min_len {
            if len < min {
                return Err(self.fail(format!("Must be at least {min} characters")));
            }
        }
        if let Some(max) = self.max_len {
            if len > max {
                return Err(self.fail(format!("Must be at most {max} characters")));
            }
        }
        if let Some(ref allowed) = self.one_of {
            if !allowed.iter().any(|candidate| candidate == s) {
                return Err(self.fail(format!("Must be one of: {}", allowed.join(", "))));
            }
        }
        Ok(value.clone())
    }
}

/// Object schema built from per-field rules.
///
/// Declared fields are checked in declaration order and every issue is
/// reported. Undeclared keys are stripped from the parsed value. A `null`
/// input is treated as an empty object.
///
/// # Examples
///
/// ```
/// use stepflow::validation::{FieldRule, ObjectSchema, Schema};
/// use serde_json::json;
///
/// let schema = ObjectSchema::new()
///     .field("email", FieldRule::email())
///     .field("password", FieldRule::string().min_len(8));
///
/// let parsed = schema
///     .parse(&json!({"email": "a@b.io", "password": "hunter22", "admin": true}))
///     .unwrap();
/// assert_eq!(parsed, json!({"email": "a@b.io", "password": "hunter22"}));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    fields: Vec<(String, FieldRule)>,
}

impl ObjectSchema {
    /// Creates a schema with no fields.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, rule: FieldRule) -> Self {
        self.fields.push((name.into(), rule));
        self
    }
}

impl Schema for ObjectSchema {
    fn parse(&self, input: &Value) -> Result<Value, ValidationError> {
        let empty = Map::new();
        let object = match input {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => return Err(ValidationError::single("", "Expected object")),
        };

        let mut parsed = Map::new();
        let mut issues = Vec::new();

        for (name, rule) in &self.fields {
            match object.get(name).filter(|value| !value.is_null()) {
                Some(value) => match rule.check(value) {
                    Ok(value) => {
                        parsed.insert(name.clone(), value);
                    }
                    Err(message) => issues.push(Issue::new(name.as_str(), message)),
                },
                None => {
                    if let Some(ref default) = rule.default {
                        parsed.insert(name.clone(), default.clone());
                    } else if !rule.optional {
                        issues.push(Issue::new(name.as_str(), "Required"));
                    }
                }
            }
        }

        if issues.is_empty() {
            Ok(Value::Object(parsed))
        } else {
            Err(ValidationError::new(issues))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn signup() -> ObjectSchema {
        ObjectSchema::new()
            .field("email", FieldRule::email())
            .field(
                "password",
                FieldRule::string()
                    .min_len(8)
                    .message("Password must be at least 8 characters"),
            )
            .field("name", FieldRule::string().min_len(1))
    }

    #[test]
    fn test_valid_input_strips_unknown_keys() {
        let parsed = signup()
            .parse(&json!({
                "email": "ada@example.com",
                "password": "correct horse",
                "name": "Ada",
                "role": "admin"
            }))
            .unwrap();

        assert_eq!(
            parsed,
            json!({"email": "ada@example.com", "password": "correct horse", "name": "Ada"})
        );
    }

    #[test]
    fn test_reports_every_issue() {
        let err = signup()
            .parse(&json!({"email": "not-an-email", "password": "short"}))
            .unwrap_err();

        assert_eq!(
            err.issues,
            vec![
                Issue::new("email", "Invalid email format"),
                Issue::new("password", "Password must be at least 8 characters"),
                Issue::new("name", "Required"),
            ]
        );
    }

    #[test]
    fn test_null_input_is_empty_object() {
        let err = signup().parse(&Value::Null).unwrap_err();
        assert_eq!(err.issues.len(), 3);
        assert!(err.issues.iter().all(|issue| issue.message == "Required"));
    }

    #[test]
    fn test_non_object_rejected() {
        let err = signup().parse(&json!([1, 2])).unwrap_err();
        assert_eq!(err.issues, vec![Issue::new("", "Expected object")]);
    }

    #[test]
    fn test_optional_and_default() {
        let schema = ObjectSchema::new()
            .field("description", FieldRule::string().optional())
            .field("completed", FieldRule::boolean().with_default(json!(false)));

        assert_eq!(schema.parse(&json!({})).unwrap(), json!({"completed": false}));
    }

    #[test]
    fn test_string_coercion_for_query_values() {
        let schema = ObjectSchema::new()
            .field("done", FieldRule::boolean())
            .field("page", FieldRule::integer());

        assert_eq!(
            schema.parse(&json!({"done": "true", "page": "3"})).unwrap(),
            json!({"done": true, "page": 3})
        );

        let err = schema.parse(&json!({"done": "yes", "page": "x"})).unwrap_err();
        assert_eq!(
            err.issues,
            vec![
                Issue::new("done", "Expected boolean"),
                Issue::new("page", "Expected integer"),
            ]
        );
    }

    #[test]
    fn test_one_of_and_max_len() {
        let schema = ObjectSchema::new()
            .field("role", FieldRule::string().one_of(["user", "admin"]))
            .field("title", FieldRule::string().max_len(5));

        let err = schema
            .parse(&json!({"role": "root", "title": "too long"}))
            .unwrap_err();
        assert_eq!(
            err.issues,
            vec![
                Issue::new("role", "Must be one of: user, admin"),
                Issue::new("title", "Must be at most 5 characters"),
            ]
        );
    }

    #[test]
    fn test_type_mismatch() {
        let err = ObjectSchema::new()
            .field("title", FieldRule::string())
            .parse(&json!({"title": 42}))
            .unwrap_err();
        assert_eq!(err.issues, vec![Issue::new("title", "Expected string")]);
    }
}

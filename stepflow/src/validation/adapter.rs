//! Builds the initial context of a run from the incoming request.

use super::{Facet, Schema, ValidationError};
use crate::context::{Request, RequestContext, RequestInput};
use crate::core::{Failure, FailureKind};
use crate::dispatch::ResponseChannel;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// At most one schema per request facet.
#[derive(Clone, Default)]
pub struct ValidationSchemas {
    body: Option<Arc<dyn Schema>>,
    query: Option<Arc<dyn Schema>>,
    params: Option<Arc<dyn Schema>>,
    cookies: Option<Arc<dyn Schema>>,
}

impl ValidationSchemas {
    /// No schemas; every facet passes through raw.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the body schema.
    #[must_use]
    pub fn with_body(mut self, schema: impl Schema + 'static) -> Self {
        self.body = Some(Arc::new(schema));
        self
    }

    /// Sets the query schema.
    #[must_use]
    pub fn with_query(mut self, schema: impl Schema + 'static) -> Self {
        self.query = Some(Arc::new(schema));
        self
    }

    /// Sets the path-parameter schema.
    #[must_use]
    pub fn with_params(mut self, schema: impl Schema + 'static) -> Self {
        self.params = Some(Arc::new(schema));
        self
    }

    /// Sets the cookie schema.
    #[must_use]
    pub fn with_cookies(mut self, schema: impl Schema + 'static) -> Self {
        self.cookies = Some(Arc::new(schema));
        self
    }

    /// Sets the schema of `facet`.
    #[must_use]
    pub fn with(self, facet: Facet, schema: impl Schema + 'static) -> Self {
        match facet {
            Facet::Body => self.with_body(schema),
            Facet::Query => self.with_query(schema),
            Facet::Params => self.with_params(schema),
            Facet::Cookies => self.with_cookies(schema),
        }
    }

    /// The schema configured for `facet`.
    #[must_use]
    pub fn get(&self, facet: Facet) -> Option<&dyn Schema> {
        let slot = match facet {
            Facet::Body => &self.body,
            Facet::Query => &self.query,
            Facet::Params => &self.params,
            Facet::Cookies => &self.cookies,
        };
        slot.as_deref()
    }

    /// Returns true when no facet has a schema.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        Facet::ALL.iter().all(|facet| self.get(*facet).is_none())
    }

    /// Parses every facet of `input` that has a schema, in the order body,
    /// query, params, cookies. Stops at the first failing facet.
    ///
    /// # Errors
    ///
    /// Returns the failing facet's error, attributed to that facet.
    pub fn apply(&self, mut input: RequestInput) -> Result<RequestInput, ValidationError> {
        for facet in Facet::ALL {
            let Some(schema) = self.get(facet) else {
                continue;
            };
            let slot: &mut Value = match facet {
                Facet::Body => &mut input.body,
                Facet::Query => &mut input.query,
                Facet::Params => &mut input.params,
                Facet::Cookies => &mut input.cookies,
            };
            *slot = schema.parse(slot).map_err(|err| err.with_facet(facet))?;
        }
        Ok(input)
    }
}

impl fmt::Debug for ValidationSchemas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationSchemas")
            .field("body", &self.body.is_some())
            .field("query", &self.query.is_some())
            .field("params", &self.params.is_some())
            .field("cookies", &self.cookies.is_some())
            .finish()
    }
}

/// Validates `request` and assembles the initial context of a run.
///
/// # Errors
///
/// Returns a 400 `ValidationError` failure naming the offending facet and
/// fields. No step may run when this fails.
pub fn validate_request(
    schemas: &ValidationSchemas,
    request: Request,
    response: ResponseChannel,
    request_id: Uuid,
) -> Result<RequestContext, Failure> {
    let input = schemas
        .apply(RequestInput::from(request))
        .map_err(|err| Failure::of_kind(FailureKind::Validation, err.to_string()))?;
    Ok(RequestContext::new(input, request_id, response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{FieldRule, ObjectSchema};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn schemas() -> ValidationSchemas {
        ValidationSchemas::new()
            .with_body(ObjectSchema::new().field("email", FieldRule::email()))
            .with_query(ObjectSchema::new().field("page", FieldRule::integer().with_default(json!(1))))
    }

    #[test]
    fn test_parses_configured_facets() {
        let request = Request::post("/signup")
            .with_body(json!({"email": "ada@example.com", "extra": 1}))
            .with_param("id", "7");

        let ctx = validate_request(&schemas(), request, ResponseChannel::new(), Uuid::new_v4())
            .unwrap();

        assert_eq!(ctx.body(), &json!({"email": "ada@example.com"}));
        assert_eq!(ctx.query(), &json!({"page": 1}));
        // Unconfigured facets pass through raw.
        assert_eq!(ctx.params(), &json!({"id": "7"}));
    }

    #[test]
    fn test_failure_is_validation_error() {
        let request = Request::post("/signup").with_body(json!({}));

        let failure =
            validate_request(&schemas(), request, ResponseChannel::new(), Uuid::new_v4())
                .unwrap_err();

        assert_eq!(failure.status, 400);
        assert_eq!(failure.name.as_deref(), Some("ValidationError"));
        assert_eq!(failure.message, "Validation failed: body.email: Required");
    }

    #[test]
    fn test_body_checked_before_query() {
        let request = Request::post("/signup")
            .with_body(json!({"email": "nope"}))
            .with_query("page", "abc");

        let err = schemas().apply(RequestInput::from(request)).unwrap_err();
        assert_eq!(err.facet, Some(Facet::Body));
    }

    #[test]
    fn test_empty_schemas() {
        assert!(ValidationSchemas::new().is_empty());
        assert!(!schemas().is_empty());
        assert!(schemas().get(Facet::Cookies).is_none());
    }
}

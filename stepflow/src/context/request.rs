//! Framework-neutral incoming request and its validated input package.

use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use serde_json::{Map, Value};

/// An incoming request, before validation.
///
/// The HTTP edge fills this from the framework request; tests build it
/// directly with the `with_*` methods.
#[derive(Debug, Clone)]
pub struct Request {
    /// Request method.
    pub method: Method,
    /// Request path.
    pub path: String,
    /// Raw headers.
    pub headers: HeaderMap,
    /// Decoded body; `null` when there was none.
    pub body: Value,
    /// Query-string values.
    pub query: Map<String, Value>,
    /// Path parameters.
    pub params: Map<String, Value>,
    /// Cookies.
    pub cookies: Map<String, Value>,
}

impl Request {
    /// Creates an empty request.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: Value::Null,
            query: Map::new(),
            params: Map::new(),
            cookies: Map::new(),
        }
    }

    /// Shorthand for a `GET` request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Shorthand for a `POST` request.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Adds a query value.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), Value::String(value.into()));
        self
    }

    /// Adds a path parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), Value::String(value.into()));
        self
    }

    /// Adds a cookie.
    #[must_use]
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), Value::String(value.into()));
        self
    }

    /// Appends a header. Names or values that are not valid HTTP are
    /// skipped.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => tracing::warn!(header = name, "Skipping invalid request header"),
        }
        self
    }
}

/// The validated, read-only part of a request context.
///
/// Produced once per run and never modified afterwards.
#[derive(Debug, Clone)]
pub struct RequestInput {
    /// Request method.
    pub method: Method,
    /// Request path.
    pub path: String,
    /// Raw headers.
    pub headers: HeaderMap,
    /// Parsed body.
    pub body: Value,
    /// Parsed query.
    pub query: Value,
    /// Parsed path parameters.
    pub params: Value,
    /// Parsed cookies.
    pub cookies: Value,
}

impl From<Request> for RequestInput {
    /// Takes every facet as-is.
    fn from(request: Request) -> Self {
        Self {
            method: request.method,
            path: request.path,
            headers: request.headers,
            body: request.body,
            query: Value::Object(request.query),
            params: Value::Object(request.params),
            cookies: Value::Object(request.cookies),
        }
    }
}

//! The context every step of a run receives.

use super::RequestInput;
use crate::core::{Directive, Metadata};
use crate::dispatch::ResponseChannel;
use crate::errors::StepflowError;
use http::{HeaderMap, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Metadata keys that can never replace the validated request facets.
pub const FIXED_FIELDS: [&str; 4] = ["body", "query", "params", "cookies"];

/// Per-run context: the validated request plus metadata merged from the
/// steps that have completed so far.
///
/// Steps only see it by reference; they extend it by returning metadata.
#[derive(Debug, Clone)]
pub struct RequestContext {
    input: Arc<RequestInput>,
    request_id: Uuid,
    response: ResponseChannel,
    metadata: Metadata,
}

impl RequestContext {
    /// Creates the initial context of a run.
    #[must_use]
    pub fn new(input: RequestInput, request_id: Uuid, response: ResponseChannel) -> Self {
        Self {
            input: Arc::new(input),
            request_id,
            response,
            metadata: Metadata::new(),
        }
    }

    /// Parsed body.
    #[must_use]
    pub fn body(&self) -> &Value {
        &self.input.body
    }

    /// Parsed query.
    #[must_use]
    pub fn query(&self) -> &Value {
        &self.input.query
    }

    /// Parsed path parameters.
    #[must_use]
    pub fn params(&self) -> &Value {
        &self.input.params
    }

    /// Parsed cookies.
    #[must_use]
    pub fn cookies(&self) -> &Value {
        &self.input.cookies
    }

    /// Raw request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.input.headers
    }

    /// Request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.input.method
    }

    /// Request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.input.path
    }

    /// The validated input package.
    #[must_use]
    pub fn input(&self) -> &RequestInput {
        &self.input
    }

    /// First value of a header, if it is valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.input.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// A cookie value.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.input.cookies.get(name).and_then(Value::as_str)
    }

    /// A path parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.input.params.get(name).and_then(Value::as_str)
    }

    /// A query value.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.input.query.get(name).and_then(Value::as_str)
    }

    /// Deserializes the body into a typed model.
    ///
    /// # Errors
    ///
    /// Returns [`StepflowError::InvalidBody`] (400) when the body does not
    /// fit `T`.
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, StepflowError> {
        T::deserialize(&self.input.body).map_err(|err| StepflowError::InvalidBody(err.to_string()))
    }

    /// A metadata value written by an earlier step.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// A metadata value deserialized into `T`.
    #[must_use]
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.metadata.get(key).and_then(|v| T::deserialize(v).ok())
    }

    /// Directives accumulated so far.
    #[must_use]
    pub fn directives(&self) -> &[Directive] {
        self.metadata.directives()
    }

    /// Accumulated metadata.
    #[must_use]
    pub const fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// The run's request id.
    #[must_use]
    pub const fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Handle to the run's response channel.
    #[must_use]
    pub const fn response(&self) -> &ResponseChannel {
        &self.response
    }

    /// Merges a step's metadata. Keys naming a fixed facet are dropped and
    /// returned.
    pub(crate) fn absorb(&mut self, metadata: Metadata) -> Vec<String> {
        self.metadata.overlay(metadata, &FIXED_FIELDS)
    }
}

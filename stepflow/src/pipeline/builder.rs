//! Pipeline builder with validation.

use super::{Pipeline, PipelineInner};
use crate::config::{ExecutionMode, PipelineOptions};
use crate::context::RequestContext;
use crate::core::Outcome;
use crate::dispatch::{Dispatcher, TemplateRenderer};
use crate::errors::StepflowError;
use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
use crate::steps::{step_fn, Step};
use crate::validation::{Schema, ValidationSchemas};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Builder for [`Pipeline`]s.
///
/// # Examples
///
/// ```
/// use stepflow::prelude::*;
/// use serde_json::json;
///
/// let pipeline = Pipeline::builder("create-task")
///     .body_schema(ObjectSchema::new().field("title", FieldRule::string().min_len(1)))
///     .step_fn("create", |_data, ctx| async move {
///         Ok(Outcome::ok_with_status(ctx.body().clone(), 201))
///     })
///     .build()
///     .unwrap();
///
/// assert_eq!(pipeline.step_names(), vec!["create"]);
/// ```
#[must_use]
pub struct PipelineBuilder {
    name: String,
    steps: Vec<Arc<dyn Step>>,
    schemas: ValidationSchemas,
    options: PipelineOptions,
    sink: Option<Arc<dyn EventSink>>,
    renderer: Option<Arc<dyn TemplateRenderer>>,
}

impl PipelineBuilder {
    /// Creates a new pipeline builder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            schemas: ValidationSchemas::new(),
            options: PipelineOptions::new(),
            sink: None,
            renderer: None,
        }
    }

    /// Appends a step.
    pub fn step(self, step: impl Step + 'static) -> Self {
        self.step_arc(Arc::new(step))
    }

    /// Appends a shared step.
    pub fn step_arc(mut self, step: Arc<dyn Step>) -> Self {
        self.steps.push(step);
        self
    }

    /// Appends an async function as a step.
    pub fn step_fn<F, Fut>(self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Value, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Outcome>> + Send + 'static,
    {
        self.step(step_fn(name, func))
    }

    /// Replaces all validation schemas.
    pub fn schemas(mut self, schemas: ValidationSchemas) -> Self {
        self.schemas = schemas;
        self
    }

    /// Sets the body schema.
    pub fn body_schema(mut self, schema: impl Schema + 'static) -> Self {
        self.schemas = self.schemas.with_body(schema);
        self
    }

    /// Sets the query schema.
    pub fn query_schema(mut self, schema: impl Schema + 'static) -> Self {
        self.schemas = self.schemas.with_query(schema);
        self
    }

    /// Sets the path-parameter schema.
    pub fn params_schema(mut self, schema: impl Schema + 'static) -> Self {
        self.schemas = self.schemas.with_params(schema);
        self
    }

    /// Sets the cookie schema.
    pub fn cookies_schema(mut self, schema: impl Schema + 'static) -> Self {
        self.schemas = self.schemas.with_cookies(schema);
        self
    }

    /// Replaces all options.
    pub fn options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the run deadline.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options = self.options.with_timeout(timeout);
        self
    }

    /// Sets the status used for successes that never set one.
    pub fn success_status(mut self, status: u16) -> Self {
        self.options = self.options.with_success_status(status);
        self
    }

    /// Enables progress and response logging.
    pub fn enable_logging(mut self, enabled: bool) -> Self {
        self.options = self.options.with_logging(enabled);
        self
    }

    /// Sets the execution mode.
    pub fn mode(mut self, mode: ExecutionMode) -> Self {
        self.options = self.options.with_mode(mode);
        self
    }

    /// Sets the event sink.
    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Sets the renderer used for view responses at the HTTP edge.
    pub fn renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Builds the pipeline.
    ///
    /// Without an explicit event sink, events are logged when logging is
    /// enabled and discarded otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty name or invalid options.
    pub fn build(self) -> Result<Pipeline, StepflowError> {
        if self.name.trim().is_empty() {
            return Err(StepflowError::Config("pipeline name must not be empty".into()));
        }
        self.options.validate()?;

        let sink = self.sink.unwrap_or_else(|| {
            if self.options.enable_logging {
                Arc::new(LoggingEventSink::default())
            } else {
                Arc::new(NoOpEventSink)
            }
        });

        Ok(Pipeline {
            inner: Arc::new(PipelineInner {
                name: self.name,
                steps: self.steps,
                schemas: self.schemas,
                dispatcher: Dispatcher::new(self.options),
                sink,
                renderer: self.renderer,
            }),
        })
    }
}

impl fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("name", &self.name)
            .field("steps", &self.steps)
            .field("schemas", &self.schemas)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::NoOpStep;

    #[test]
    fn test_build_collects_steps_in_order() {
        let pipeline = PipelineBuilder::new("orders")
            .step(NoOpStep::new("first"))
            .step_arc(Arc::new(NoOpStep::new("second")))
            .step_fn("third", |data, _ctx| async move { Ok(Outcome::ok(data)) })
            .build()
            .unwrap();

        assert_eq!(pipeline.name(), "orders");
        assert_eq!(pipeline.step_names(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_build_rejects_empty_name() {
        let err = PipelineBuilder::new("  ").build().unwrap_err();
        assert!(matches!(err, StepflowError::Config(_)));
    }

    #[test]
    fn test_build_validates_options() {
        assert!(PipelineBuilder::new("p").success_status(1000).build().is_err());
        assert!(PipelineBuilder::new("p")
            .timeout(Duration::ZERO)
            .build()
            .is_err());
    }

    #[test]
    fn test_option_setters() {
        let pipeline = PipelineBuilder::new("p")
            .success_status(201)
            .enable_logging(true)
            .timeout(Duration::from_millis(50))
            .mode(ExecutionMode::Test)
            .build()
            .unwrap();

        let options = pipeline.options();
        assert_eq!(options.success_status, Some(201));
        assert!(options.enable_logging);
        assert_eq!(options.timeout(), Some(Duration::from_millis(50)));
        assert_eq!(options.mode, ExecutionMode::Test);
        assert!(pipeline.renderer().is_none());
    }
}

//! Adapter turning middleware-style functions into steps.

use super::Step;
use crate::context::RequestContext;
use crate::core::{Failure, Outcome};
use crate::dispatch::ResponseChannel;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

/// A step wrapping a middleware function.
///
/// The middleware sees the request context and the response channel. It
/// may write a response itself, in which case the run stops at the next
/// step boundary. Returning `Ok(())` passes the current data through.
pub struct MiddlewareStep<F>
where
    F: Fn(&RequestContext, &ResponseChannel) -> anyhow::Result<()> + Send + Sync,
{
    name: String,
    middleware: F,
}

impl<F> MiddlewareStep<F>
where
    F: Fn(&RequestContext, &ResponseChannel) -> anyhow::Result<()> + Send + Sync,
{
    /// Wraps `middleware` under `name`.
    pub fn new(name: impl Into<String>, middleware: F) -> Self {
        Self {
            name: name.into(),
            middleware,
        }
    }

    fn error_name(&self) -> String {
        format!("{} Middleware Error", self.name)
    }
}

impl<F> fmt::Debug for MiddlewareStep<F>
where
    F: Fn(&RequestContext, &ResponseChannel) -> anyhow::Result<()> + Send + Sync,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareStep")
            .field("name", &self.name)
            .finish()
    }
}

#[async_trait]
impl<F> Step for MiddlewareStep<F>
where
    F: Fn(&RequestContext, &ResponseChannel) -> anyhow::Result<()> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, data: Value, ctx: &RequestContext) -> anyhow::Result<Outcome> {
        match (self.middleware)(ctx, ctx.response()) {
            Ok(()) => Ok(Outcome::ok(data)),
            Err(err) => {
                let mut failure = Failure::from_error(&err, None);
                // Errors that carry no status of their own get the
                // middleware's name.
                if failure.name.as_deref() == Some("Error") {
                    failure.name = Some(self.error_name());
                }
                Ok(Outcome::Err(failure))
            }
        }
    }
}

/// Wraps a middleware function as a step.
pub fn wrap_middleware<F>(name: impl Into<String>, middleware: F) -> MiddlewareStep<F>
where
    F: Fn(&RequestContext, &ResponseChannel) -> anyhow::Result<()> + Send + Sync,
{
    MiddlewareStep::new(name, middleware)
}
